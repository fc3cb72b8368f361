//! Terminal rendering of orchestrator events.
//!
//! The view re-reads message and translator state from the orchestrator when
//! an event arrives; events only say what changed. Replies are echoed as
//! their raw text grows, so the terminal shows a stream live.

use std::collections::HashMap;
use std::io::{self, Write};

use habla_chat::{
    assistant_name, citation_block, MarkupRenderer, ModeOrchestrator, TerminalRenderer,
};
use habla_core::events::UiEvent;
use habla_core::types::{
    ControlVisual, Message, MessageId, MessageStatus, Mode, Role, TextField, ViewRegion,
};

const LANDING: &str = "\
Habla · Aprende español con inteligencia artificial

  /corrector   Corrector de textos
  /grammar     Gramática
  /culture     Modismos y cultura
  /travel      Guía de viajes
  /translator  Traductor Español / Portugués
  /contact     Contacto

Escribe /help para ver todos los comandos.";

const CONTACT: &str = "\
Contacto

Habla es un proyecto para practicar español con tutores de IA.
Comentarios y sugerencias son bienvenidos.
Escribe /home para volver al inicio.";

/// Writes transcript entries, translator output and status lines.
pub struct TerminalView<W: Write> {
    out: W,
    renderer: TerminalRenderer,
    needs_prompt: bool,
    /// Bytes of `raw_text` already echoed, per reply still streaming.
    streamed: HashMap<MessageId, usize>,
    mid_line: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            renderer: TerminalRenderer::new(color),
            needs_prompt: true,
            streamed: HashMap::new(),
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a status line.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.break_stream_line()?;
        writeln!(self.out, "{}", text)?;
        self.needs_prompt = true;
        Ok(())
    }

    /// Show the prompt again even though nothing was printed.
    pub fn request_prompt(&mut self) {
        self.needs_prompt = true;
    }

    /// Print the input prompt if anything was written since the last one.
    /// Held back while a reply is streaming.
    pub fn prompt(&mut self, orchestrator: &ModeOrchestrator, continuing: bool) -> io::Result<()> {
        if !self.needs_prompt || orchestrator.is_streaming() {
            return Ok(());
        }
        let label = if continuing {
            "…".to_string()
        } else {
            match orchestrator.mode() {
                Mode::Translator => {
                    let t = orchestrator.translation();
                    format!("{} → {}", t.source().label, t.target().label)
                }
                Mode::Idle => "habla".to_string(),
                mode => mode.as_str().to_string(),
            }
        };
        write!(self.out, "{}> ", label)?;
        self.out.flush()?;
        self.needs_prompt = false;
        Ok(())
    }

    /// Render one event.
    pub fn handle(&mut self, event: &UiEvent, orchestrator: &ModeOrchestrator) -> io::Result<()> {
        if !matches!(
            event,
            UiEvent::MessageUpdated { .. }
                | UiEvent::MessageCompleted { .. }
                | UiEvent::MessageFailed { .. }
        ) {
            self.break_stream_line()?;
        }
        match event {
            UiEvent::ModeChanged { to, region, .. } => {
                // A reply cut off by the switch never completes.
                self.streamed.clear();
                writeln!(self.out)?;
                match region {
                    ViewRegion::Landing => writeln!(self.out, "{}", LANDING)?,
                    ViewRegion::Chat => writeln!(self.out, "── {} ──", assistant_name(*to))?,
                    ViewRegion::Translator => {
                        let t = orchestrator.translation();
                        writeln!(
                            self.out,
                            "── Traductor: {} → {} ──",
                            t.source().label,
                            t.target().label
                        )?;
                        writeln!(self.out, "{}", t.placeholder())?;
                    }
                    ViewRegion::Contact => writeln!(self.out, "{}", CONTACT)?,
                }
            }
            UiEvent::SessionUnavailable { reason, .. } => {
                writeln!(self.out, "⚠ No se pudo iniciar la sesión: {}", reason)?;
            }
            UiEvent::WelcomeShown { mode, text } => {
                writeln!(
                    self.out,
                    "{}: {}\n",
                    assistant_name(*mode),
                    self.renderer.render(text)
                )?;
            }
            UiEvent::MessageAppended { id } => {
                let pending = orchestrator
                    .transcript()
                    .get(*id)
                    .is_some_and(|m| m.role == Role::Assistant && m.status == MessageStatus::Pending);
                if pending {
                    writeln!(self.out, "  ✎ escribiendo...")?;
                }
            }
            UiEvent::MessageUpdated { id } => {
                if let Some(message) = orchestrator.transcript().get(*id) {
                    self.echo_stream(message, orchestrator.mode())?;
                }
                return Ok(());
            }
            UiEvent::MessageCompleted { id, .. } | UiEvent::MessageFailed { id } => {
                if let Some(message) = orchestrator.transcript().get(*id) {
                    self.finish_reply(message, orchestrator.mode())?;
                }
            }
            UiEvent::ControlChanged { visual, .. } => match visual {
                ControlVisual::Recording => writeln!(self.out, "🎤 Escuchando... (/mic para terminar)")?,
                ControlVisual::Playing => writeln!(self.out, "🔊 Reproduciendo... (/stop para detener)")?,
                _ => return Ok(()),
            },
            UiEvent::FieldTextChanged { field, text } if !text.is_empty() => {
                let hint = match field {
                    TextField::Composer => "/send para enviar",
                    TextField::TranslatorInput => "/translate para traducir",
                };
                writeln!(self.out, "📝 {}  ({})", text, hint)?;
            }
            UiEvent::TranslationPending => writeln!(self.out, "...")?,
            UiEvent::TranslationCompleted { .. } | UiEvent::TranslationFailed => {
                let t = orchestrator.translation();
                writeln!(self.out, "{}: {}\n", t.target().label, t.output())?;
            }
            UiEvent::DirectionSwapped {
                source_label,
                target_label,
                ..
            } => {
                writeln!(self.out, "⇄ {} → {}", source_label, target_label)?;
            }
            UiEvent::Copied { chars } => {
                writeln!(self.out, "📋 Copiado ({} caracteres)", chars)?;
            }
            _ => return Ok(()),
        }
        self.needs_prompt = true;
        Ok(())
    }

    /// Print the part of a streaming reply not shown yet.
    fn echo_stream(&mut self, message: &Message, mode: Mode) -> io::Result<()> {
        if message.status != MessageStatus::Streaming {
            return Ok(());
        }
        let shown = match self.streamed.get(&message.id) {
            Some(shown) => *shown,
            None => {
                writeln!(self.out, "{}:", assistant_name(mode))?;
                0
            }
        };
        if let Some(delta) = message.raw_text.get(shown..).filter(|d| !d.is_empty()) {
            write!(self.out, "{}", delta)?;
            self.mid_line = true;
        }
        self.out.flush()?;
        self.streamed.insert(message.id, message.raw_text.len());
        Ok(())
    }

    /// Close a reply: the sources block after a live stream, the whole
    /// markup otherwise, or the notice on failure.
    fn finish_reply(&mut self, message: &Message, mode: Mode) -> io::Result<()> {
        let Some(shown) = self.streamed.remove(&message.id) else {
            return writeln!(self.out, "{}:\n{}\n", assistant_name(mode), message.markup);
        };
        if message.status == MessageStatus::Failed {
            self.break_stream_line()?;
            return writeln!(self.out, "{}\n", message.markup);
        }
        if let Some(rest) = message.raw_text.get(shown..) {
            write!(self.out, "{}", rest)?;
        }
        writeln!(self.out)?;
        self.mid_line = false;
        if !message.citations.is_empty() {
            let sources = self.renderer.render(&citation_block(&message.citations));
            writeln!(self.out, "\n{}", sources)?;
        }
        writeln!(self.out)
    }

    /// End a partially echoed line before printing something else.
    fn break_stream_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }
}
