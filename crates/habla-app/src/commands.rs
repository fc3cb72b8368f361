//! Terminal input: slash commands and multi-line continuation.

use habla_core::types::Mode;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch modes. `/home` maps to [`Mode::Idle`].
    Mode(Mode),
    /// Speak the n-th assistant reply (1-based), or the latest one.
    Speak(Option<usize>),
    Welcome,
    Mic,
    Stop,
    Send,
    Swap,
    Translate,
    Copy,
    Voices,
    Help,
    Quit,
    /// Plain text: a chat message or translator input.
    Text(String),
    Unknown(String),
}

/// Parse one complete input entry.
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Text(input.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let argument = parts.next();

    match name.as_str() {
        "home" | "inicio" => Command::Mode(Mode::Idle),
        "speak" | "escuchar" => Command::Speak(argument.and_then(|a| a.parse().ok())),
        "welcome" => Command::Welcome,
        "mic" => Command::Mic,
        "stop" => Command::Stop,
        "send" => Command::Send,
        "swap" => Command::Swap,
        "translate" => Command::Translate,
        "copy" => Command::Copy,
        "voices" => Command::Voices,
        "help" | "ayuda" | "?" => Command::Help,
        "quit" | "exit" | "salir" => Command::Quit,
        other => match other.parse::<Mode>() {
            Ok(mode) => Command::Mode(mode),
            Err(_) => Command::Unknown(trimmed.to_string()),
        },
    }
}

/// Joins lines ending in `\` into one entry.
#[derive(Debug, Default)]
pub struct LineJoiner {
    pending: String,
}

impl LineJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line. Returns the completed entry, if any.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(head) = line.strip_suffix('\\') {
            self.pending.push_str(head);
            self.pending.push('\n');
            return None;
        }
        self.pending.push_str(line);
        Some(std::mem::take(&mut self.pending))
    }

    pub fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }
}

pub const HELP: &str = "\
Modos:
  /corrector   Corrector de textos
  /grammar     Preguntas de gramática
  /culture     Modismos y cultura
  /travel      Guía de viajes
  /translator  Traductor Español / Portugués
  /contact     Contacto
  /home        Volver al inicio

Acciones:
  texto        Enviar mensaje (o traducir en el traductor)
  texto \\      Continuar en la línea siguiente
  /send        Enviar lo dictado en el campo de texto
  /mic         Dictar (otra vez para detener)
  /speak [n]   Escuchar la respuesta n (o la última)
  /welcome     Escuchar la presentación
  /stop        Detener audio
  /translate   Traducir de nuevo
  /swap        Invertir idiomas
  /copy        Copiar la traducción
  /voices      Recargar voces
  /help        Esta ayuda
  /quit        Salir";
