//! Habla application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install the tracing subscriber (stderr)
//! 3. Build the Gemini backend and optional speech engines
//! 4. Run the terminal loop: stdin lines and orchestrator completions

mod cli;
mod clipboard;
mod commands;
mod view;

use std::io::{IsTerminal, Stdout, Write};
use std::sync::Arc;

use clap::Parser;
use habla_chat::{GeminiBackend, GeminiConfig, ModeOrchestrator, TerminalRenderer};
use habla_core::config::HablaConfig;
use habla_core::error::HablaError;
use habla_core::events::UiEvent;
use habla_core::types::{Mode, TextField};
use habla_speech::{CommandRecognizer, CommandSynthesizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::CliArgs;
use crate::clipboard::SystemClipboard;
use crate::commands::{Command, LineJoiner, HELP};
use crate::view::TerminalView;

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Attach the command-backed speech engines that are configured.
fn with_speech_engines(mut orchestrator: ModeOrchestrator, config: &HablaConfig) -> ModeOrchestrator {
    let speech = &config.speech;
    if speech.synthesizer_command.is_empty() {
        tracing::info!("Speech output disabled (no synthesizer_command)");
    } else {
        match CommandSynthesizer::new(
            speech.synthesizer_command.clone(),
            speech.voices_command.clone(),
        ) {
            Ok(synthesizer) => orchestrator = orchestrator.with_synthesizer(Arc::new(synthesizer)),
            Err(e) => tracing::warn!(error = %e, "Speech output unavailable"),
        }
    }
    if speech.recognizer_command.is_empty() {
        tracing::info!("Speech input disabled (no recognizer_command)");
    } else {
        match CommandRecognizer::new(speech.recognizer_command.clone()) {
            Ok(recognizer) => orchestrator = orchestrator.with_recognizer(Arc::new(recognizer)),
            Err(e) => tracing::warn!(error = %e, "Speech input unavailable"),
        }
    }
    orchestrator
}

#[tokio::main]
async fn main() -> Result<(), HablaError> {
    let args = CliArgs::parse();

    // Config (logged once tracing is up).
    let config_file = args.resolve_config_path();
    let loaded = HablaConfig::load(&config_file);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!("Starting Habla v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) if config_file.exists() => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid configuration, using defaults")
        }
        Err(_) => tracing::info!(path = %config_file.display(), "No configuration file, using defaults"),
    }

    if let Some(model) = &args.model {
        config.backend.model = model.clone();
    }
    let initial_mode = args.resolve_mode(config.general.initial_mode);

    // Backend.
    let backend = GeminiBackend::new(GeminiConfig::from_backend_config(&config.backend)?)?;
    tracing::info!(model = %config.backend.model, "Gemini backend ready");

    // Orchestrator.
    let color = std::io::stdout().is_terminal();
    let (orchestrator, events) = ModeOrchestrator::new(
        &config,
        Arc::new(backend),
        Box::new(TerminalRenderer::new(color)),
    );
    let mut orchestrator =
        with_speech_engines(orchestrator.with_clipboard(Box::new(SystemClipboard)), &config);
    orchestrator.refresh_voices();

    run(orchestrator, events, initial_mode, color).await
}

async fn run(
    mut orchestrator: ModeOrchestrator,
    mut events: UnboundedReceiver<UiEvent>,
    initial_mode: Mode,
    color: bool,
) -> Result<(), HablaError> {
    let mut view = TerminalView::new(std::io::stdout(), color);
    orchestrator.select_mode(initial_mode);
    render_events(&mut view, &mut events, &orchestrator)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut joiner = LineJoiner::new();
    view.prompt(&orchestrator, false)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("stdin closed; shutting down");
                    break;
                };
                match joiner.push(&line) {
                    Some(entry) => {
                        if !dispatch(&mut orchestrator, &mut view, commands::parse(&entry))? {
                            break;
                        }
                    }
                    None => view.request_prompt(),
                }
            }
            Some(completion) = orchestrator.next_completion() => {
                orchestrator.apply(completion);
            }
        }
        render_events(&mut view, &mut events, &orchestrator)?;
        view.prompt(&orchestrator, joiner.is_continuing())?;
    }

    orchestrator.stop_speech();
    orchestrator.stop_capture();
    Ok(())
}

fn render_events(
    view: &mut TerminalView<Stdout>,
    events: &mut UnboundedReceiver<UiEvent>,
    orchestrator: &ModeOrchestrator,
) -> Result<(), HablaError> {
    while let Ok(event) = events.try_recv() {
        view.handle(&event, orchestrator)?;
    }
    Ok(())
}

/// Execute one command. Returns `false` to quit.
fn dispatch<W: Write>(
    orchestrator: &mut ModeOrchestrator,
    view: &mut TerminalView<W>,
    command: Command,
) -> Result<bool, HablaError> {
    let translator = orchestrator.mode() == Mode::Translator;
    match command {
        Command::Quit => return Ok(false),
        Command::Help => view.notice(HELP)?,
        Command::Mode(mode) => orchestrator.select_mode(mode),
        Command::Text(text) => {
            let mode = orchestrator.mode();
            if translator {
                if orchestrator.translation().is_pending() {
                    view.notice("Espera a que termine la traducción.")?;
                } else {
                    orchestrator.set_translation_input(text);
                    orchestrator.translate();
                }
            } else if mode.is_chat() {
                if orchestrator.submit(&text).is_none() && orchestrator.is_streaming() {
                    view.notice("Espera a que termine la respuesta.")?;
                }
            } else if !text.trim().is_empty() {
                view.notice("Elige un modo primero. Escribe /help para ver los comandos.")?;
            }
        }
        Command::Send => {
            if translator {
                orchestrator.translate();
            } else {
                orchestrator.submit_composer();
            }
        }
        Command::Mic => {
            let field = if translator {
                TextField::TranslatorInput
            } else {
                TextField::Composer
            };
            orchestrator.toggle_capture(field);
        }
        Command::Stop => {
            orchestrator.stop_speech();
            orchestrator.stop_capture();
        }
        Command::Speak(index) => {
            if translator {
                orchestrator.speak_translation();
            } else {
                let transcript = orchestrator.transcript();
                let id = match index {
                    Some(n) => n
                        .checked_sub(1)
                        .and_then(|i| transcript.assistant_messages().nth(i)),
                    None => transcript.assistant_messages().last(),
                }
                .map(|m| m.id);
                match id {
                    Some(id) => orchestrator.speak_message(id),
                    None => view.notice("No hay respuestas para escuchar.")?,
                }
            }
        }
        Command::Welcome => orchestrator.speak_welcome(),
        Command::Swap => {
            if translator {
                orchestrator.swap_direction();
            } else {
                view.notice("/swap solo funciona en el traductor.")?;
            }
        }
        Command::Translate => {
            orchestrator.translate();
        }
        Command::Copy => match orchestrator.copy_translation() {
            Ok(true) => {}
            Ok(false) => view.notice("No hay traducción para copiar.")?,
            Err(e) => {
                tracing::warn!(error = %e, "Copy failed");
                view.notice("No se pudo copiar al portapapeles.")?;
            }
        },
        Command::Voices => orchestrator.refresh_voices(),
        Command::Unknown(input) => {
            view.notice(&format!("Comando desconocido: {}. Escribe /help.", input))?
        }
    }
    view.request_prompt();
    Ok(true)
}
