//! Speech engines backed by external commands.
//!
//! The synthesizer writes the utterance to the command's stdin; the
//! recognizer reads one transcript from the command's stdout. `{lang}` and
//! `{voice}` placeholders in the argument templates are substituted per call.

use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use crate::engine::{SpeechRecognizer, SpeechSynthesizer, Utterance};
use crate::error::SpeechError;
use crate::voice::Voice;

/// Text-to-speech through a command such as `espeak-ng -v {lang}`.
pub struct CommandSynthesizer {
    command: Vec<String>,
    voices_command: Vec<String>,
    cancelled: Notify,
}

impl CommandSynthesizer {
    /// Fails when `command` is empty.
    pub fn new(command: Vec<String>, voices_command: Vec<String>) -> Result<Self, SpeechError> {
        if command.is_empty() {
            return Err(SpeechError::Unavailable(
                "no synthesizer command configured".to_string(),
            ));
        }
        Ok(Self {
            command,
            voices_command,
            cancelled: Notify::new(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        if self.voices_command.is_empty() {
            return Ok(Vec::new());
        }
        let output = build_command(&self.voices_command, &[])?
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "voices command exited with {}",
                output.status
            )));
        }
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.name.as_str())
            .unwrap_or(utterance.language.as_str());
        let cancelled = armed(&self.cancelled);
        let mut child = build_command(
            &self.command,
            &[("{lang}", utterance.language.as_str()), ("{voice}", voice)],
        )?
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(utterance.text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancelled => None,
        };

        match outcome {
            Some(status) => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SpeechError::Engine(format!(
                        "synthesizer exited with {}",
                        status
                    )))
                }
            }
            None => {
                let _ = child.kill().await;
                Err(SpeechError::Cancelled)
            }
        }
    }

    fn cancel(&self) {
        self.cancelled.notify_waiters();
    }
}

/// Speech-to-text through a command that prints one transcript and exits.
pub struct CommandRecognizer {
    command: Vec<String>,
    stopped: Notify,
}

impl CommandRecognizer {
    /// Fails when `command` is empty.
    pub fn new(command: Vec<String>) -> Result<Self, SpeechError> {
        if command.is_empty() {
            return Err(SpeechError::Unavailable(
                "no recognizer command configured".to_string(),
            ));
        }
        Ok(Self {
            command,
            stopped: Notify::new(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&self, language: &str) -> Result<Option<String>, SpeechError> {
        let stopped = armed(&self.stopped);
        let mut child = build_command(&self.command, &[("{lang}", language)])?
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpeechError::Engine("recognizer stdout unavailable".to_string()))?;

        let outcome = tokio::select! {
            read = async {
                let mut buf = String::new();
                stdout.read_to_string(&mut buf).await.map(|_| buf)
            } => Some(read),
            _ = stopped => None,
        };

        match outcome {
            Some(read) => {
                let transcript = read?;
                let status = child.wait().await?;
                if !status.success() {
                    return Err(SpeechError::Engine(format!(
                        "recognizer exited with {}",
                        status
                    )));
                }
                let transcript = transcript.trim();
                Ok((!transcript.is_empty()).then(|| transcript.to_string()))
            }
            None => {
                tracing::debug!("Recognizer stopped before producing a result");
                let _ = child.kill().await;
                Ok(None)
            }
        }
    }

    fn stop(&self) {
        self.stopped.notify_waiters();
    }
}

/// Register for the next notification now, so a stop issued while the child
/// is starting is not lost.
fn armed(notify: &Notify) -> Pin<Box<Notified<'_>>> {
    let mut notified = Box::pin(notify.notified());
    notified.as_mut().enable();
    notified
}

fn build_command(template: &[String], substitutions: &[(&str, &str)]) -> Result<Command, SpeechError> {
    let (program, args) = template
        .split_first()
        .ok_or_else(|| SpeechError::Unavailable("empty command".to_string()))?;
    let mut cmd = Command::new(substitute(program, substitutions));
    for arg in args {
        cmd.arg(substitute(arg, substitutions));
    }
    cmd.kill_on_drop(true);
    Ok(cmd)
}

fn substitute(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |acc, (key, value)| acc.replace(key, value))
}

/// Parse `name<TAB>lang` lines; lines without a tab are skipped.
fn parse_voice_list(text: &str) -> Vec<Voice> {
    text.lines()
        .filter_map(|line| {
            let (name, lang) = line.split_once('\t')?;
            let (name, lang) = (name.trim(), lang.trim());
            (!name.is_empty() && !lang.is_empty()).then(|| Voice::new(name, lang))
        })
        .collect()
}
