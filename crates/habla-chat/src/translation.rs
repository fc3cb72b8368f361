//! Two-pane translator state.

use habla_core::config::{LanguageConfig, TranslationConfig};
use habla_core::types::Direction;

use crate::error::ChatError;

/// Output text after a failed exchange.
pub const TRANSLATION_ERROR: &str = "Error al traducir. Inténtalo de nuevo.";
/// Output text while an exchange is in flight.
pub const PENDING_OUTPUT: &str = "...";

/// Direction, buffers, and the in-flight exchange of the translator.
#[derive(Debug)]
pub struct TranslationController {
    languages: TranslationConfig,
    direction: Direction,
    input: String,
    output: String,
    pending: Option<u64>,
    next_ticket: u64,
}

impl TranslationController {
    pub fn new(languages: TranslationConfig) -> Self {
        Self {
            languages,
            direction: Direction::Forward,
            input: String::new(),
            output: String::new(),
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn source(&self) -> &LanguageConfig {
        match self.direction {
            Direction::Forward => &self.languages.source,
            Direction::Reverse => &self.languages.target,
        }
    }

    pub fn target(&self) -> &LanguageConfig {
        match self.direction {
            Direction::Forward => &self.languages.target,
            Direction::Reverse => &self.languages.source,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.source().placeholder
    }

    /// Dictation language: the current source language.
    pub fn recognition_language(&self) -> &str {
        &self.source().tag
    }

    /// Playback language: the current target language.
    pub fn speech_language(&self) -> &str {
        &self.target().tag
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.pending.is_none()
    }

    /// Output ready to copy or speak.
    pub fn finished_output(&self) -> Option<&str> {
        if self.is_pending() || self.output.trim().is_empty() {
            None
        } else {
            Some(&self.output)
        }
    }

    /// Flip the direction. Both buffers are left as they are.
    pub fn swap(&mut self) -> Direction {
        self.direction = self.direction.swapped();
        tracing::debug!(
            direction = %self.direction,
            source = %self.source().tag,
            target = %self.target().tag,
            "Translation direction swapped"
        );
        self.direction
    }

    /// Instruction sent for `text` in the current direction.
    pub fn prompt(&self, text: &str) -> String {
        format!(
            "Traduce el siguiente texto del {} al {}: \"{}\"",
            self.source().label,
            self.target().prompt_name,
            text
        )
    }

    /// Start an exchange for the current input.
    ///
    /// Returns the ticket and prompt, or `None` when the input is blank or an
    /// exchange is already pending.
    pub fn begin(&mut self) -> Option<(u64, String)> {
        if self.pending.is_some() {
            tracing::debug!("Translation already pending");
            return None;
        }
        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let prompt = self.prompt(text);
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(ticket);
        self.output = PENDING_OUTPUT.to_string();
        Some((ticket, prompt))
    }

    /// Settle the exchange identified by `ticket`.
    ///
    /// Returns `None` for a stale ticket, otherwise whether it succeeded.
    pub fn complete(&mut self, ticket: u64, result: Result<String, ChatError>) -> Option<bool> {
        if self.pending != Some(ticket) {
            return None;
        }
        self.pending = None;
        match result {
            Ok(text) => {
                self.output = text.trim().to_string();
                Some(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Translation failed");
                self.output = TRANSLATION_ERROR.to_string();
                Some(false)
            }
        }
    }

    /// Abandon the pending exchange. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        if self.output == PENDING_OUTPUT {
            self.output.clear();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> TranslationController {
        TranslationController::new(TranslationConfig::default())
    }

    #[test]
    fn test_initial_direction_and_labels() {
        let t = controller();
        assert_eq!(t.direction(), Direction::Forward);
        assert_eq!(t.source().label, "Español");
        assert_eq!(t.target().label, "Portugués");
        assert_eq!(t.placeholder(), "Escribe en español...");
        assert_eq!(t.recognition_language(), "es-ES");
        assert_eq!(t.speech_language(), "pt-BR");
    }

    #[test]
    fn test_swap_updates_everything_but_buffers() {
        let mut t = controller();
        t.set_input("Bom dia");
        assert_eq!(t.swap(), Direction::Reverse);
        assert_eq!(t.source().label, "Portugués");
        assert_eq!(t.target().label, "Español");
        assert_eq!(t.placeholder(), "Escreva em português...");
        assert_eq!(t.recognition_language(), "pt-BR");
        assert_eq!(t.speech_language(), "es-ES");
        assert_eq!(t.input(), "Bom dia");
    }

    #[test]
    fn test_swap_twice_is_identity() {
        let mut t = controller();
        t.swap();
        t.swap();
        assert_eq!(t.direction(), Direction::Forward);
        assert_eq!(t.source().tag, "es-ES");
    }

    #[test]
    fn test_prompt_both_directions() {
        let mut t = controller();
        assert_eq!(
            t.prompt("Hola"),
            "Traduce el siguiente texto del Español al Portugués (Brasil): \"Hola\""
        );
        t.swap();
        assert_eq!(
            t.prompt("Olá"),
            "Traduce el siguiente texto del Portugués al Español: \"Olá\""
        );
    }

    #[test]
    fn test_begin_requires_text() {
        let mut t = controller();
        assert!(t.begin().is_none());
        t.set_input("   ");
        assert!(t.begin().is_none());
        assert!(t.trigger_enabled());
    }

    #[test]
    fn test_begin_marks_pending() {
        let mut t = controller();
        t.set_input("  Hola ");
        let (_, prompt) = t.begin().unwrap();
        assert!(prompt.ends_with(": \"Hola\""));
        assert!(t.is_pending());
        assert!(!t.trigger_enabled());
        assert_eq!(t.output(), PENDING_OUTPUT);
        assert!(t.finished_output().is_none());
        assert!(t.begin().is_none());
    }

    #[test]
    fn test_complete_trims_result() {
        let mut t = controller();
        t.set_input("Hola");
        let (ticket, _) = t.begin().unwrap();
        assert_eq!(t.complete(ticket, Ok("  Olá \n".into())), Some(true));
        assert_eq!(t.output(), "Olá");
        assert!(t.trigger_enabled());
        assert_eq!(t.finished_output(), Some("Olá"));
    }

    #[test]
    fn test_complete_failure_shows_notice() {
        let mut t = controller();
        t.set_input("Hola");
        let (ticket, _) = t.begin().unwrap();
        let result = t.complete(ticket, Err(ChatError::Stream("reset".into())));
        assert_eq!(result, Some(false));
        assert_eq!(t.output(), TRANSLATION_ERROR);
        assert!(t.trigger_enabled());
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut t = controller();
        t.set_input("Hola");
        let (ticket, _) = t.begin().unwrap();
        assert!(t.cancel());
        assert_eq!(t.output(), "");
        assert_eq!(t.complete(ticket, Ok("Olá".into())), None);
        assert_eq!(t.output(), "");
    }

    #[test]
    fn test_cancel_without_pending() {
        let mut t = controller();
        assert!(!t.cancel());
    }
}
