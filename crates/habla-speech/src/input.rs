//! Speech input slot.
//!
//! At most one capture listens process-wide. A capture is single-utterance:
//! it ends after one finalized result, a silence timeout, or an explicit stop.

use habla_core::types::{ControlId, TextField};

/// An active capture bound to a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub field: TextField,
    pub control: ControlId,
    /// Recognition language locked when the capture started.
    pub language: String,
    pub ticket: u64,
    /// The user asked for early termination; the engine has not ended yet.
    pub stop_requested: bool,
}

/// Single-slot arbiter for speech input.
#[derive(Debug)]
pub struct SpeechInputController {
    active: Option<Capture>,
    next_ticket: u64,
}

impl Default for SpeechInputController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechInputController {
    pub fn new() -> Self {
        Self {
            active: None,
            next_ticket: 1,
        }
    }

    pub fn active(&self) -> Option<&Capture> {
        self.active.as_ref()
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Begin capturing into `field`. Returns `None` if a capture is already active.
    pub fn start(&mut self, field: TextField, language: impl Into<String>) -> Option<&Capture> {
        if self.active.is_some() {
            tracing::debug!(field = ?field, "Capture already active, start ignored");
            return None;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let capture = Capture {
            field,
            control: field.mic_control(),
            language: language.into(),
            ticket,
            stop_requested: false,
        };
        tracing::debug!(field = ?field, language = %capture.language, "Capture started");
        self.active = Some(capture);
        self.active.as_ref()
    }

    /// Mark the active capture for early termination.
    ///
    /// Returns `false` when nothing is capturing.
    pub fn request_stop(&mut self) -> bool {
        match self.active.as_mut() {
            Some(capture) => {
                capture.stop_requested = true;
                true
            }
            None => false,
        }
    }

    /// The engine ended the capture tagged `ticket`.
    ///
    /// Returns the finished capture, or `None` for a stale ticket.
    pub fn finish(&mut self, ticket: u64) -> Option<Capture> {
        if !self.active.as_ref().is_some_and(|c| c.ticket == ticket) {
            return None;
        }
        let finished = self.active.take();
        if let Some(capture) = &finished {
            tracing::debug!(field = ?capture.field, "Capture ended");
        }
        finished
    }

    /// Drop the active capture without waiting for the engine.
    pub fn cancel(&mut self) -> Option<Capture> {
        let cancelled = self.active.take();
        if let Some(capture) = &cancelled {
            tracing::debug!(field = ?capture.field, "Capture cancelled");
        }
        cancelled
    }
}

/// Append a recognized transcript to a field's text, space-separated.
pub fn append_transcript(existing: &str, transcript: &str) -> String {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        transcript.to_string()
    } else {
        format!("{} {}", existing, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_from_idle() {
        let mut c = SpeechInputController::new();
        let capture = c.start(TextField::Composer, "es-ES").unwrap();
        assert_eq!(capture.field, TextField::Composer);
        assert_eq!(capture.control, ControlId::ComposerMic);
        assert_eq!(capture.language, "es-ES");
        assert!(c.is_capturing());
    }

    #[test]
    fn test_second_start_is_noop() {
        let mut c = SpeechInputController::new();
        c.start(TextField::TranslatorInput, "pt-BR");
        assert!(c.start(TextField::Composer, "es-ES").is_none());
        assert_eq!(c.active().unwrap().field, TextField::TranslatorInput);
    }

    #[test]
    fn test_finish_matching_ticket() {
        let mut c = SpeechInputController::new();
        let ticket = c.start(TextField::Composer, "es-ES").unwrap().ticket;
        let done = c.finish(ticket).unwrap();
        assert_eq!(done.field, TextField::Composer);
        assert!(!c.is_capturing());
    }

    #[test]
    fn test_finish_stale_ticket() {
        let mut c = SpeechInputController::new();
        let first = c.start(TextField::Composer, "es-ES").unwrap().ticket;
        c.cancel();
        c.start(TextField::Composer, "es-ES");
        assert!(c.finish(first).is_none());
        assert!(c.is_capturing());
    }

    #[test]
    fn test_request_stop() {
        let mut c = SpeechInputController::new();
        assert!(!c.request_stop());
        c.start(TextField::Composer, "es-ES");
        assert!(c.request_stop());
        assert!(c.active().unwrap().stop_requested);
        // Still capturing until the engine reports the end.
        assert!(c.is_capturing());
    }

    #[test]
    fn test_cancel() {
        let mut c = SpeechInputController::new();
        assert!(c.cancel().is_none());
        c.start(TextField::TranslatorInput, "es-ES");
        let cancelled = c.cancel().unwrap();
        assert_eq!(cancelled.control, ControlId::TranslatorMic);
        assert!(!c.is_capturing());
    }

    #[test]
    fn test_append_transcript_to_empty() {
        assert_eq!(append_transcript("", "hola"), "hola");
    }

    #[test]
    fn test_append_transcript_space_separated() {
        assert_eq!(append_transcript("Buenos", "días"), "Buenos días");
    }

    #[test]
    fn test_append_blank_transcript_keeps_text() {
        assert_eq!(append_transcript("texto", "   "), "texto");
    }
}
