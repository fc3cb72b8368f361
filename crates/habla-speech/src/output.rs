//! Speech output slot.
//!
//! At most one utterance plays process-wide. Transitions:
//! - Idle -> Speaking(control) on a request from any control
//! - Speaking(a) -> Speaking(b) on a request from another control (preempt)
//! - Speaking(a) -> Idle on a second request from `a` (toggle off)
//! - Speaking(a) -> Idle on completion, engine error, or explicit stop

use std::fmt;

use habla_core::types::ControlId;

use crate::engine::Utterance;
use crate::sanitize::clean_for_speech;
use crate::voice::VoiceCatalog;

/// State of the speech output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Idle,
    Speaking { control: ControlId, ticket: u64 },
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputState::Idle => write!(f, "Idle"),
            OutputState::Speaking { control, .. } => write!(f, "Speaking({})", control),
        }
    }
}

/// What the caller must do after a speak request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakDecision {
    /// The control was already speaking: stop playback and restore it.
    Stop { control: ControlId },
    /// Start playback tagged with `ticket`; restore `preempted` first if set.
    Start {
        ticket: u64,
        preempted: Option<ControlId>,
    },
}

/// Single-slot arbiter for speech output.
#[derive(Debug)]
pub struct SpeechOutputController {
    state: OutputState,
    next_ticket: u64,
}

impl Default for SpeechOutputController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechOutputController {
    pub fn new() -> Self {
        Self {
            state: OutputState::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    /// Control currently speaking, if any.
    pub fn active_control(&self) -> Option<ControlId> {
        match self.state {
            OutputState::Idle => None,
            OutputState::Speaking { control, .. } => Some(control),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.state != OutputState::Idle
    }

    /// Handle a playback request from `control`.
    pub fn request(&mut self, control: ControlId) -> SpeakDecision {
        let previous = self.state;
        match previous {
            OutputState::Speaking { control: active, .. } if active == control => {
                self.state = OutputState::Idle;
                tracing::debug!("Speech output: {} -> {}", previous, self.state);
                SpeakDecision::Stop { control }
            }
            _ => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                self.state = OutputState::Speaking { control, ticket };
                tracing::debug!("Speech output: {} -> {}", previous, self.state);
                SpeakDecision::Start {
                    ticket,
                    preempted: match previous {
                        OutputState::Speaking { control, .. } => Some(control),
                        OutputState::Idle => None,
                    },
                }
            }
        }
    }

    /// Force the slot idle. Returns the control that was speaking.
    pub fn stop(&mut self) -> Option<ControlId> {
        let active = self.active_control();
        if active.is_some() {
            tracing::debug!("Speech output: {} -> Idle (stopped)", self.state);
        }
        self.state = OutputState::Idle;
        active
    }

    /// Playback tagged `ticket` ended (normally or with an error).
    ///
    /// Returns the control to restore, or `None` if the ticket is stale
    /// because the slot was already stopped or preempted.
    pub fn finish(&mut self, ticket: u64) -> Option<ControlId> {
        match self.state {
            OutputState::Speaking {
                control,
                ticket: active,
            } if active == ticket => {
                self.state = OutputState::Idle;
                tracing::debug!(control = %control, "Speech output finished");
                Some(control)
            }
            _ => None,
        }
    }
}

/// Build the utterance for `text`: cleanup plus voice selection.
pub fn prepare_utterance(text: &str, language: &str, catalog: &VoiceCatalog) -> Utterance {
    Utterance {
        text: clean_for_speech(text),
        language: language.to_string(),
        voice: catalog.select(language).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::Voice;
    use habla_core::types::MessageId;

    #[test]
    fn test_initial_state_idle() {
        let c = SpeechOutputController::new();
        assert_eq!(c.state(), OutputState::Idle);
        assert!(!c.is_speaking());
        assert!(c.active_control().is_none());
    }

    #[test]
    fn test_request_from_idle_starts() {
        let mut c = SpeechOutputController::new();
        let decision = c.request(ControlId::WelcomePlayback);
        assert!(matches!(
            decision,
            SpeakDecision::Start {
                preempted: None,
                ..
            }
        ));
        assert_eq!(c.active_control(), Some(ControlId::WelcomePlayback));
    }

    #[test]
    fn test_same_control_twice_toggles_off() {
        let mut c = SpeechOutputController::new();
        let first = c.request(ControlId::TranslationPlayback);
        assert!(matches!(first, SpeakDecision::Start { .. }));
        let second = c.request(ControlId::TranslationPlayback);
        assert_eq!(
            second,
            SpeakDecision::Stop {
                control: ControlId::TranslationPlayback
            }
        );
        assert_eq!(c.state(), OutputState::Idle);
    }

    #[test]
    fn test_other_control_preempts() {
        let mut c = SpeechOutputController::new();
        let a = ControlId::MessagePlayback(MessageId::new());
        let b = ControlId::WelcomePlayback;
        c.request(a);
        let decision = c.request(b);
        match decision {
            SpeakDecision::Start { preempted, .. } => assert_eq!(preempted, Some(a)),
            other => panic!("expected Start, got {:?}", other),
        }
        assert_eq!(c.active_control(), Some(b));
    }

    #[test]
    fn test_tickets_increase() {
        let mut c = SpeechOutputController::new();
        let t1 = match c.request(ControlId::WelcomePlayback) {
            SpeakDecision::Start { ticket, .. } => ticket,
            _ => unreachable!(),
        };
        let t2 = match c.request(ControlId::TranslationPlayback) {
            SpeakDecision::Start { ticket, .. } => ticket,
            _ => unreachable!(),
        };
        assert!(t2 > t1);
    }

    #[test]
    fn test_finish_current_ticket_restores_control() {
        let mut c = SpeechOutputController::new();
        let ticket = match c.request(ControlId::WelcomePlayback) {
            SpeakDecision::Start { ticket, .. } => ticket,
            _ => unreachable!(),
        };
        assert_eq!(c.finish(ticket), Some(ControlId::WelcomePlayback));
        assert!(!c.is_speaking());
    }

    #[test]
    fn test_finish_stale_ticket_ignored() {
        let mut c = SpeechOutputController::new();
        let old = match c.request(ControlId::WelcomePlayback) {
            SpeakDecision::Start { ticket, .. } => ticket,
            _ => unreachable!(),
        };
        c.request(ControlId::TranslationPlayback);
        assert_eq!(c.finish(old), None);
        assert_eq!(c.active_control(), Some(ControlId::TranslationPlayback));
    }

    #[test]
    fn test_stop_returns_active() {
        let mut c = SpeechOutputController::new();
        assert_eq!(c.stop(), None);
        c.request(ControlId::WelcomePlayback);
        assert_eq!(c.stop(), Some(ControlId::WelcomePlayback));
        assert!(!c.is_speaking());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(OutputState::Idle.to_string(), "Idle");
        let s = OutputState::Speaking {
            control: ControlId::TranslationPlayback,
            ticket: 3,
        };
        assert_eq!(s.to_string(), "Speaking(translation-playback)");
    }

    #[test]
    fn test_prepare_utterance_cleans_and_picks_voice() {
        let mut catalog = VoiceCatalog::new("Google");
        catalog.replace(vec![Voice::new("Google português", "pt-BR")]);
        let utt = prepare_utterance("**Olá** mundo", "pt-BR", &catalog);
        assert_eq!(utt.text, "Olá mundo");
        assert_eq!(utt.language, "pt-BR");
        assert_eq!(utt.voice.unwrap().name, "Google português");
    }

    #[test]
    fn test_prepare_utterance_default_voice() {
        let catalog = VoiceCatalog::new("Google");
        let utt = prepare_utterance("hola", "es-ES", &catalog);
        assert!(utt.voice.is_none());
    }
}
