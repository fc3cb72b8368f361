//! Mode transition state machine.
//!
//! The machine only decides; the orchestrator applies the effects of a
//! [`TransitionPlan`] in order.

use habla_core::types::{Mode, ViewRegion};

/// Effects of one accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: Mode,
    pub to: Mode,
    /// The only region visible after the transition.
    pub region: ViewRegion,
    /// Clear the transcript and render a fresh welcome.
    pub reset_transcript: bool,
    /// Bind a new session; otherwise any session is dropped.
    pub create_session: bool,
}

/// Tracks the active mode.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    current: Mode,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new(Mode::Idle)
    }
}

impl ModeMachine {
    pub fn new(initial: Mode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    /// Plan a transition to `target`.
    ///
    /// Returns `None` when re-selecting the current mode changes nothing:
    /// a session-bearing mode that already has its session, or a mode that
    /// never has one. Idle is always re-enterable.
    pub fn plan(&self, target: Mode, session_present: bool) -> Option<TransitionPlan> {
        if target == self.current
            && target != Mode::Idle
            && (session_present || !target.has_session())
        {
            return None;
        }
        Some(TransitionPlan {
            from: self.current,
            to: target,
            region: target.region(),
            reset_transcript: target.is_chat(),
            create_session: target.has_session(),
        })
    }

    pub fn commit(&mut self, plan: &TransitionPlan) {
        tracing::info!(from = %plan.from, to = %plan.to, "Mode changed");
        self.current = plan.to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ModeMachine::default().current(), Mode::Idle);
    }

    #[test]
    fn test_plan_chat_mode() {
        let m = ModeMachine::default();
        let plan = m.plan(Mode::Grammar, false).unwrap();
        assert_eq!(plan.from, Mode::Idle);
        assert_eq!(plan.region, ViewRegion::Chat);
        assert!(plan.reset_transcript);
        assert!(plan.create_session);
    }

    #[test]
    fn test_plan_translator_and_contact() {
        let m = ModeMachine::default();
        let t = m.plan(Mode::Translator, false).unwrap();
        assert_eq!(t.region, ViewRegion::Translator);
        assert!(!t.reset_transcript);
        assert!(t.create_session);

        let c = m.plan(Mode::Contact, false).unwrap();
        assert_eq!(c.region, ViewRegion::Contact);
        assert!(!c.create_session);
    }

    #[test]
    fn test_reentry_with_session_is_noop() {
        let mut m = ModeMachine::default();
        let plan = m.plan(Mode::Culture, false).unwrap();
        m.commit(&plan);
        assert!(m.plan(Mode::Culture, true).is_none());
    }

    #[test]
    fn test_reentry_without_session_retries() {
        let mut m = ModeMachine::default();
        m.commit(&m.plan(Mode::Travel, false).unwrap());
        assert!(m.plan(Mode::Travel, false).is_some());
    }

    #[test]
    fn test_contact_reentry_is_noop() {
        let mut m = ModeMachine::default();
        m.commit(&m.plan(Mode::Contact, false).unwrap());
        assert!(m.plan(Mode::Contact, false).is_none());
    }

    #[test]
    fn test_idle_always_reenterable() {
        let m = ModeMachine::default();
        let plan = m.plan(Mode::Idle, false).unwrap();
        assert_eq!(plan.region, ViewRegion::Landing);
        assert!(!plan.create_session);
    }

    #[test]
    fn test_commit_updates_current() {
        let mut m = ModeMachine::default();
        let plan = m.plan(Mode::Translator, false).unwrap();
        m.commit(&plan);
        assert_eq!(m.current(), Mode::Translator);
    }
}
