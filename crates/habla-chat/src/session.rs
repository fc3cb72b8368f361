//! Lifecycle of the single active conversation session.

use std::sync::Arc;

use habla_core::types::{Mode, PersonaConfig};
use uuid::Uuid;

use crate::backend::{ConversationBackend, SessionHandle};
use crate::error::ChatError;

/// A live conversation bound to one persona.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSession {
    pub id: Uuid,
    pub mode: Mode,
    pub persona: PersonaConfig,
    pub handle: SessionHandle,
}

/// Owns at most one session; creating a new one supersedes the old.
pub struct SessionManager {
    backend: Arc<dyn ConversationBackend>,
    current: Option<ConversationSession>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ConversationBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    pub fn backend(&self) -> Arc<dyn ConversationBackend> {
        Arc::clone(&self.backend)
    }

    pub fn current(&self) -> Option<&ConversationSession> {
        self.current.as_ref()
    }

    /// Drop any previous session and open one for `persona`.
    ///
    /// On failure no session remains.
    pub fn create(&mut self, persona: &PersonaConfig) -> Result<&ConversationSession, ChatError> {
        self.clear();
        let handle = self.backend.create(persona)?;
        let session = ConversationSession {
            id: Uuid::new_v4(),
            mode: persona.mode,
            persona: persona.clone(),
            handle,
        };
        tracing::info!(mode = %session.mode, session = %session.id, "Conversation session created");
        Ok(self.current.insert(session))
    }

    /// Drop the current session, if any.
    pub fn clear(&mut self) {
        if let Some(session) = self.current.take() {
            self.backend.release(session.handle);
            tracing::debug!(mode = %session.mode, session = %session.id, "Conversation session dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::persona::PersonaRegistry;

    fn manager(backend: ScriptedBackend) -> (SessionManager, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        (SessionManager::new(backend.clone()), backend)
    }

    #[test]
    fn test_create_binds_persona() {
        let (mut sessions, backend) = manager(ScriptedBackend::default());
        let registry = PersonaRegistry::new();
        let session = sessions
            .create(registry.persona(Mode::Grammar).unwrap())
            .unwrap();
        assert_eq!(session.mode, Mode::Grammar);
        assert_eq!(backend.created_count(), 1);
    }

    #[test]
    fn test_create_supersedes_previous() {
        let (mut sessions, backend) = manager(ScriptedBackend::default());
        let registry = PersonaRegistry::new();
        let first = sessions
            .create(registry.persona(Mode::Corrector).unwrap())
            .unwrap()
            .handle;
        let second = sessions
            .create(registry.persona(Mode::Translator).unwrap())
            .unwrap()
            .handle;
        assert_ne!(first, second);
        assert_eq!(sessions.current().unwrap().mode, Mode::Translator);
        assert_eq!(*backend.released.lock().unwrap(), vec![first]);
    }

    #[test]
    fn test_failed_create_leaves_no_session() {
        let (mut sessions, _) = manager(ScriptedBackend {
            fail_create: true,
            ..ScriptedBackend::default()
        });
        let registry = PersonaRegistry::new();
        assert!(sessions
            .create(registry.persona(Mode::Travel).unwrap())
            .is_err());
        assert!(sessions.current().is_none());
    }

    #[test]
    fn test_clear_releases() {
        let (mut sessions, backend) = manager(ScriptedBackend::default());
        let registry = PersonaRegistry::new();
        sessions
            .create(registry.persona(Mode::Culture).unwrap())
            .unwrap();
        sessions.clear();
        assert!(sessions.current().is_none());
        assert_eq!(backend.released.lock().unwrap().len(), 1);
        sessions.clear();
        assert_eq!(backend.released.lock().unwrap().len(), 1);
    }
}
