//! In-memory transcript of the active chat mode.

use habla_core::types::{Message, MessageId, Mode, Role};

/// Persona greeting shown before the first submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEntry {
    pub mode: Mode,
    pub text: String,
}

/// Ordered messages plus an optional welcome entry. Not persisted.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    welcome: Option<WelcomeEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every message and the welcome entry.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.welcome = None;
    }

    /// Replace the welcome entry.
    pub fn set_welcome(&mut self, mode: Mode, text: impl Into<String>) {
        self.welcome = Some(WelcomeEntry {
            mode,
            text: text.into(),
        });
    }

    /// Remove the welcome entry. Returns `true` if one was shown.
    pub fn dismiss_welcome(&mut self) -> bool {
        self.welcome.take().is_some()
    }

    pub fn welcome(&self) -> Option<&WelcomeEntry> {
        self.welcome.as_ref()
    }

    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Assistant messages in order.
    pub fn assistant_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == Role::Assistant)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lookup() {
        let mut t = Transcript::new();
        let user = t.push(Message::user("Hola", "Hola"));
        let reply = t.push(Message::pending_assistant());
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(user).unwrap().raw_text, "Hola");
        assert!(t.get(reply).unwrap().is_pending());
        assert_eq!(t.assistant_messages().count(), 1);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut t = Transcript::new();
        let id = t.push(Message::pending_assistant());
        t.get_mut(id).unwrap().raw_text.push_str("Olá");
        assert_eq!(t.messages()[0].raw_text, "Olá");
    }

    #[test]
    fn test_welcome_lifecycle() {
        let mut t = Transcript::new();
        assert!(!t.dismiss_welcome());
        t.set_welcome(Mode::Grammar, "¡Bienvenido!");
        assert_eq!(t.welcome().unwrap().mode, Mode::Grammar);
        assert!(t.dismiss_welcome());
        assert!(t.welcome().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut t = Transcript::new();
        t.set_welcome(Mode::Culture, "hola");
        t.push(Message::user("a", "a"));
        t.clear();
        assert!(t.is_empty());
        assert!(t.welcome().is_none());
    }
}
