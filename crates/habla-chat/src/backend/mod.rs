//! Generative-response backend interface.
//!
//! A backend hands out opaque session handles bound to a persona and keeps
//! the conversation history per handle. Streamed replies arrive as a finite
//! sequence of [`Fragment`]s.

pub mod gemini;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use habla_core::types::{Citation, PersonaConfig};
use uuid::Uuid;

use crate::error::ChatError;

pub use gemini::{GeminiBackend, GeminiConfig};

/// Opaque reference to a backend conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One element of a streamed reply.
///
/// `citations` is `Some` when the fragment carried grounding metadata; the
/// latest such fragment wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: Option<String>,
    pub citations: Option<Vec<Citation>>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            citations: None,
        }
    }
}

/// A finite stream of reply fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, ChatError>> + Send>>;

/// Conversation backend.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Open a conversation configured with `persona`.
    fn create(&self, persona: &PersonaConfig) -> Result<SessionHandle, ChatError>;

    /// Send a user turn and stream the reply.
    async fn send_streaming(
        &self,
        handle: SessionHandle,
        text: &str,
    ) -> Result<FragmentStream, ChatError>;

    /// Send a user turn and wait for the whole reply.
    async fn send_once(&self, handle: SessionHandle, text: &str) -> Result<String, ChatError>;

    /// Forget a conversation. Unknown handles are ignored.
    fn release(&self, handle: SessionHandle);
}
