//! Conversational core of Habla.
//!
//! Persona registry, backend sessions, streamed reply assembly, Markdown
//! rendering, the translator, and the mode orchestrator that owns them all.

pub mod assembler;
pub mod backend;
pub mod clipboard;
pub mod error;
pub mod mode;
pub mod orchestrator;
pub mod persona;
pub mod render;
pub mod session;
pub mod transcript;
pub mod translation;

pub use assembler::{StreamAssembler, ERROR_NOTICE};
pub use backend::{
    ConversationBackend, Fragment, FragmentStream, GeminiBackend, GeminiConfig, SessionHandle,
};
pub use clipboard::Clipboard;
pub use error::ChatError;
pub use mode::{ModeMachine, TransitionPlan};
pub use orchestrator::{Completion, ModeOrchestrator, LISTENING_PLACEHOLDER};
pub use persona::{assistant_name, ModeProfile, PersonaRegistry, USER_DISPLAY_NAME};
pub use render::{citation_block, HtmlRenderer, MarkupRenderer, TerminalRenderer};
pub use session::{ConversationSession, SessionManager};
pub use transcript::{Transcript, WelcomeEntry};
pub use translation::{TranslationController, PENDING_OUTPUT, TRANSLATION_ERROR};
