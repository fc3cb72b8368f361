use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HablaError;

// =============================================================================
// Modes and personas
// =============================================================================

/// The assistant function the user has selected.
///
/// Exactly one mode is active at any instant. `Idle` is the landing state
/// shown before any mode is picked (and after a "go back" action).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Text correction with formal and informal rewrites.
    Corrector,
    /// Grammar questions and answers.
    Grammar,
    /// Idioms, sayings and regional slang.
    Culture,
    /// Travel guides with web and map lookups.
    Travel,
    /// Two-pane Spanish/Portuguese translator.
    Translator,
    /// Static contact panel.
    Contact,
    /// Landing panel, no mode selected.
    #[default]
    Idle,
}

impl Mode {
    /// Every mode, in navigation order.
    pub const ALL: [Mode; 7] = [
        Mode::Corrector,
        Mode::Grammar,
        Mode::Culture,
        Mode::Travel,
        Mode::Translator,
        Mode::Contact,
        Mode::Idle,
    ];

    /// Lowercase identifier used in config files and commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Corrector => "corrector",
            Mode::Grammar => "grammar",
            Mode::Culture => "culture",
            Mode::Travel => "travel",
            Mode::Translator => "translator",
            Mode::Contact => "contact",
            Mode::Idle => "idle",
        }
    }

    /// Modes that show the chat transcript and composer.
    pub fn is_chat(&self) -> bool {
        matches!(
            self,
            Mode::Corrector | Mode::Grammar | Mode::Culture | Mode::Travel
        )
    }

    /// Modes that are backed by a conversation session.
    pub fn has_session(&self) -> bool {
        self.is_chat() || *self == Mode::Translator
    }

    /// The view region shown while this mode is active.
    pub fn region(&self) -> ViewRegion {
        match self {
            Mode::Corrector | Mode::Grammar | Mode::Culture | Mode::Travel => ViewRegion::Chat,
            Mode::Translator => ViewRegion::Translator,
            Mode::Contact => ViewRegion::Contact,
            Mode::Idle => ViewRegion::Landing,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = HablaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| HablaError::Config(format!("unknown mode: {}", s)))
    }
}

/// Auxiliary backend capability enabled for a persona.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WebSearch,
    MapLookup,
}

/// Immutable persona definition bound to a conversation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Mode this persona serves.
    pub mode: Mode,
    /// System instruction handed to the backend.
    pub instruction: String,
    /// Response randomness, 0.0 to 1.0.
    pub temperature: f32,
    /// Auxiliary capabilities (web search, map lookup).
    pub capabilities: Vec<Capability>,
}

impl PersonaConfig {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// Identifier of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of an assistant message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Typing indicator shown, no content yet.
    Pending,
    /// At least one fragment received.
    Streaming,
    /// Stream finished; citations attached.
    Complete,
    /// Stream failed; content replaced by the error notice.
    Failed,
}

/// Where a citation points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Web,
    Map,
}

/// A structured reference attached to a completed assistant message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub label: String,
    pub uri: String,
    pub kind: CitationKind,
}

/// One entry of the visible transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    /// Source of truth for the message content.
    pub raw_text: String,
    /// Display markup derived from `raw_text` (plus the citation block).
    pub markup: String,
    pub citations: Vec<Citation>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A completed user message with its rendered markup.
    pub fn user(raw_text: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            raw_text: raw_text.into(),
            markup: markup.into(),
            citations: Vec::new(),
            status: MessageStatus::Complete,
            created_at: Utc::now(),
        }
    }

    /// An assistant placeholder showing the typing indicator.
    pub fn pending_assistant() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            raw_text: String::new(),
            markup: String::new(),
            citations: Vec::new(),
            status: MessageStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

// =============================================================================
// Translation
// =============================================================================

/// Translation direction between the two configured languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Source language to target language (Spanish to Portuguese by default).
    #[default]
    Forward,
    /// Target language back to source language.
    Reverse,
}

impl Direction {
    pub fn swapped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

// =============================================================================
// Surface
// =============================================================================

/// Mode-specific area of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewRegion {
    Landing,
    Chat,
    Translator,
    Contact,
}

/// Editable text surfaces that can receive dictation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Composer,
    TranslatorInput,
}

impl TextField {
    /// Microphone toggle attached to this field.
    pub fn mic_control(&self) -> ControlId {
        match self {
            TextField::Composer => ControlId::ComposerMic,
            TextField::TranslatorInput => ControlId::TranslatorMic,
        }
    }
}

/// A user-facing control whose visual state the orchestrator drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    WelcomePlayback,
    MessagePlayback(MessageId),
    TranslationPlayback,
    ComposerMic,
    TranslatorMic,
    TranslateTrigger,
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::WelcomePlayback => write!(f, "welcome-playback"),
            ControlId::MessagePlayback(id) => write!(f, "message-playback:{}", id),
            ControlId::TranslationPlayback => write!(f, "translation-playback"),
            ControlId::ComposerMic => write!(f, "composer-mic"),
            ControlId::TranslatorMic => write!(f, "translator-mic"),
            ControlId::TranslateTrigger => write!(f, "translate-trigger"),
        }
    }
}

/// Visual state of a control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlVisual {
    #[default]
    Idle,
    Playing,
    Recording,
    Disabled,
}
