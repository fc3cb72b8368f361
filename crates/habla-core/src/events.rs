use serde::{Deserialize, Serialize};

use crate::types::{ControlId, ControlVisual, Direction, MessageId, Mode, TextField, ViewRegion};

/// Visible state changes published by the orchestrator.
///
/// Events are consumed by the interactive surface, which re-reads whatever
/// state it needs from the orchestrator when an event arrives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum UiEvent {
    // =========================================================================
    // Modes and sessions
    // =========================================================================
    /// The active mode changed and exactly `region` is now visible.
    ModeChanged {
        from: Mode,
        to: Mode,
        region: ViewRegion,
    },

    /// A conversation session is bound to the new mode.
    SessionCreated { mode: Mode },

    /// Session creation failed; submissions will be ignored.
    SessionUnavailable { mode: Mode, reason: String },

    // =========================================================================
    // Transcript
    // =========================================================================
    /// All transcript entries were removed.
    TranscriptCleared,

    /// The persona welcome entry was rendered.
    WelcomeShown { mode: Mode, text: String },

    /// The welcome entry was dismissed by the first submission.
    WelcomeDismissed,

    /// A message was added at the end of the transcript.
    MessageAppended { id: MessageId },

    /// Message markup was re-rendered.
    MessageUpdated { id: MessageId },

    /// The stream for a message ended normally.
    MessageCompleted { id: MessageId, citations: usize },

    /// The stream for a message failed and the error notice replaced it.
    MessageFailed { id: MessageId },

    // =========================================================================
    // Controls and fields
    // =========================================================================
    /// A control changed visual state.
    ControlChanged {
        control: ControlId,
        visual: ControlVisual,
    },

    /// A text field's placeholder changed.
    PlaceholderChanged { field: TextField, text: String },

    /// A text field's content changed outside of user typing.
    FieldTextChanged { field: TextField, text: String },

    // =========================================================================
    // Translator
    // =========================================================================
    /// A translation exchange started.
    TranslationPending,

    /// The translation output was replaced by a result.
    TranslationCompleted { text: String },

    /// The translation output was replaced by the error notice.
    TranslationFailed,

    /// The translation direction was swapped.
    DirectionSwapped {
        direction: Direction,
        source_label: String,
        target_label: String,
    },

    /// Text was copied to the clipboard.
    Copied { chars: usize },
}
