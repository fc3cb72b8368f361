//! Habla speech crate - speech output and speech input coordination.
//!
//! Holds the two single-slot controllers (at most one utterance playing,
//! at most one capture listening), the engine traits they drive, voice
//! selection, text cleanup for speech, and command-backed engines.

pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod process;
pub mod sanitize;
pub mod voice;

pub use engine::{SpeechRecognizer, SpeechSynthesizer, Utterance};
pub use error::SpeechError;
pub use input::{append_transcript, Capture, SpeechInputController};
pub use output::{prepare_utterance, OutputState, SpeakDecision, SpeechOutputController};
pub use process::{CommandRecognizer, CommandSynthesizer};
pub use sanitize::clean_for_speech;
pub use voice::{Voice, VoiceCatalog};
