//! Engine traits for speech output and speech input.
//!
//! Engines are callback-driven on most platforms; here each request is an
//! async call that resolves when the engine reports the end of the request,
//! so callers can await it inside a task and cancel by aborting the task.

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::voice::Voice;

/// A prepared speech output request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Text already cleaned for speech.
    pub text: String,
    /// Language tag to speak in.
    pub language: String,
    /// Chosen voice; `None` uses the engine default.
    pub voice: Option<Voice>,
}

/// Text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Current voice list. May be empty until the engine has loaded it.
    async fn voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Speak an utterance. Resolves on natural completion, errors on engine failure.
    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Stop any playback in progress.
    fn cancel(&self);
}

/// Speech-to-text engine configured for one finalized utterance per call.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Capture one utterance in `language`.
    ///
    /// Returns `Ok(None)` when capture ended without a result (silence
    /// timeout or early stop).
    async fn recognize(&self, language: &str) -> Result<Option<String>, SpeechError>;

    /// Request early termination of the capture in progress.
    fn stop(&self);
}
