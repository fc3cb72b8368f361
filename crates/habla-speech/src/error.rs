//! Error types for speech engines.

use habla_core::error::HablaError;

/// Errors from speech input and output engines.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
    #[error("speech engine failed: {0}")]
    Engine(String),
    #[error("speech cancelled")]
    Cancelled,
    #[error("speech I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SpeechError> for HablaError {
    fn from(err: SpeechError) -> Self {
        HablaError::Speech(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_error_display() {
        let err = SpeechError::Unavailable("no recognizer".to_string());
        assert_eq!(err.to_string(), "speech engine unavailable: no recognizer");

        let err = SpeechError::Engine("exit status 1".to_string());
        assert_eq!(err.to_string(), "speech engine failed: exit status 1");

        assert_eq!(SpeechError::Cancelled.to_string(), "speech cancelled");
    }

    #[test]
    fn test_speech_error_into_habla_error() {
        let err: HablaError = SpeechError::Cancelled.into();
        assert!(matches!(err, HablaError::Speech(_)));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "espeak-ng");
        let err: SpeechError = io.into();
        assert!(matches!(err, SpeechError::Io(_)));
        assert!(err.to_string().contains("espeak-ng"));
    }
}
