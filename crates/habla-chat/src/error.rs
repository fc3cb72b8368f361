//! Error types for the conversation layer.

use habla_core::error::HablaError;

/// Errors from the conversation backend, sessions and clipboard.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("stream error: {0}")]
    Stream(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}

impl From<ChatError> for HablaError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Clipboard(msg) => HablaError::Clipboard(msg),
            ChatError::MissingApiKey(_) => HablaError::Config(err.to_string()),
            other => HablaError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::MissingApiKey("GEMINI_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "missing API key: environment variable GEMINI_API_KEY is not set"
        );

        let err = ChatError::Http {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned HTTP 429: quota exceeded");

        let err = ChatError::Stream("connection reset".to_string());
        assert_eq!(err.to_string(), "stream error: connection reset");
    }

    #[test]
    fn test_session_not_found_preserves_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let err = ChatError::SessionNotFound(id);
        assert_eq!(
            err.to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ChatError = json_err.into();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[test]
    fn test_into_habla_error() {
        let err: HablaError = ChatError::Clipboard("no display".into()).into();
        assert!(matches!(err, HablaError::Clipboard(_)));

        let err: HablaError = ChatError::MissingApiKey("KEY".into()).into();
        assert!(matches!(err, HablaError::Config(_)));

        let err: HablaError = ChatError::Stream("eof".into()).into();
        assert!(matches!(err, HablaError::Backend(_)));
        assert!(err.to_string().contains("eof"));
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::Decode("eof".into()));
        assert!(dbg.contains("Decode"));
    }
}
