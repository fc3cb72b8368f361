use thiserror::Error;

/// Top-level error type for the Habla system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for HablaError` so that the `?` operator works
/// across crate boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HablaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for HablaError {
    fn from(err: toml::de::Error) -> Self {
        HablaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HablaError {
    fn from(err: toml::ser::Error) -> Self {
        HablaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HablaError {
    fn from(err: serde_json::Error) -> Self {
        HablaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Habla operations.
pub type Result<T> = std::result::Result<T, HablaError>;
