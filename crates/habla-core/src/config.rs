use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HablaError, Result};
use crate::types::Mode;

/// Top-level configuration for the Habla application.
///
/// Loaded from `~/.habla/config.toml` by default. Every section falls back to
/// its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HablaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl HablaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HablaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HablaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Mode selected at startup. `idle` shows the landing panel.
    pub initial_mode: Mode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            initial_mode: Mode::Idle,
        }
    }
}

/// Generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Model identifier.
    pub model: String,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Language tag used outside the translator.
    pub spoken_language: String,
    /// Substring of a voice name preferred among matching voices.
    pub preferred_voice: String,
    /// Text-to-speech command; `{lang}` and `{voice}` are substituted and the
    /// text is written to stdin. Empty disables speech output.
    pub synthesizer_command: Vec<String>,
    /// Command listing voices as `name<TAB>lang` lines. Optional.
    pub voices_command: Vec<String>,
    /// Speech-to-text command; `{lang}` is substituted and the transcript is
    /// read from stdout. Empty disables speech input.
    pub recognizer_command: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            spoken_language: "es-ES".to_string(),
            preferred_voice: "Google".to_string(),
            synthesizer_command: vec![],
            voices_command: vec![],
            recognizer_command: vec![],
        }
    }
}

/// One side of the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Label shown above the pane.
    pub label: String,
    /// BCP 47 tag used for speech.
    pub tag: String,
    /// Input placeholder while this language is the source.
    pub placeholder: String,
    /// Name used in the translation prompt when this language is the target.
    /// As the source, the label is used.
    pub prompt_name: String,
}

/// Translator language pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub source: LanguageConfig,
    pub target: LanguageConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source: LanguageConfig {
                label: "Español".to_string(),
                tag: "es-ES".to_string(),
                placeholder: "Escribe en español...".to_string(),
                prompt_name: "Español".to_string(),
            },
            target: LanguageConfig {
                label: "Portugués".to_string(),
                tag: "pt-BR".to_string(),
                placeholder: "Escreva em português...".to_string(),
                prompt_name: "Portugués (Brasil)".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = HablaConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.initial_mode, Mode::Idle);
        assert_eq!(config.backend.model, "gemini-2.5-flash");
        assert_eq!(config.backend.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.backend.request_timeout_secs, 120);
        assert_eq!(config.speech.spoken_language, "es-ES");
        assert_eq!(config.speech.preferred_voice, "Google");
        assert!(config.speech.synthesizer_command.is_empty());
        assert!(config.speech.recognizer_command.is_empty());
        assert_eq!(config.translation.source.tag, "es-ES");
        assert_eq!(config.translation.target.tag, "pt-BR");
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
[general]
log_level = "debug"
initial_mode = "translator"

[backend]
model = "gemini-2.0-flash"
request_timeout_secs = 30

[speech]
spoken_language = "es-MX"
synthesizer_command = ["espeak-ng", "-v", "{lang}"]
"#,
        );
        let config = HablaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.initial_mode, Mode::Translator);
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(
            config.backend.base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.speech.spoken_language, "es-MX");
        assert_eq!(config.speech.synthesizer_command.len(), 3);
        assert_eq!(config.speech.preferred_voice, "Google");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nlog_level = \"warn\"\n");
        let config = HablaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.initial_mode, Mode::Idle);
        assert_eq!(config.translation.source.label, "Español");
    }

    #[test]
    fn test_load_invalid_mode_fails() {
        let file = create_temp_config("[general]\ninitial_mode = \"poetry\"\n");
        assert!(HablaConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let result = HablaConfig::load(file.path());
        assert!(matches!(result, Err(HablaError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = HablaConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = HablaConfig::default();
        config.general.initial_mode = Mode::Culture;
        config.speech.recognizer_command = vec!["whisper-cli".into(), "{lang}".into()];
        config.save(&path).unwrap();

        let loaded = HablaConfig::load(&path).unwrap();
        assert_eq!(loaded.general.initial_mode, Mode::Culture);
        assert_eq!(loaded.speech.recognizer_command, config.speech.recognizer_command);
        assert_eq!(loaded.translation.target, config.translation.target);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: HablaConfig = toml::from_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.translation.target.label, "Portugués");
    }
}
