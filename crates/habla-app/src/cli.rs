//! CLI argument definitions for the Habla application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use habla_core::types::Mode;
use std::path::PathBuf;

/// Habla: Spanish practice with AI tutors and a Spanish/Portuguese translator.
#[derive(Parser, Debug)]
#[command(name = "habla", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Mode to open at startup (corrector, grammar, culture, travel,
    /// translator, contact, idle).
    #[arg(short = 'm', long = "mode")]
    pub mode: Option<Mode>,

    /// Backend model identifier.
    #[arg(long = "model")]
    pub model: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HABLA_CONFIG env var > ~/.habla/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HABLA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter used when `RUST_LOG` is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the startup mode.
    pub fn resolve_mode(&self, config_mode: Mode) -> Mode {
        self.mode.unwrap_or(config_mode)
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".habla").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".habla").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let args = CliArgs::parse_from(["habla"]);
        assert!(args.config.is_none());
        assert!(args.log_level.is_none());
        assert!(args.mode.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn test_parse_all_args() {
        let args = CliArgs::parse_from([
            "habla",
            "--config",
            "/tmp/habla.toml",
            "--log-level",
            "debug",
            "--mode",
            "translator",
            "--model",
            "gemini-2.0-flash",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/habla.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.mode, Some(Mode::Translator));
        assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn test_parse_short_flags() {
        let args = CliArgs::parse_from(["habla", "-c", "x.toml", "-l", "warn", "-m", "travel"]);
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert_eq!(args.log_level.as_deref(), Some("warn"));
        assert_eq!(args.mode, Some(Mode::Travel));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(CliArgs::try_parse_from(["habla", "--mode", "poetry"]).is_err());
    }

    #[test]
    fn test_config_flag_wins() {
        let args = CliArgs::parse_from(["habla", "--config", "/custom/config.toml"]);
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/custom/config.toml")
        );
    }

    #[test]
    fn test_log_level_resolution() {
        let args = CliArgs::parse_from(["habla"]);
        assert_eq!(args.resolve_log_level("info"), "info");
        let args = CliArgs::parse_from(["habla", "-l", "trace"]);
        assert_eq!(args.resolve_log_level("info"), "trace");
    }

    #[test]
    fn test_mode_resolution() {
        let args = CliArgs::parse_from(["habla"]);
        assert_eq!(args.resolve_mode(Mode::Culture), Mode::Culture);
        let args = CliArgs::parse_from(["habla", "--mode", "grammar"]);
        assert_eq!(args.resolve_mode(Mode::Culture), Mode::Grammar);
    }

    #[test]
    fn test_default_config_path_ends_with_habla() {
        let path = default_config_path();
        assert!(path.ends_with("config.toml"));
    }
}
