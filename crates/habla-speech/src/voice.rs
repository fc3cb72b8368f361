//! Voice catalog and best-effort voice selection.

use serde::{Deserialize, Serialize};

/// A voice offered by the text-to-speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. `es-ES`.
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// The engine's voice list, refreshed whenever the engine reports a change.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    preferred_hint: String,
}

impl VoiceCatalog {
    /// Create an empty catalog preferring voices whose name contains `preferred_hint`.
    pub fn new(preferred_hint: impl Into<String>) -> Self {
        Self {
            voices: Vec::new(),
            preferred_hint: preferred_hint.into(),
        }
    }

    /// Replace the voice list (startup load or voices-changed notification).
    pub fn replace(&mut self, voices: Vec<Voice>) {
        tracing::debug!(count = voices.len(), "Voice catalog updated");
        self.voices = voices;
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Pick a voice for `language`.
    ///
    /// Matching is on the base language (`pt` for `pt-BR`). Among matches a
    /// voice whose name contains the preferred hint wins; otherwise the first
    /// match. `None` leaves the choice to the engine default.
    pub fn select(&self, language: &str) -> Option<&Voice> {
        let base = base_language(language);
        if base.is_empty() {
            return None;
        }
        let matching: Vec<&Voice> = self
            .voices
            .iter()
            .filter(|v| base_language(&v.language) == base)
            .collect();

        if !self.preferred_hint.is_empty() {
            if let Some(preferred) = matching
                .iter()
                .find(|v| v.name.contains(self.preferred_hint.as_str()))
            {
                return Some(*preferred);
            }
        }
        matching.first().copied()
    }
}

/// Lowercased primary subtag of a language tag.
fn base_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VoiceCatalog {
        let mut c = VoiceCatalog::new("Google");
        c.replace(vec![
            Voice::new("Monica", "es-ES"),
            Voice::new("Google español", "es-US"),
            Voice::new("Luciana", "pt-BR"),
            Voice::new("Samantha", "en-US"),
        ]);
        c
    }

    #[test]
    fn test_prefers_hinted_voice_for_base_language() {
        let c = catalog();
        let voice = c.select("es-ES").unwrap();
        assert_eq!(voice.name, "Google español");
    }

    #[test]
    fn test_falls_back_to_any_base_match() {
        let c = catalog();
        let voice = c.select("pt-BR").unwrap();
        assert_eq!(voice.name, "Luciana");
    }

    #[test]
    fn test_base_match_ignores_region_and_case() {
        let c = catalog();
        assert_eq!(c.select("PT_pt").unwrap().name, "Luciana");
    }

    #[test]
    fn test_no_match_uses_engine_default() {
        let c = catalog();
        assert!(c.select("fr-FR").is_none());
        assert!(c.select("").is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let c = VoiceCatalog::new("Google");
        assert!(c.is_empty());
        assert!(c.select("es-ES").is_none());
    }

    #[test]
    fn test_replace_swaps_list() {
        let mut c = catalog();
        c.replace(vec![Voice::new("Paulina", "es-MX")]);
        assert_eq!(c.voices().len(), 1);
        assert_eq!(c.select("es-ES").unwrap().name, "Paulina");
    }

    #[test]
    fn test_empty_hint_takes_first_match() {
        let mut c = VoiceCatalog::new("");
        c.replace(vec![Voice::new("A", "es-ES"), Voice::new("Google B", "es-ES")]);
        assert_eq!(c.select("es").unwrap().name, "A");
    }
}
