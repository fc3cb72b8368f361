//! Persona registry: system instruction, temperature and capabilities per mode,
//! plus the presentation profile (welcome, placeholder, display name).

use std::collections::HashMap;

use habla_core::types::{Capability, Mode, PersonaConfig};

const CHAT_TEMPERATURE: f32 = 0.7;
const TRANSLATOR_TEMPERATURE: f32 = 0.3;

/// Display name of the user in the transcript.
pub const USER_DISPLAY_NAME: &str = "Tú";

const CORRECTOR_INSTRUCTION: &str = "\
Eres el Profesor Luis González y trabajas en modo CORRECTOR DE TEXTOS.
Solo corriges los textos que te envía el estudiante.

Para cada texto:
1. Corrige ortografía, gramática, puntuación y concordancia.
2. Explica cada error en una frase clara.
3. Propón dos reescrituras:
   * **Versión Formal**
   * **Versión Informal/Natural**, respetando la intención original.
4. Añade sugerencias de estilo sobre cohesión y precisión léxica.

Si el estudiante solo saluda, contesta brevemente y pídele el texto.
Tu tono es profesional y centrado en la corrección.";

const GRAMMAR_INSTRUCTION: &str = "\
Eres el Profesor Luis González y trabajas en modo DUDAS DE GRAMÁTICA.
Respondes preguntas teóricas sobre la lengua española.

Pautas:
1. Explica reglas gramaticales, tiempos verbales, vocabulario y diferencias entre palabras.
2. Sé didáctico, claro y paciente.
3. Ilustra siempre la explicación con ejemplos prácticos.
4. No corrijas la pregunta como si fuera una redacción: responde a su contenido.

Si recibes un texto sin pregunta, pregunta qué duda gramatical tiene el estudiante sobre él.";

const CULTURE_INSTRUCTION: &str = "\
Eres un experto en dialectología hispánica y cultura popular: modismos, refranes,
jergas y expresiones coloquiales de todos los países hispanohablantes.

Enseñas qué significa cada expresión y también cómo y cuándo se usa. El usuario
puede pedirte expresiones de un país, sobre un tema o el significado de una frase.

Para cada expresión genera una ficha con este formato:

* **🗣️ La Expresión:** la frase en negrita.
* **🌎 País/Región:** dónde se usa.
* **📖 Significado:** qué quiere decir en español estándar.
* **🧐 Traducción Literal / Origen (Opcional):** la imagen o el origen si es curioso.
* **💡 Nivel de Formalidad:** coloquial, vulgar, familiar o formal.
* **💬 Ejemplo en Contexto:** una línea de diálogo natural.

Si una expresión es vulgar o malsonante, indícalo en el nivel de formalidad y
explica su significado con objetividad.";

const TRAVEL_INSTRUCTION: &str = "\
Eres periodista de viajes y antropólogo cultural. Creas \"Guías de Inmersión Total\"
para viajeros que quieren entender el alma de un lugar.

Herramientas (obligatorio):
1. Usa la búsqueda web para encontrar imágenes reales; prioriza Wikimedia Commons.
   Incrústalas con `![descripción](URL)` o, si no es posible, enlaza la búsqueda.
   No inventes URLs.
2. Usa la herramienta de mapas para ubicar los sitios y restaurantes que menciones.

Estructura del reportaje:

# 🌍 [Lugar]: Una Inmersión Cultural

### 1. 🎵 Ritmo y Movimiento (música y bailes)
### 2. 👗 Tejidos e Identidad (vestimenta típica)
### 3. 🍲 Sabores Auténticos (plato estrella, bebida, 📍 dónde probarlo, 🗺️ mapa)
### 4. 🏰 Huellas de la Historia (tres sitios imprescindibles con mapa)
### 5. 💡 Secretos Locales

Usa un lenguaje sensorial, entusiasta y riguroso.";

const TRANSLATOR_INSTRUCTION: &str = "\
Eres un traductor profesional bilingüe español <-> portugués.
Tu única función es traducir fielmente el texto del usuario.

Reglas:
1. Texto en español: tradúcelo al portugués de Brasil.
2. Texto en portugués: tradúcelo al español neutro.
3. Devuelve solo la traducción, sin comillas, notas ni introducciones.
4. Respeta el tono y la formalidad del original.";

/// Presentation of a chat-capable mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    /// Greeting rendered once when the mode is entered.
    pub welcome: &'static str,
    /// Composer placeholder.
    pub placeholder: &'static str,
    /// Name shown on assistant messages.
    pub assistant_name: &'static str,
}

/// Immutable Mode -> persona table.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: HashMap<Mode, PersonaConfig>,
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaRegistry {
    /// The built-in persona table.
    pub fn new() -> Self {
        let entries = [
            (Mode::Corrector, CORRECTOR_INSTRUCTION, CHAT_TEMPERATURE, vec![]),
            (Mode::Grammar, GRAMMAR_INSTRUCTION, CHAT_TEMPERATURE, vec![]),
            (Mode::Culture, CULTURE_INSTRUCTION, CHAT_TEMPERATURE, vec![]),
            (
                Mode::Travel,
                TRAVEL_INSTRUCTION,
                CHAT_TEMPERATURE,
                vec![Capability::WebSearch, Capability::MapLookup],
            ),
            (
                Mode::Translator,
                TRANSLATOR_INSTRUCTION,
                TRANSLATOR_TEMPERATURE,
                vec![],
            ),
        ];

        let personas = entries
            .into_iter()
            .map(|(mode, instruction, temperature, capabilities)| {
                (
                    mode,
                    PersonaConfig {
                        mode,
                        instruction: instruction.to_string(),
                        temperature,
                        capabilities,
                    },
                )
            })
            .collect();

        Self { personas }
    }

    /// Persona for a session-bearing mode; `None` for contact and idle.
    pub fn persona(&self, mode: Mode) -> Option<&PersonaConfig> {
        self.personas.get(&mode)
    }

    /// Presentation profile for a chat-capable mode.
    pub fn profile(mode: Mode) -> Option<ModeProfile> {
        let profile = match mode {
            Mode::Corrector => ModeProfile {
                welcome: "¡Hola! Soy el Profesor Luis González. Pega tu texto aquí y te ayudaré a perfeccionarlo con correcciones y mejores versiones.",
                placeholder: "Escribe tu texto aquí para corregirlo...",
                assistant_name: assistant_name(mode),
            },
            Mode::Grammar => ModeProfile {
                welcome: "¡Bienvenido a la sección de Gramática! Pregúntame cualquier duda sobre reglas, verbos o vocabulario español.",
                placeholder: "Escribe tu duda gramatical aquí...",
                assistant_name: assistant_name(mode),
            },
            Mode::Culture => ModeProfile {
                welcome: "¡Bienvenido a Modismos y Cultura! Pregúntame por expresiones de un país (ej: México, España) o refranes sobre un tema.",
                placeholder: "Pídeme modismos, refranes o jerga...",
                assistant_name: assistant_name(mode),
            },
            Mode::Travel => ModeProfile {
                welcome: "¡Bienvenido a Viajes y Cultura! Dime qué ciudad o país quieres explorar y crearé una Guía de Inmersión completa para ti.",
                placeholder: "Dime una ciudad o país para crear su guía...",
                assistant_name: assistant_name(mode),
            },
            Mode::Translator | Mode::Contact | Mode::Idle => return None,
        };
        Some(profile)
    }
}

/// Name shown on assistant messages while `mode` is active.
pub fn assistant_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Travel => "Guía de Viajes",
        Mode::Culture => "Experto Cultural",
        _ => "Profesor Luis",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_modes_have_personas() {
        let registry = PersonaRegistry::new();
        for mode in Mode::ALL {
            assert_eq!(
                registry.persona(mode).is_some(),
                mode.has_session(),
                "persona presence mismatch for {}",
                mode
            );
        }
    }

    #[test]
    fn test_persona_is_keyed_by_its_mode() {
        let registry = PersonaRegistry::new();
        for mode in Mode::ALL.iter().filter(|m| m.has_session()) {
            assert_eq!(registry.persona(*mode).unwrap().mode, *mode);
        }
    }

    #[test]
    fn test_temperatures() {
        let registry = PersonaRegistry::new();
        assert_eq!(registry.persona(Mode::Translator).unwrap().temperature, 0.3);
        for mode in [Mode::Corrector, Mode::Grammar, Mode::Culture, Mode::Travel] {
            assert_eq!(registry.persona(mode).unwrap().temperature, 0.7);
        }
    }

    #[test]
    fn test_only_travel_has_capabilities() {
        let registry = PersonaRegistry::new();
        let travel = registry.persona(Mode::Travel).unwrap();
        assert!(travel.has_capability(Capability::WebSearch));
        assert!(travel.has_capability(Capability::MapLookup));
        for mode in [Mode::Corrector, Mode::Grammar, Mode::Culture, Mode::Translator] {
            assert!(registry.persona(mode).unwrap().capabilities.is_empty());
        }
    }

    #[test]
    fn test_profiles_for_chat_modes_only() {
        for mode in Mode::ALL {
            assert_eq!(PersonaRegistry::profile(mode).is_some(), mode.is_chat());
        }
    }

    #[test]
    fn test_profile_texts() {
        let corrector = PersonaRegistry::profile(Mode::Corrector).unwrap();
        assert!(corrector.welcome.starts_with("¡Hola! Soy el Profesor Luis González."));
        assert_eq!(
            corrector.placeholder,
            "Escribe tu texto aquí para corregirlo..."
        );
        let travel = PersonaRegistry::profile(Mode::Travel).unwrap();
        assert_eq!(travel.assistant_name, "Guía de Viajes");
    }

    #[test]
    fn test_assistant_names() {
        assert_eq!(assistant_name(Mode::Travel), "Guía de Viajes");
        assert_eq!(assistant_name(Mode::Culture), "Experto Cultural");
        assert_eq!(assistant_name(Mode::Grammar), "Profesor Luis");
        assert_eq!(assistant_name(Mode::Corrector), "Profesor Luis");
    }
}
