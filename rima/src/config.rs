use std::path::Path;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_GENERATOR_TIMEOUT, DEFAULT_MAX_TOKENS, GENERATOR_API_KEY_VAR,
    SPEECH_API_KEY_VAR,
};
use crate::emotion::EmotionLabel;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub name: String,
    pub style: String,
    pub likes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub voice_id: String,
    pub api_key: String,
}

// Read-only during normal operation; biases prompt construction when the
// pattern store misses. Matched by substring in table order.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmotionalTrigger {
    pub emotion: EmotionLabel,
    pub contains: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub persona: Persona,
    pub speech: Option<SpeechConfig>,
    pub triggers: Vec<EmotionalTrigger>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    general: TomlGeneral,
    persona: TomlPersona,
    speech: Option<TomlSpeech>,
    #[serde(default)]
    triggers: Vec<EmotionalTrigger>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeneral {
    model: String,
    endpoint: String,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
}

fn default_timeout() -> u64 {
    DEFAULT_GENERATOR_TIMEOUT
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPersona {
    name: String,
    style: String,
    #[serde(default)]
    likes: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSpeech {
    endpoint: String,
    voice_id: String,
}

impl Config {
    pub fn new(config_path: &Path) -> Result<Self, ConfigError> {
        let toml_path = config_path.join(CONFIG_FILE_NAME);
        let toml_content = std::fs::read_to_string(toml_path)
            .map_err(|e| ConfigError::Io(CONFIG_FILE_NAME.to_string(), e))?;
        let toml_config: TomlConfig = toml::from_str(&toml_content)
            .map_err(|e| ConfigError::Parse(CONFIG_FILE_NAME.to_string(), e.to_string()))?;

        let api_key = std::env::var(GENERATOR_API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(GENERATOR_API_KEY_VAR.to_string()))?;

        // Speech is optional twice over: the section and the key must both be
        // present, otherwise voice output is silently unavailable.
        let speech = toml_config.speech.and_then(|s| {
            std::env::var(SPEECH_API_KEY_VAR)
                .ok()
                .filter(|k| !k.is_empty())
                .map(|api_key| SpeechConfig {
                    endpoint: s.endpoint,
                    voice_id: s.voice_id,
                    api_key,
                })
        });

        Ok(Config {
            generator: GeneratorConfig {
                model: toml_config.general.model,
                endpoint: toml_config.general.endpoint,
                api_key,
                timeout: toml_config.general.timeout,
                max_tokens: toml_config.general.max_tokens,
            },
            persona: Persona {
                name: toml_config.persona.name,
                style: toml_config.persona.style,
                likes: toml_config.persona.likes,
            },
            speech,
            triggers: toml_config.triggers,
        })
    }

    // First trigger, in table order, whose substring occurs in the message.
    pub fn find_trigger(&self, message: &str) -> Option<&EmotionalTrigger> {
        let lowered = message.to_lowercase();
        self.triggers.iter().find(|t| lowered.contains(&t.contains))
    }
}
