mod behavior;
mod config;
mod constants;
mod emotion;
mod error;
mod generator;
mod pipeline;
mod prompt;
mod score;
mod sentiment;
mod speech;
mod store;

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::{CONFIG_FILE_NAME, ENV_FILE_NAME};
use crate::generator::Generator;
use crate::pipeline::Pipeline;
use crate::sentiment::Lexicon;
use crate::speech::Speech;
use crate::store::Store;

const SARCASM_FLAG: &str = "sarcasm";
const EMPATHY_FLAG: &str = "empathy";
const VOICE_FLAG: &str = "voice";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Flag {
    name: String,
    requires_value: bool,
}

impl Flag {
    fn new(name: &str, requires_value: bool) -> Self {
        Flag {
            name: name.to_string(),
            requires_value,
        }
    }
}

fn known_flags() -> Vec<Flag> {
    vec![
        Flag::new(SARCASM_FLAG, true),
        Flag::new(EMPATHY_FLAG, true),
        Flag::new(VOICE_FLAG, false),
    ]
}

fn usage() -> String {
    format!(
        "Usage: rima [-{}=0.5] [-{}=0.5] [-{}] <message>",
        SARCASM_FLAG, EMPATHY_FLAG, VOICE_FLAG
    )
}

// Extracts known flags from the start of the query. Returns the flags and the
// remaining query; unknown flags are an error.
fn extract_flags(known_flags: &[Flag], query: &str) -> Result<(Vec<String>, String), String> {
    let mut flags = Vec::new();
    let mut unknown_flags = Vec::new();
    let mut rest = query.trim_start();
    while let Some(stripped) = rest.strip_prefix('-') {
        let (flag_with_value, remaining) = stripped.split_once(' ').unwrap_or((stripped, ""));
        rest = remaining.trim_start();
        let flag_name = flag_with_value.split('=').next().unwrap_or(flag_with_value);

        if let Some(known_flag) = known_flags.iter().find(|f| f.name == flag_name) {
            if known_flag.requires_value && !flag_with_value.contains('=') {
                return Err(format!(
                    "Flag -{} requires a value (e.g., -{}=0.5)",
                    flag_name, flag_name
                ));
            }
            flags.push(flag_with_value.to_string());
        } else {
            unknown_flags.push(flag_with_value.to_string());
        }
    }
    if !unknown_flags.is_empty() {
        return Err(format!("Unknown flag(s): {}", unknown_flags.join(", ")));
    }
    Ok((flags, rest.to_string()))
}

fn flag_value(flags: &[String], name: &str) -> Option<f32> {
    flags
        .iter()
        .find(|f| f.starts_with(&format!("{}=", name)))
        .and_then(|f| f.split('=').nth(1))
        .and_then(|s| s.parse::<f32>().ok())
}

fn locate_config_path() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let config_file = current_dir.join(CONFIG_FILE_NAME);
    if config_file.exists() && config_file.is_file() {
        return Some(current_dir);
    }
    None
}

fn load_env(path: &Path) {
    let _ = dotenvy::from_path(path.join(ENV_FILE_NAME));
}

// An HTTPS request error might expose the API key by accident, so we redact it
// to be safe. The reply itself never contains the key.
fn sanitize_output(s: &str, api_key: Option<&str>) -> String {
    let redacted = match api_key {
        Some(k) if !k.is_empty() => s.replace(k, "[REDACTED]"),
        _ => s.to_string(),
    };
    redacted.replace('\n', " ")
}

struct Input {
    config_path: PathBuf,
    flags: Vec<String>,
    message: String,
}

fn setup() -> Result<Input, String> {
    let config_path = match locate_config_path() {
        Some(path) => path,
        None => return Err("Config file not found.".to_string()),
    };
    load_env(&config_path);

    let (flags, message) = extract_flags(
        &known_flags(),
        &std::env::args().skip(1).collect::<Vec<_>>().join(" "),
    )
    .map_err(|err| format!("{}.  {}", err, usage()))?;

    Ok(Input {
        config_path,
        flags,
        message,
    })
}

fn run(input: &Input) -> Result<String, String> {
    let message = input.message.trim();
    if message.is_empty() {
        return Ok(usage());
    }

    let config = Config::new(&input.config_path).map_err(|e| e.to_string())?;
    let store = Store::open(&input.config_path).map_err(|e| e.to_string())?;
    let generator = Generator::new(config.generator.clone());
    let speech = config.speech.clone().map(Speech::new);
    let mut pipeline = Pipeline::new(config, store, generator, Lexicon);

    if let Some(value) = flag_value(&input.flags, SARCASM_FLAG) {
        pipeline.set_sarcasm(value);
    }
    if let Some(value) = flag_value(&input.flags, EMPATHY_FLAG) {
        pipeline.set_empathy(value);
    }

    let reply = pipeline.respond(message);

    if input.flags.iter().any(|f| f == VOICE_FLAG) {
        match speech {
            Some(speech) => match speech.synthesize_to_file(&reply.text, &input.config_path) {
                Ok(path) => info!("voice reply written to {}", path.display()),
                Err(e) => warn!("voice output skipped: {}", e),
            },
            None => warn!("voice output skipped: no [speech] section or API key configured"),
        }
    }

    Ok(reply.text)
}

fn main() {
    // Logs go to stderr; stdout carries exactly the reply text.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input = setup().unwrap_or_else(|err| {
        println!("{}", sanitize_output(&err, None));
        std::process::exit(1);
    });
    let api_key = std::env::var(crate::constants::GENERATOR_API_KEY_VAR).ok();
    match run(&input) {
        Ok(msg) => println!("{}", sanitize_output(&msg, api_key.as_deref())),
        Err(err) => {
            println!("{}", sanitize_output(&err, api_key.as_deref()));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_flags() {
        let (flags, message) = extract_flags(
            &known_flags(),
            "-sarcasm=0.7 -voice   привет, как дела?",
        )
        .unwrap();
        assert_eq!(flags, vec!["sarcasm=0.7", "voice"]);
        assert_eq!(message, "привет, как дела?");
    }

    #[test]
    fn test_extract_flags_unknown() {
        let result = extract_flags(&known_flags(), "-loud привет");
        assert!(result.unwrap_err().contains("Unknown flag(s): loud"));
    }

    #[test]
    fn test_extract_flags_slider_requires_value() {
        let result = extract_flags(&known_flags(), "-sarcasm привет");
        let error = result.unwrap_err();
        assert!(error.contains("Flag -sarcasm requires a value"));
    }

    #[test]
    fn test_flag_value() {
        let flags = vec!["sarcasm=0.7".to_string(), "voice".to_string()];
        assert_eq!(flag_value(&flags, "sarcasm"), Some(0.7));
        assert_eq!(flag_value(&flags, "empathy"), None);
    }

    #[test]
    fn test_sanitize_output_redacts_key() {
        let sanitized = sanitize_output("error: bad key secret123\nmore", Some("secret123"));
        assert_eq!(sanitized, "error: bad key [REDACTED] more");
    }
}
