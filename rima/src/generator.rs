use std::io::Read;
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::error::GenerationError;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: String) -> Self {
        Message {
            role: "system".to_string(),
            content,
        }
    }

    pub fn user(content: String) -> Self {
        Message {
            role: "user".to_string(),
            content,
        }
    }

    pub fn assistant(content: String) -> Self {
        Message {
            role: "assistant".to_string(),
            content,
        }
    }
}

pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Generator { config }
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    // One blocking chat-completions call with a bounded timeout. Every failure
    // mode is a GenerationError; the pipeline converts those to a fallback
    // phrase instead of surfacing them.
    pub fn generate(
        &self,
        prompt: &[Message],
        temperature: f64,
    ) -> Result<String, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout))
            .build()
            .map_err(GenerationError::Client)?;

        #[derive(Debug, serde::Serialize)]
        struct Payload<'a> {
            model: &'a str,
            messages: &'a [Message],
            max_tokens: u32,
            temperature: f64,
        }

        let payload = Payload {
            model: &self.config.model,
            messages: prompt,
            max_tokens: self.config.max_tokens,
            temperature,
        };

        let mut response = client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .map_err(GenerationError::Request)?;

        if !response.status().is_success() {
            return Err(GenerationError::Status(response.status()));
        }

        let mut body = String::new();
        response
            .read_to_string(&mut body)
            .map_err(|e| GenerationError::BadResponse(e.to_string()))?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| GenerationError::BadResponse(e.to_string()))?;

        json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .map(|s| s.trim().to_string())
            .ok_or(GenerationError::BadResponse(body))
    }
}
