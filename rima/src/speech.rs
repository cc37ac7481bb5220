use std::io::Read;

use crate::config::SpeechConfig;
use crate::constants::SPEECH_TIMEOUT;
use crate::error::SynthesisError;

pub const AUDIO_FILE_NAME: &str = "rima_reply.mp3";

pub struct Speech {
    config: SpeechConfig,
}

impl Speech {
    pub fn new(config: SpeechConfig) -> Self {
        Speech { config }
    }

    // Voice is best-effort: the caller logs failures and moves on, the text
    // reply is never blocked on synthesis.
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SPEECH_TIMEOUT)
            .build()
            .map_err(SynthesisError::Client)?;

        let url = format!(
            "{}?voice={}&text={}",
            self.config.endpoint,
            urlencoding::encode(&self.config.voice_id),
            urlencoding::encode(text)
        );

        let mut response = client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .map_err(SynthesisError::Request)?;

        if !response.status().is_success() {
            return Err(SynthesisError::Status(response.status()));
        }

        let mut audio = Vec::new();
        response.read_to_end(&mut audio)?;
        Ok(audio)
    }

    pub fn synthesize_to_file(
        &self,
        text: &str,
        dir: &std::path::Path,
    ) -> Result<std::path::PathBuf, SynthesisError> {
        let audio = self.synthesize(text)?;
        let path = dir.join(AUDIO_FILE_NAME);
        std::fs::write(&path, audio)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn test_config(endpoint: String) -> SpeechConfig {
        SpeechConfig {
            endpoint,
            voice_id: "rima-ru".to_string(),
            api_key: "speech-key".to_string(),
        }
    }

    #[test]
    fn test_synthesize_success() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/tts")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("voice".into(), "rima-ru".into()),
                mockito::Matcher::UrlEncoded("text".into(), "привет".into()),
            ]))
            .match_header("authorization", "Bearer speech-key")
            .with_status(200)
            .with_body(b"audio-bytes".to_vec())
            .create();

        let speech = Speech::new(test_config(format!("{}/tts", server.url())));
        let audio = speech.synthesize("привет").unwrap();
        assert_eq!(audio, b"audio-bytes");
        mock.assert();
    }

    #[test]
    fn test_synthesize_http_error() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/tts")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create();

        let speech = Speech::new(test_config(format!("{}/tts", server.url())));
        let result = speech.synthesize("привет");
        assert!(matches!(result, Err(SynthesisError::Status(_))));
        mock.assert();
    }

    #[test]
    fn test_synthesize_to_file() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/tts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(b"bytes".to_vec())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let speech = Speech::new(test_config(format!("{}/tts", server.url())));
        let path = speech.synthesize_to_file("привет", dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"bytes");
    }
}
