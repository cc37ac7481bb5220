use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),

    #[error("generation request failed: {0}")]
    Request(reqwest::Error),

    #[error("generation failed: HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed generation response: {0}")]
    BadResponse(String),
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),

    #[error("synthesis request failed: {0}")]
    Request(reqwest::Error),

    #[error("synthesis failed: HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to write audio: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(String, String),

    #[error("missing environment variable {0}")]
    MissingKey(String),
}
