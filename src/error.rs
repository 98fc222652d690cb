// Error types module

use thiserror::Error;

/// Errors raised at the edges of the path codec
///
/// Parsing, generation, signing and hashing are total; only configuration,
/// authorisation and the CLI's I/O can fail.
#[derive(Error, Debug)]
pub enum PathError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request is neither validly signed nor an allowed unsafe request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
