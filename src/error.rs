//! Error types for runlens
//!
//! Absence of an artifact or metric is never an error here: those are
//! modelled with `Option` and dedicated enums. `Error` covers genuine faults
//! (I/O, malformed artifacts, bad options).

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// runlens error types
#[derive(Error, Debug)]
pub enum Error {
    /// A present artifact could not be parsed as well-formed structured data
    #[error("Corrupted {artifact}: {message}")]
    ArtifactParse {
        /// File name of the artifact (e.g. `timers.json`)
        artifact: String,
        /// Underlying parser message
        message: String,
    },

    /// Run directory not found in the results store
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// Invalid caller input (options, selectors)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scan options file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::ArtifactParse`] for the named artifact.
    pub fn artifact_parse(artifact: impl Into<String>, message: impl ToString) -> Self {
        Self::ArtifactParse {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }
}
