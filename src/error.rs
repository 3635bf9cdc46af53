//! Error types for the Reolink gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No response was obtained from the camera (timeout, DNS, refused)
    #[error("transport error: {0}")]
    Transport(String),

    /// The camera answered but reported a failure
    #[error("device error: {0}")]
    Device(String),

    /// A requested value is outside the feature's accepted domain
    #[error(transparent)]
    Validation(#[from] crate::dispatch::ValidationError),

    /// Feature identifier not known to the dispatcher
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// Snapshot retrieval error
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
