//! Cloud error types

use thiserror::Error;

/// Errors raised while talking to the remote PaaS
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Per-resource generation failures. The resource's operation is omitted.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("{name}: store kind '{kind}' has no remote equivalent")]
    UnsupportedStoreKind { name: String, kind: String },

    #[error("{name}: failed to build payload: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
