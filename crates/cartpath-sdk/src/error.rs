//! Error types for the Cartpath SDK

use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum SdkError {
    /// Operation needs a signed-in user
    #[error("No authenticated user")]
    NotAuthenticated,

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Backend rejected the request
    #[error("API error: {0}")]
    Api(String),

    /// Resource not found on the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<cartpath_client::ClientError> for SdkError {
    fn from(err: cartpath_client::ClientError) -> Self {
        use cartpath_client::ClientError;
        match err {
            ClientError::Http(e) => SdkError::Network(e.to_string()),
            ClientError::Json(e) => SdkError::Serialization(e.to_string()),
            ClientError::NotFound(what) => SdkError::NotFound(what),
            ClientError::InvalidConfig(msg) => SdkError::Config(msg),
            other => SdkError::Api(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

#[cfg(feature = "native")]
impl From<rusqlite::Error> for SdkError {
    fn from(err: rusqlite::Error) -> Self {
        SdkError::Storage(err.to_string())
    }
}
