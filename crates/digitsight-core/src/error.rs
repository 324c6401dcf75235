//! Error types for Digitsight

/// Result type alias using Digitsight's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Digitsight operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Image bytes could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Pixel buffer or tensor dimensions do not match expectations
    #[error("shape error: {0}")]
    Shape(String),

    /// Model loading or inference errors
    #[error("model error: {0}")]
    Model(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new shape error
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for errors caused by the caller's input rather than the
    /// service itself. Endpoints map these to 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Shape(_))
    }
}
