//! Error types for the ARGUS relay engine.

use thiserror::Error;

/// Convenience alias used across all ARGUS crates.
pub type ArgusResult<T> = Result<T, ArgusError>;

/// Errors surfaced by the relay engine.
///
/// Session-side decode problems are intentionally *not* represented here:
/// malformed viewer input is dropped where it is read (fail-soft), it never
/// propagates as an error.
#[derive(Debug, Error)]
pub enum ArgusError {
    /// Robot-bus transport failure (connect, subscribe, or publish).
    #[error("bus error: {0}")]
    Bus(String),

    /// A payload that was expected to deserialize did not.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid or unusable configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// The receiving end of a session's push queue is gone.
    #[error("session channel closed")]
    ChannelClosed,
}

impl ArgusError {
    /// Shorthand for a [`ArgusError::Bus`] from any displayable cause.
    pub fn bus(cause: impl std::fmt::Display) -> Self {
        ArgusError::Bus(cause.to_string())
    }
}
