//! Error types for the CiteGraph engine
//!
//! Provides a single error taxonomy for the fetch/build pipeline:
//! - Distinct variants for each failure mode (input, transport, aggregation)
//! - User-facing message mapping for the error banner
//! - An explicit Abort variant that is never surfaced to the user

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    // Input errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // Transport errors
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status: {status}")]
    UnexpectedStatus { status: u16 },

    // Aggregation endpoint reported failure (wrapped payload, success=false)
    #[error("Aggregation error: {message}")]
    Aggregation { message: String },

    // Cancelled by a superseding request; never user-visible
    #[error("Request aborted")]
    Aborted,

    // Internal errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Check whether this error is a cooperative cancellation.
    ///
    /// Aborts are silently discarded: no banner, no graph mutation.
    pub fn is_abort(&self) -> bool {
        matches!(self, EngineError::Aborted)
    }

    /// User-visible banner text, or `None` for errors that must stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            EngineError::Aborted => None,
            EngineError::InvalidInput { message } => Some(message.clone()),
            // Provider error strings are surfaced verbatim
            EngineError::Aggregation { message } => Some(message.clone()),
            EngineError::UnexpectedStatus { status } => {
                Some(format!("The citation service returned status {}", status))
            }
            EngineError::Transport(_) => {
                Some("Could not reach the citation service. Please try again.".to_string())
            }
            EngineError::Serialization(_)
            | EngineError::Configuration { .. }
            | EngineError::Other(_) => {
                Some("Something went wrong while building the network.".to_string())
            }
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            EngineError::Transport(_)
                | EngineError::UnexpectedStatus { .. }
                | EngineError::Aggregation { .. }
                | EngineError::Serialization(_)
                | EngineError::Configuration { .. }
                | EngineError::Other(_)
        )
    }
}
