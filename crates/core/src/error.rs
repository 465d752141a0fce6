//! Error types for the chatsieve domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all chatsieve operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Classification errors ---
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    // --- Ingest errors ---
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures while classifying a single event.
///
/// These never stop the processing loop: the dispatcher logs them and
/// moves on to the next queued event.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid filter settings: {0}")]
    InvalidSettings(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Source not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("Source connection lost: {0}")]
    ConnectionLost(String),
}
