//! Error types for the simulator
//!
//! Only structural problems are errors. Numeric disagreements between values
//! that can be derived independently are reported as [`crate::Warning`]s and
//! never abort processing.

use alloy_primitives::B256;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Simulator errors
#[derive(Error, Debug)]
pub enum Error {
    /// A handler required a paired event later in the transaction and none was found.
    ///
    /// Aborts the current transaction. Store mutations already applied are kept,
    /// so state after this error is suspect.
    #[error("Missing {expected} after {event} at log {log_index} in tx {tx_hash}")]
    MissingPairedEvent {
        /// Event that triggered the search
        event: &'static str,
        /// Event that was expected ahead of it
        expected: &'static str,
        /// Position of the triggering event
        log_index: u64,
        /// Transaction being processed
        tx_hash: B256,
    },

    /// Event record is missing an argument or carries one of the wrong type
    #[error("Malformed {event} at log {log_index}: {reason}")]
    MalformedEvent {
        /// Event name
        event: String,
        /// Position of the record
        log_index: u64,
        /// What was wrong
        reason: String,
    },

    /// Log positions in a transaction are not strictly ascending
    #[error("Events out of order in tx {tx_hash}: log {previous} followed by {current}")]
    UnorderedEvents {
        /// Transaction being processed
        tx_hash: B256,
        /// Earlier position
        previous: u64,
        /// Offending position
        current: u64,
    },

    /// An immutable entity was written twice under the same key
    #[error("Duplicate {kind} entity: {id}")]
    DuplicateEntity {
        /// Entity kind
        kind: &'static str,
        /// Rendered key
        id: String,
    },

    /// The injected chain reader had no value for a required read
    #[error("Authoritative read unavailable: {0}")]
    MissingAuthoritativeRead(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a structural violation of the event stream
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::MissingPairedEvent { .. }
                | Error::MalformedEvent { .. }
                | Error::UnorderedEvents { .. }
        )
    }
}
