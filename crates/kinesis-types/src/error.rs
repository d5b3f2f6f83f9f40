use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type shared by every kinesis crate.
///
/// None of these conditions is fatal to the frame pipeline: callers report
/// them and keep streaming.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KinesisError {
    /// Empty sequence, missing reference joint, unusable weight vector, …
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Template or label absent on lookup or removal.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A template source or sink could not be reached.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A match was requested while another one is still running.
    #[error("Concurrent operation rejected: {0}")]
    ConcurrentOperationRejected(String),
}
