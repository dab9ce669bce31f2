//! Error types for placement operations
//!
//! Every failure is a typed rejection. Operations that fail leave the engine
//! state untouched.

use crate::marker::MarkerId;

/// Failures reported by the key-value storage port
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Error taxonomy of the placement engine
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// Renderer exposed neither zones nor a viewport
    #[error("document exposes no zone elements and no viewport transform")]
    InvalidDocument,

    /// Viewport matrix cannot be inverted
    #[error("viewport transform is not invertible (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },

    /// Initial placement outside every zone
    #[error("no zone contains point ({x}, {y})")]
    InvalidZone { x: f64, y: f64 },

    /// Position contains NaN or infinity
    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition { x: f64, y: f64 },

    #[error("marker {0} not found")]
    MarkerNotFound(MarkerId),

    /// Every marker id has been assigned
    #[error("marker id space exhausted")]
    IdSpaceExhausted,

    /// A drag session is already in flight
    #[error("a drag session is already active")]
    SessionBusy,

    /// Persisted layout could not be decoded
    #[error("persisted layout under key {key:?} is corrupt: {reason}")]
    StorageCorrupt { key: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for placement operations
pub type PlacementResult<T> = Result<T, PlacementError>;
