//! Error types shared across the engine.
//!
//! Only fetching the complaint list is fatal to a run. Every other error
//! is attached to a single path, logged, and collected as a diagnostic
//! while the rest of the batch carries on.

/// Errors produced while fetching, decoding, or resolving danger paths.
#[derive(Debug, thiserror::Error)]
pub enum DangerMapError {
    /// The routing service could not produce coordinates for a path.
    #[error("routing failed for path {path_id}: {message}")]
    RoutingFailure {
        /// Path that could not be routed.
        path_id: String,
        /// Message reported by the routing service, or the transport error.
        message: String,
    },

    /// A path's stored coordinate sequence could not be parsed.
    #[error("malformed coordinates for path {path_id}: {reason}")]
    MalformedCoordinates {
        /// Path whose coordinates were rejected.
        path_id: String,
        /// What was wrong with them.
        reason: String,
    },

    /// A complaint row could not be attributed to any path.
    #[error("malformed complaint record: {reason}")]
    MalformedRecord {
        /// What was wrong with the row.
        reason: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DangerMapError {
    /// Id of the path this error is attached to, if any.
    pub fn path_id(&self) -> Option<&str> {
        match self {
            Self::RoutingFailure { path_id, .. } | Self::MalformedCoordinates { path_id, .. } => {
                Some(path_id)
            }
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DangerMapError>;
