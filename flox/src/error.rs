//! Error types for the flow model.

use crate::model::{FlowKey, NodeKey};
use thiserror::Error;

/// Errors surfaced by checked model operations and snapshot ingestion.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Restored lock data does not match the current flows.
    #[error("flows and locks have different lengths: {expected} flows, {got} locks")]
    LockCountMismatch { expected: usize, got: usize },

    #[error("unknown node {0:?}")]
    UnknownNode(NodeKey),

    #[error("unknown flow {0:?}")]
    UnknownFlow(FlowKey),

    /// Metrics were requested before the cached aggregates were recomputed.
    #[error("cached aggregates are stale; recompute before reading metrics")]
    StaleAggregates,

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("{what} exceeds limit of {limit}")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("invalid {what}: {value}")]
    InvalidCoordinate { what: &'static str, value: f64 },

    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Stable short code for binding layers.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::LockCountMismatch { .. } => "lock_count_mismatch",
            ModelError::UnknownNode(_) | ModelError::UnknownFlow(_) => "invalid_id",
            ModelError::StaleAggregates => "stale_aggregates",
            ModelError::InvalidSnapshot(_) => "invalid_snapshot",
            ModelError::LimitExceeded { .. } => "limit_exceeded",
            ModelError::InvalidCoordinate { .. } => "invalid_coordinate",
            ModelError::Json(_) => "json_parse",
        }
    }

    pub(crate) fn invalid_coordinate(what: &'static str, value: f64) -> Self {
        ModelError::InvalidCoordinate { what, value }
    }
}
