//! Error types for rail-track.

use thiserror::Error;

/// Topology misconfiguration detected at layout build time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("track {0:?} has no blocks")]
    EmptyTrack(String),

    #[error("duplicate track label {0:?}")]
    DuplicateTrack(String),

    #[error("generated block name {0:?} collides with an existing block")]
    DuplicateBlock(String),
}
