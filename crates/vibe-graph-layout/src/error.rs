//! Error types for the layout engine.

use thiserror::Error;

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors that abort a layout operation before any engine state changes.
///
/// Numerical anomalies (simulation divergence, unresolved collisions) are
/// not represented here: they are non-fatal and reported alongside a
/// successful result instead (see [`crate::force::TickReport`] and
/// [`crate::collision::CollisionReport`]).
#[derive(Debug, Error)]
pub enum LayoutError {
    /// An edge endpoint is missing from the node set, a node id is
    /// duplicated, a coordinate is non-finite, or a width/height is
    /// non-positive.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The requested algorithm tag is not one of the four recognised
    /// values (`force`, `hierarchical`, `circular`, `grid`).
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}
