//! Error types for topology construction.

use crate::ids::PointId;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised by the topology engine.
///
/// Unclosed rings are not errors; they are reported through `Rings` and
/// `AreaReport`.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The snapping tolerance must be a positive, finite number of degrees.
    #[error("invalid snapping tolerance: {0}")]
    InvalidTolerance(f64),

    /// The aggregation pass walked a point pair that ingestion never
    /// registered.  Ingestion and aggregation disagree on the input.
    #[error("no segment between {0} and {1}: aggregation walked geometry that was never ingested")]
    MissingSegment(PointId, PointId),
}
