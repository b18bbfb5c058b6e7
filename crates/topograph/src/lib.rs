pub mod admin;
pub mod error;
pub mod ids;
mod line;
pub mod point;
pub mod ring;
pub mod segment;
pub mod topology;

pub use admin::{boundary_lines, AdminArea, AdminAreas, AdminKey, AreaReport, AreaSpec, DiscardedLine, DEFAULT_LEVEL};
pub use error::{Result, TopologyError};
pub use ids::{LineId, PointId, RingId, SegmentId};
pub use point::PointIndex;
pub use ring::Rings;
pub use segment::SegmentTable;
pub use topology::{Topology, TopologyBuilder};
