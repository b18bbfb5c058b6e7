//! Output formats of a build.
//!
//! - `osm` - OSM XML with nodes, ways and boundary relations
//! - `rows` - tab-separated bulk-load rows for a PostGIS database
//! - `report` - JSON report of area verification

pub mod osm;
pub mod report;
pub mod rows;
