#![doc = "admintopo public API"]
mod common;
mod config;
mod geom;
mod io;
mod pipeline;
mod source;

#[doc(inline)]
pub use common::{normalize_name, prepare_output, ShapefileSummary};

#[doc(inline)]
pub use config::{Config, FieldSchema, Levels};

#[doc(inline)]
pub use geom::Reprojector;

#[doc(inline)]
pub use io::{osm::{write_osm, write_osm_file}, report::{write_report, write_report_file}, rows::{prepare_rows_dir, write_rows, RowIds}};

#[doc(inline)]
pub use pipeline::{build, build_from_paths, Build};

#[doc(inline)]
pub use source::{detect_schema, read_all, read_features, Classified, SourceFeature};

/// Re-export of the topology engine.
pub use topograph;

/// Read a shapefile and summarize its content.
pub fn inspect(path: &std::path::Path) -> anyhow::Result<ShapefileSummary> {
    let items = common::read_shapefile(path)?;
    Ok(ShapefileSummary::from_items(&items))
}
