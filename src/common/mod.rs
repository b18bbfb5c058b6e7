mod data;
mod fs;
mod names;
mod polygon;

pub(crate) use data::{get_character_field, read_shapefile, shape_kind};
pub use data::ShapefileSummary;
pub use fs::{ensure_dir_exists, prepare_output};
pub use names::normalize_name;
pub(crate) use polygon::first_outer_ring;
