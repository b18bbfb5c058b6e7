use std::path::PathBuf;

/// Administrative boundary topology builder
#[derive(clap::Parser, Debug)]
#[command(name = "admintopo", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build shared-border boundaries from polygon shapefiles and write OSM XML
    Build(BuildArgs),

    /// Print the record count, geometry mix and attribute columns of a shapefile
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Input polygon shapefiles, read in order
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output OSM XML file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Snapping tolerance in degrees (overrides the configuration)
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// PROJ.4 definition of the input coordinates (overrides the configuration)
    #[arg(long)]
    pub source_proj: Option<String>,

    /// Worker threads for area verification, 0 for one per core (overrides the configuration)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also write bulk-load rows into this directory
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub rows: Option<PathBuf>,

    /// First id of the bulk-load id sequence
    #[arg(long, default_value_t = 1, requires = "rows")]
    pub first_id: i64,

    /// Also write a JSON verification report
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(short, long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Shapefiles to inspect
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,
}
