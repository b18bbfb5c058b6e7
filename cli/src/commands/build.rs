use anyhow::{Context, Result};
use admintopo::{
    build_from_paths, prepare_output, prepare_rows_dir, write_osm_file, write_report_file, write_rows, Config,
};

/// Configuration file values, then command-line overrides.
fn load_config(args: &crate::cli::BuildArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(tolerance) = args.tolerance { config.tolerance = tolerance; }
    if let Some(threads) = args.threads { config.threads = threads; }
    if let Some(proj) = &args.source_proj { config.source_proj = Some(proj.clone()); }
    config.validate()?;
    Ok(config)
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::BuildArgs) -> Result<()> {
    let config = load_config(args)?;

    // Refuse to clobber anything before the (long) build starts.
    prepare_output(&args.output, args.force)?;
    if let Some(report) = &args.report {
        prepare_output(report, args.force)?;
    }
    if let Some(dir) = &args.rows {
        prepare_rows_dir(dir, args.force)?;
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .context("[build] Failed to initialize rayon thread pool")?;

    tracing::info!(inputs = args.inputs.len(), tolerance = config.tolerance, "building boundaries");
    let build = build_from_paths(&args.inputs, &config)?;

    write_osm_file(&args.output, &build)?;
    if let Some(dir) = &args.rows {
        write_rows(dir, &build, args.first_id)?;
    }
    if let Some(report) = &args.report {
        write_report_file(report, &build.reports)?;
    }

    let open: Vec<String> = build.open_areas().map(|report| report.name.clone()).collect();
    if !open.is_empty() {
        tracing::warn!(count = open.len(), areas = ?open, "some areas are not closed, see the log above");
    }
    Ok(())
}
