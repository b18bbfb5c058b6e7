//! The end-to-end build: geometry ingestion, line simplification, area
//! aggregation and verification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use topograph::{AdminAreas, AreaReport, Topology, TopologyBuilder};

use crate::config::Config;
use crate::source::{read_all, SourceFeature};

/// Everything a build produces, ready for export.
#[derive(Debug)]
pub struct Build {
    pub topology: Topology,
    pub areas:    AdminAreas,
    pub reports:  Vec<AreaReport>,
    /// Admin level of each line, indexed by `LineId`.
    pub levels:   Vec<u8>,
}

impl Build {
    /// Areas whose outer lines did not all close into rings.
    pub fn open_areas(&self) -> impl Iterator<Item = &AreaReport> + '_ {
        self.reports.iter().filter(|report| !report.is_closed())
    }
}

/// Run the whole build over features already read from their sources.
pub fn build(features: &[SourceFeature], config: &Config) -> Result<Build> {
    // Pass 1: every ring's segments, from all features, before any line exists.
    let mut builder = TopologyBuilder::new(config.tolerance, config.cache_size)?;
    for feature in features {
        let segments = builder.add_ring(&feature.ring);
        tracing::trace!(feature = %feature.origin(), segments, "ingested ring");
    }
    let topology = builder.build_lines();

    // Pass 2: attach the lines of each feature to its areas.
    let mut areas = AdminAreas::new();
    let mut skipped = 0;
    for feature in features {
        let Some(classified) = feature.classify(&config.levels) else {
            tracing::warn!(feature = %feature.origin(), "feature has neither a district nor a region name, skipped");
            skipped += 1;
            continue;
        };
        let lines = areas.add_feature(&topology, &feature.ring, &classified.area, classified.parent.as_ref())
            .with_context(|| format!("[pipeline] Failed to resolve boundary of feature {} ({})",
                feature.origin(), classified.area.key))?;
        tracing::debug!(feature = %feature.origin(), area = %classified.area.key, lines, "assigned lines");
    }
    tracing::info!(areas = areas.len(), skipped, "built administrative areas");

    let reports = areas.verify(&topology);
    let levels = areas.line_levels(topology.num_lines(), config.levels.default);

    Ok(Build { topology, areas, reports, levels })
}

/// Read every shapefile in order, then build over all their features.
pub fn build_from_paths(paths: &[PathBuf], config: &Config) -> Result<Build> {
    let features = read_all(paths, config)?;
    build(&features, config)
}
