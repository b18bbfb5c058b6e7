//! JSON diagnostic report of area verification.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use topograph::AreaReport;

#[derive(Debug, Serialize)]
pub struct AreaEntry<'a> {
    pub key:       String,
    pub name:      &'a str,
    pub level:     u8,
    pub closed:    bool,
    pub polygons:  usize,
    pub holes:     usize,
    pub discarded: Vec<DiscardedEntry>,
}

#[derive(Debug, Serialize)]
pub struct DiscardedEntry {
    pub line:   u32,
    pub points: usize,
    /// `[lon, lat]` of the first point.
    pub start:  [f64; 2],
    pub end:    [f64; 2],
}

impl<'a> From<&'a AreaReport> for AreaEntry<'a> {
    fn from(report: &'a AreaReport) -> Self {
        Self {
            key:       report.key.to_string(),
            name:      &report.name,
            level:     report.level,
            closed:    report.is_closed(),
            polygons:  report.polygons,
            holes:     report.holes,
            discarded: report.discarded.iter()
                .map(|d| DiscardedEntry {
                    line:   d.line.0,
                    points: d.points,
                    start:  [d.start.x, d.start.y],
                    end:    [d.end.x, d.end.y],
                })
                .collect(),
        }
    }
}

/// Write the reports as a pretty-printed JSON array.
pub fn write_report<W: Write>(writer: W, reports: &[AreaReport]) -> Result<()> {
    let entries: Vec<AreaEntry> = reports.iter().map(AreaEntry::from).collect();
    serde_json::to_writer_pretty(writer, &entries)
        .context("[io::report] Failed to serialize report")
}

pub fn write_report_file(path: &Path, reports: &[AreaReport]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::report] Failed to create report file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, reports)?;
    writer.flush()
        .with_context(|| format!("[io::report] Failed to write {}", path.display()))
}
