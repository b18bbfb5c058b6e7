//! Bulk-load rows for a PostGIS database.
//!
//! One tab-separated file per table, in PostgreSQL `COPY` text format (no
//! header).  Nodes, ways and relations draw their ids from a single sequence:
//! points first, then lines, then areas.
//!
//! | file                   | columns                                                   |
//! |------------------------|-----------------------------------------------------------|
//! | `nodes.tsv`            | id, geom (EWKT, SRID 4326)                                |
//! | `ways.tsv`             | id                                                        |
//! | `way_nodes.tsv`        | way id, node id, sequence                                 |
//! | `way_tags.tsv`         | way id, key, value                                        |
//! | `relations.tsv`        | id                                                        |
//! | `relation_members.tsv` | relation id, member id, member type, role, sequence       |
//! | `relation_tags.tsv`    | relation id, key, value                                   |

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use topograph::{LineId, PointId};

use crate::common::ensure_dir_exists;
use crate::pipeline::Build;

pub const TABLES: [&str; 7] = [
    "nodes", "ways", "way_nodes", "way_tags", "relations", "relation_members", "relation_tags",
];

/// The unified id sequence of one export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowIds {
    first:  i64,
    points: i64,
    lines:  i64,
}

impl RowIds {
    pub fn new(build: &Build, first: i64) -> Self {
        Self {
            first,
            points: build.topology.num_points() as i64,
            lines:  build.topology.num_lines() as i64,
        }
    }

    #[inline] pub fn node(&self, point: PointId) -> i64 { self.first + point.index() as i64 }

    #[inline] pub fn way(&self, line: LineId) -> i64 { self.first + self.points + line.index() as i64 }

    /// Id of the `n`-th area in key order.
    #[inline] pub fn relation(&self, n: usize) -> i64 { self.first + self.points + self.lines + n as i64 }
}

/// Escape a text value for `COPY` text format.
fn copy_text(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '\t', '\n', '\r']) {
        return Cow::Borrowed(value)
    }
    Cow::Owned(value.replace('\\', r"\\").replace('\t', r"\t").replace('\n', r"\n").replace('\r', r"\r"))
}

fn create(dir: &Path, table: &str) -> Result<BufWriter<File>> {
    let path = dir.join(format!("{table}.tsv"));
    let file = File::create(&path)
        .with_context(|| format!("[io::rows] Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Error if `dir` already holds one of the table files, unless `force` is
/// set.  Creates the directory when it is missing.
pub fn prepare_rows_dir(dir: &Path, force: bool) -> Result<()> {
    ensure_dir_exists(dir)?;
    if force {
        return Ok(())
    }
    if let Some(existing) = TABLES.iter().map(|table| dir.join(format!("{table}.tsv"))).find(|path| path.exists()) {
        anyhow::bail!("[io::rows] Output file already exists (use --force to overwrite): {}", existing.display());
    }
    Ok(())
}

/// Write every table of a build into `dir`, ids starting at `first_id`.
pub fn write_rows(dir: &Path, build: &Build, first_id: i64) -> Result<RowIds> {
    ensure_dir_exists(dir)?;
    let ids = RowIds::new(build, first_id);
    let topo = &build.topology;

    let mut nodes = create(dir, "nodes")?;
    for (point, coord) in topo.points() {
        writeln!(nodes, "{}\tSRID=4326;POINT({:.7} {:.7})", ids.node(point), coord.x, coord.y)?;
    }
    nodes.flush()?;

    let mut ways = create(dir, "ways")?;
    let mut way_nodes = create(dir, "way_nodes")?;
    let mut way_tags = create(dir, "way_tags")?;
    for (line, points) in topo.lines() {
        let way = ids.way(line);
        writeln!(ways, "{way}")?;
        for (seq, &point) in points.iter().enumerate() {
            writeln!(way_nodes, "{way}\t{}\t{seq}", ids.node(point))?;
        }
        writeln!(way_tags, "{way}\tboundary\tadministrative")?;
        writeln!(way_tags, "{way}\tadmin_level\t{}", build.levels[line.index()])?;
    }
    ways.flush()?;
    way_nodes.flush()?;
    way_tags.flush()?;

    let mut relations = create(dir, "relations")?;
    let mut members = create(dir, "relation_members")?;
    let mut tags = create(dir, "relation_tags")?;
    for (n, (_, area)) in build.areas.iter().enumerate() {
        let relation = ids.relation(n);
        writeln!(relations, "{relation}")?;

        let roles = area.outer.iter().map(|&l| (l, "outer")).chain(area.inner.iter().map(|&l| (l, "inner")));
        for (seq, (line, role)) in roles.enumerate() {
            writeln!(members, "{relation}\t{}\tW\t{role}\t{seq}", ids.way(line))?;
        }

        writeln!(tags, "{relation}\ttype\tboundary")?;
        writeln!(tags, "{relation}\tboundary\tadministrative")?;
        writeln!(tags, "{relation}\tadmin_level\t{}", area.level)?;
        writeln!(tags, "{relation}\tname\t{}", copy_text(&area.name))?;
    }
    relations.flush()?;
    members.flush()?;
    tags.flush()?;

    tracing::info!(dir = %dir.display(), first = first_id, last = ids.relation(build.areas.len()) - 1, "wrote bulk-load rows");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    use crate::config::Config;
    use crate::pipeline::build;
    use crate::source::SourceFeature;

    fn lone_district() -> Build {
        let feature = SourceFeature {
            source:   std::sync::Arc::from(std::path::Path::new("uganda.shp")),
            index:    0,
            ring:     vec![
                Coord { x: 32.0, y: 2.0 },
                Coord { x: 33.0, y: 2.0 },
                Coord { x: 33.0, y: 3.0 },
                Coord { x: 32.0, y: 3.0 },
            ],
            district: Some("GULU\tNORTH".into()),
            region:   None,
        };
        build(&[feature], &Config::default()).unwrap()
    }

    fn read(dir: &Path, table: &str) -> Vec<String> {
        std::fs::read_to_string(dir.join(format!("{table}.tsv"))).unwrap()
            .lines().map(String::from).collect()
    }

    #[test]
    fn ids_come_from_one_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let build = lone_district();
        let ids = write_rows(dir.path(), &build, 100).unwrap();

        // 4 points, 1 closed line, 1 area.
        assert_eq!(ids.node(PointId(0)), 100);
        assert_eq!(ids.way(LineId(0)), 104);
        assert_eq!(ids.relation(0), 105);

        for table in TABLES {
            assert!(dir.path().join(format!("{table}.tsv")).is_file(), "{table}");
        }

        let nodes = read(dir.path(), "nodes");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0], "100\tSRID=4326;POINT(32.0000000 2.0000000)");

        assert_eq!(read(dir.path(), "ways"), ["104"]);
        // The closed line repeats its first node.
        let way_nodes = read(dir.path(), "way_nodes");
        assert_eq!(way_nodes.len(), 5);
        assert_eq!(way_nodes[0], "104\t100\t0");
        assert_eq!(way_nodes[4], "104\t100\t4");

        assert_eq!(read(dir.path(), "relation_members"), ["105\t104\tW\touter\t0"]);
    }

    #[test]
    fn tags_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        write_rows(dir.path(), &lone_district(), 1).unwrap();

        let tags = read(dir.path(), "relation_tags");
        assert_eq!(tags.len(), 4);
        assert_eq!(tags[2], "6\tadmin_level\t7");
        // The tab inside the name is escaped, the column separators are not.
        assert_eq!(tags[3], "6\tname\tGulu\\tnorth");

        let way_tags = read(dir.path(), "way_tags");
        assert_eq!(way_tags, ["5\tboundary\tadministrative", "5\tadmin_level\t7"]);
    }

    #[test]
    fn existing_tables_need_force() {
        let dir = tempfile::tempdir().unwrap();
        let rows = dir.path().join("rows");
        prepare_rows_dir(&rows, false).unwrap();
        assert!(rows.is_dir());

        write_rows(&rows, &lone_district(), 1).unwrap();
        let err = prepare_rows_dir(&rows, false).unwrap_err();
        assert!(err.to_string().contains("--force"), "{err}");
        prepare_rows_dir(&rows, true).unwrap();

        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(prepare_rows_dir(&file, true).is_err());
    }
}
