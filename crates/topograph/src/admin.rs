//! Administrative areas and their boundary accumulation.
//!
//! Every source feature contributes the lines of its outer ring to its own
//! area by union, and to its parent area by symmetric difference.  A border
//! shared by two sibling features is contributed to the parent twice and
//! cancels, leaving only the parent's external perimeter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use geo::Coord;
use rayon::prelude::*;

use crate::error::{Result, TopologyError};
use crate::ids::LineId;
use crate::ring::Rings;
use crate::topology::Topology;

/// Level given to lines that no area references as outer.
pub const DEFAULT_LEVEL: u8 = 8;

// ---------------------------------------------------------------------------
// Keys and records
// ---------------------------------------------------------------------------

/// Normalized identity of an area: its level plus its upper-cased raw name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdminKey {
    pub level: u8,
    pub name:  String,
}

impl AdminKey {
    pub fn new(level: u8, raw_name: &str) -> Self {
        Self { level, name: raw_name.trim().to_uppercase() }
    }
}

impl fmt::Display for AdminKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.name)
    }
}

/// An area as named by one source feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaSpec {
    pub key:  AdminKey,
    /// Display name, used when the area is first created.
    pub name: String,
}

impl AreaSpec {
    pub fn new(level: u8, raw_name: &str, display_name: impl Into<String>) -> Self {
        Self { key: AdminKey::new(level, raw_name), name: display_name.into() }
    }
}

/// One administrative area and its boundary lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminArea {
    pub name:  String,
    pub level: u8,
    pub outer: BTreeSet<LineId>,
    pub inner: BTreeSet<LineId>,
}

/// A line that could not be closed into a ring.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscardedLine {
    pub line:   LineId,
    pub points: usize,
    pub start:  Coord<f64>,
    pub end:    Coord<f64>,
}

/// Outcome of verifying one area.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaReport {
    pub key:       AdminKey,
    pub name:      String,
    pub level:     u8,
    pub polygons:  usize,
    pub holes:     usize,
    pub discarded: Vec<DiscardedLine>,
}

impl AreaReport {
    /// `true` if every outer line closed into a ring.
    #[inline] pub fn is_closed(&self) -> bool { self.discarded.is_empty() }
}

impl AdminArea {
    /// Add `lines` by plain union.
    pub fn merge(&mut self, lines: &BTreeSet<LineId>) {
        self.outer.extend(lines.iter().copied());
    }

    /// Add `lines` by symmetric difference: lines already present cancel.
    pub fn toggle(&mut self, lines: &BTreeSet<LineId>) {
        for &line in lines {
            if !self.outer.remove(&line) {
                self.outer.insert(line);
            }
        }
    }

    /// Close the outer lines into rings and move hole lines to `inner`.
    pub fn verify(&mut self, key: &AdminKey, topo: &Topology) -> AreaReport {
        let rings = Rings::find(topo, self.outer.iter().copied());

        let discarded: Vec<DiscardedLine> = rings.discarded_lines().iter()
            .map(|&line| {
                let (start, end) = topo.line_endpoints(line);
                DiscardedLine {
                    line,
                    points: topo.line_points(line).len(),
                    start:  topo.point_coord(start),
                    end:    topo.point_coord(end),
                }
            })
            .collect();

        if !discarded.is_empty() {
            tracing::warn!(area = %self.name, level = self.level, lines = discarded.len(), "area ring not closed");
            for d in &discarded {
                tracing::debug!(
                    line = %d.line,
                    points = d.points,
                    "line still open ({:.7}, {:.7}) -> ({:.7}, {:.7})",
                    d.start.x, d.start.y, d.end.x, d.end.y,
                );
            }
        }

        let inner: Vec<LineId> = rings.inner_lines().collect();
        for line in inner {
            self.outer.remove(&line);
            self.inner.insert(line);
        }

        AreaReport {
            key:      key.clone(),
            name:     self.name.clone(),
            level:    self.level,
            polygons: rings.polygons().len(),
            holes:    rings.polygons().iter().map(|(_, holes)| holes.len()).sum(),
            discarded,
        }
    }
}

// ---------------------------------------------------------------------------
// Boundary resolution
// ---------------------------------------------------------------------------

/// Resolve a ring of raw coordinates to the set of lines it runs along.
///
/// Coordinates with no registered point are skipped.  The point sequence is
/// closed back to its start when it does not end there, and repeated
/// consecutive points are dropped.  A point pair with no segment means the
/// ring was never ingested and is an error.
pub fn boundary_lines(topo: &Topology, ring: &[Coord<f64>]) -> Result<BTreeSet<LineId>> {
    let mut points: Vec<_> = ring.iter().filter_map(|&c| topo.lookup_point(c)).collect();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first); }
    }

    let mut lines = BTreeSet::new();
    for w in points.windows(2) {
        if w[0] == w[1] { continue; }
        let segment = topo.lookup_segment(w[0], w[1])
            .ok_or(TopologyError::MissingSegment(w[0], w[1]))?;
        lines.insert(topo.line_of(segment));
    }
    Ok(lines)
}

// ---------------------------------------------------------------------------
// Area collection
// ---------------------------------------------------------------------------

/// All administrative areas of one run, in key order.
#[derive(Clone, Debug, Default)]
pub struct AdminAreas {
    areas: BTreeMap<AdminKey, AdminArea>,
}

impl AdminAreas {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.areas.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.areas.is_empty() }

    pub fn get(&self, key: &AdminKey) -> Option<&AdminArea> { self.areas.get(key) }

    pub fn iter(&self) -> impl Iterator<Item = (&AdminKey, &AdminArea)> + '_ { self.areas.iter() }

    /// The area named by `spec`, created empty on first use.
    pub fn entry(&mut self, spec: &AreaSpec) -> &mut AdminArea {
        self.areas.entry(spec.key.clone()).or_insert_with(|| AdminArea {
            name:  spec.name.clone(),
            level: spec.key.level,
            ..AdminArea::default()
        })
    }

    /// Accumulate one feature's outer ring: union into `area`, symmetric
    /// difference into `parent`.  Returns the number of lines contributed.
    pub fn add_feature(
        &mut self,
        topo:   &Topology,
        ring:   &[Coord<f64>],
        area:   &AreaSpec,
        parent: Option<&AreaSpec>,
    ) -> Result<usize> {
        let lines = boundary_lines(topo, ring)?;

        if let Some(parent) = parent {
            self.entry(parent).toggle(&lines);
        }
        self.entry(area).merge(&lines);

        Ok(lines.len())
    }

    /// Verify every area in parallel, moving hole lines from outer to inner.
    /// Reports come back in key order.
    pub fn verify(&mut self, topo: &Topology) -> Vec<AreaReport> {
        let mut reports: Vec<AreaReport> = self.areas
            .par_iter_mut()
            .map(|(key, area)| area.verify(key, topo))
            .collect();
        reports.sort_by(|a, b| a.key.cmp(&b.key));

        let open = reports.iter().filter(|r| !r.is_closed()).count();
        tracing::info!(areas = reports.len(), open, "verified administrative areas");
        reports
    }

    /// Admin level of every line: the minimum level among the areas using it
    /// as outer, or `default` when none does.  Indexed by `LineId`.
    pub fn line_levels(&self, num_lines: usize, default: u8) -> Vec<u8> {
        let mut levels = vec![default; num_lines];
        let mut seen = vec![false; num_lines];
        for area in self.areas.values() {
            for line in &area.outer {
                let i = line.index();
                levels[i] = if seen[i] { levels[i].min(area.level) } else { area.level };
                seen[i] = true;
            }
        }
        levels
    }
}
