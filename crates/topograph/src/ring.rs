//! Closed-ring reconstruction from an arbitrary set of lines.
//!
//! Lines are chained end to end through their shared endpoints.  A walk that
//! returns to its starting point becomes a ring; a walk that runs out of
//! lines, or reaches a point offering more than one continuation, is
//! discarded as a whole.  Closed rings are then nested by containment depth:
//! even depth is an outer boundary, odd depth a hole of its immediate
//! container.

use std::collections::BTreeSet;

use ahash::AHashMap;
use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use smallvec::SmallVec;

use crate::ids::{LineId, PointId, RingId};
use crate::topology::Topology;

/// Rings found in one set of lines.
#[derive(Clone, Debug, Default)]
pub struct Rings {
    rings:     Vec<Vec<LineId>>,
    depth:     Vec<u32>,
    polygons:  Vec<(RingId, Vec<RingId>)>,
    discarded: BTreeSet<LineId>,
}

/// How a walk ended.
enum WalkEnd {
    Closed,
    Open,
    Branching(PointId),
}

/// Geometry of a closed ring, used for containment tests.
struct RingShape {
    polygon: Polygon<f64>,
    bounds:  Option<Rect<f64>>,
}

impl RingShape {
    fn new(coords: Vec<Coord<f64>>) -> Self {
        let polygon = Polygon::new(LineString::from(coords), vec![]);
        let bounds = polygon.bounding_rect();
        Self { polygon, bounds }
    }

    /// `true` if `other` lies inside this ring.  The first vertex of `other`
    /// not touching this ring's boundary decides.
    fn contains(&self, other: &RingShape) -> bool {
        if let (Some(a), Some(b)) = (self.bounds, other.bounds) {
            if b.min().x < a.min().x || b.min().y < a.min().y
                || b.max().x > a.max().x || b.max().y > a.max().y
            {
                return false;
            }
        }
        for coord in other.polygon.exterior().coords() {
            match self.polygon.coordinate_position(coord) {
                CoordPos::Inside => return true,
                CoordPos::Outside => return false,
                CoordPos::OnBoundary => continue,
            }
        }
        false
    }
}

impl Rings {
    /// Find every closed ring formed by `lines`.
    pub fn find(topo: &Topology, lines: impl IntoIterator<Item = LineId>) -> Self {
        let lines: Vec<LineId> = lines.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

        let mut adjacency: AHashMap<PointId, SmallVec<[usize; 4]>> = AHashMap::new();
        for (i, &line) in lines.iter().enumerate() {
            let (first, last) = topo.line_endpoints(line);
            adjacency.entry(first).or_default().push(i);
            if last != first {
                adjacency.entry(last).or_default().push(i);
            }
        }

        let mut visited = vec![false; lines.len()];
        let mut result = Rings::default();
        let mut shapes = Vec::new();

        for seed in 0..lines.len() {
            if visited[seed] { continue; }
            visited[seed] = true;

            let mut walk = vec![lines[seed]];
            let mut coords = topo.line_coords(lines[seed]);
            let (start, mut current) = topo.line_endpoints(lines[seed]);

            let end = loop {
                if current == start { break WalkEnd::Closed; }

                let mut candidates = adjacency.get(&current)
                    .into_iter()
                    .flatten()
                    .copied()
                    .filter(|&i| !visited[i]);
                let Some(next) = candidates.next() else { break WalkEnd::Open };
                if candidates.next().is_some() { break WalkEnd::Branching(current); }

                visited[next] = true;
                let line = lines[next];
                let mut points = topo.line_coords(line);
                let (first, last) = topo.line_endpoints(line);
                if first != current { points.reverse(); }
                coords.extend(points.into_iter().skip(1));
                walk.push(line);
                current = if first == current { last } else { first };
            };

            match end {
                WalkEnd::Closed => {
                    result.rings.push(walk);
                    shapes.push(RingShape::new(coords));
                }
                WalkEnd::Open => {
                    tracing::debug!(lines = walk.len(), "open chain discarded");
                    result.discarded.extend(walk);
                }
                WalkEnd::Branching(point) => {
                    tracing::debug!(%point, lines = walk.len(), "branching walk discarded");
                    result.discarded.extend(walk);
                }
            }
        }

        result.nest(&shapes);
        result
    }

    /// Classify rings by containment depth and pair holes with their outer
    /// ring.
    fn nest(&mut self, shapes: &[RingShape]) {
        let n = shapes.len();
        let containers: Vec<Vec<usize>> = (0..n)
            .map(|x| (0..n).filter(|&y| y != x && shapes[y].contains(&shapes[x])).collect())
            .collect();

        self.depth = containers.iter().map(|c| c.len() as u32).collect();

        let mut holes: Vec<Vec<RingId>> = vec![Vec::new(); n];
        for x in 0..n {
            if self.depth[x] % 2 == 0 { continue; }
            let parent = containers[x].iter()
                .copied()
                .find(|&y| self.depth[y] + 1 == self.depth[x]);
            if let Some(parent) = parent {
                holes[parent].push(RingId(x as u32));
            }
        }

        self.polygons = (0..n)
            .filter(|&x| self.depth[x] % 2 == 0)
            .map(|x| (RingId(x as u32), std::mem::take(&mut holes[x])))
            .collect();
    }

    // -----------------------------------------------------------------------
    // Results
    // -----------------------------------------------------------------------

    /// Lines that could not be closed into any ring.
    #[inline]
    pub fn discarded_lines(&self) -> &BTreeSet<LineId> { &self.discarded }

    /// One `(outer, holes)` pair per outer ring.
    #[inline]
    pub fn polygons(&self) -> &[(RingId, Vec<RingId>)] { &self.polygons }

    /// Lines of `ring` in walk order.
    #[inline]
    pub fn ring_lines(&self, ring: RingId) -> &[LineId] { &self.rings[ring.index()] }

    /// Number of rings containing `ring`.
    #[inline]
    pub fn depth(&self, ring: RingId) -> u32 { self.depth[ring.index()] }

    #[inline] pub fn num_rings(&self) -> usize { self.rings.len() }

    /// Lines of every hole, across all polygons.
    pub fn inner_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.polygons.iter()
            .flat_map(|(_, holes)| holes.iter())
            .flat_map(|&hole| self.ring_lines(hole).iter().copied())
    }
}
