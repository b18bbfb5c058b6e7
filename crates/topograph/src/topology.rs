use ahash::AHashMap;
use geo::Coord;
use smallvec::SmallVec;

use crate::error::Result;
use crate::ids::{LineId, PointId, SegmentId};
use crate::line::{contract, LineTable};
use crate::point::PointIndex;
use crate::segment::SegmentTable;

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Mutable ingestion state: registers points and segments from raw rings.
///
/// Consumed by [`TopologyBuilder::build_lines`], which freezes the graph into
/// a [`Topology`].  No point or segment can be created after that.
#[derive(Clone, Debug)]
pub struct TopologyBuilder {
    points:   PointIndex,
    segments: SegmentTable,
}

impl TopologyBuilder {
    /// Create an empty builder snapping to `tolerance` degrees, pre-sized for
    /// `cache_size` points.
    pub fn new(tolerance: f64, cache_size: usize) -> Result<Self> {
        Ok(Self {
            points:   PointIndex::new(tolerance, cache_size)?,
            segments: SegmentTable::with_capacity(cache_size),
        })
    }

    #[inline] pub fn points(&self) -> &PointIndex { &self.points }

    #[inline] pub fn segments(&self) -> &SegmentTable { &self.segments }

    /// Register both endpoints, then the segment between them.  `None` when
    /// both coordinates snap to the same point.
    pub fn make_segment(&mut self, from: Coord<f64>, to: Coord<f64>) -> Option<SegmentId> {
        let a = self.points.register(from);
        let b = self.points.register(to);
        self.segments.register(a, b)
    }

    /// Register every segment of `ring`, closing it back to its first
    /// coordinate when the input is left open.  Returns the number of
    /// non-degenerate segments walked.
    pub fn add_ring(&mut self, ring: &[Coord<f64>]) -> usize {
        let (Some(&first), Some(&last)) = (ring.first(), ring.last()) else { return 0 };
        let closing = (first != last).then_some(first);

        ring.iter()
            .copied()
            .chain(closing)
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| self.make_segment(w[0], w[1]).is_some())
            .count()
    }

    /// Contract segment chains into lines and freeze the topology.
    pub fn build_lines(self) -> Topology {
        let LineTable { offsets, vertices, segment_line } = contract(&self.points, &self.segments);

        let mut endpoint_lines: AHashMap<PointId, SmallVec<[LineId; 4]>> = AHashMap::new();
        for line in 0..offsets.len() - 1 {
            let first = vertices[offsets[line] as usize];
            let last = vertices[offsets[line + 1] as usize - 1];
            endpoint_lines.entry(first).or_default().push(LineId(line as u32));
            if last != first {
                endpoint_lines.entry(last).or_default().push(LineId(line as u32));
            }
        }

        tracing::info!(
            points = self.points.len(),
            segments = self.segments.len(),
            lines = offsets.len() - 1,
            "simplified boundary lines"
        );

        Topology {
            points: self.points,
            segments: self.segments,
            line_offsets: offsets,
            line_vertices: vertices,
            segment_line,
            endpoint_lines,
        }
    }
}

// ---------------------------------------------------------------------------
// Frozen topology
// ---------------------------------------------------------------------------

/// Read-only point/segment/line tables produced by one contraction pass.
///
/// Shared by reference between the aggregation pass and the (parallel)
/// verification workers.
#[derive(Clone, Debug)]
pub struct Topology {
    points:   PointIndex,
    segments: SegmentTable,

    /// CSR offsets into `line_vertices`; length = `num_lines + 1`.
    line_offsets:  Vec<u32>,
    line_vertices: Vec<PointId>,

    /// Owning line of each segment.
    segment_line: Vec<LineId>,

    /// Lines starting or ending at each line endpoint.
    endpoint_lines: AHashMap<PointId, SmallVec<[LineId; 4]>>,
}

impl Topology {
    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    #[inline] pub fn num_points(&self)   -> usize { self.points.len() }
    #[inline] pub fn num_segments(&self) -> usize { self.segments.len() }
    #[inline] pub fn num_lines(&self)    -> usize { self.line_offsets.len() - 1 }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Point in `coord`'s snapping cell, if ingestion registered one.
    #[inline]
    pub fn lookup_point(&self, coord: Coord<f64>) -> Option<PointId> { self.points.lookup(coord) }

    /// Segment `{a, b}`, if ingestion registered it.
    #[inline]
    pub fn lookup_segment(&self, a: PointId, b: PointId) -> Option<SegmentId> {
        self.segments.lookup(a, b)
    }

    /// The line that absorbed `segment`.
    #[inline]
    pub fn line_of(&self, segment: SegmentId) -> LineId { self.segment_line[segment.index()] }

    #[inline]
    pub fn point_coord(&self, point: PointId) -> Coord<f64> { self.points.coord(point) }

    /// Ordered points of `line`.
    pub fn line_points(&self, line: LineId) -> &[PointId] {
        let i = line.index();
        &self.line_vertices[self.line_offsets[i] as usize..self.line_offsets[i + 1] as usize]
    }

    /// First and last point of `line` (equal for a closed line).
    pub fn line_endpoints(&self, line: LineId) -> (PointId, PointId) {
        let points = self.line_points(line);
        (points[0], points[points.len() - 1])
    }

    /// Ordered coordinates of `line`.
    pub fn line_coords(&self, line: LineId) -> Vec<Coord<f64>> {
        self.line_points(line).iter().map(|&p| self.points.coord(p)).collect()
    }

    /// Lines having `point` as an endpoint.  Empty for points interior to a
    /// line.
    pub fn lines_at(&self, point: PointId) -> &[LineId] {
        self.endpoint_lines.get(&point).map_or(&[], |lines| lines.as_slice())
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    /// All points with their canonical coordinate.
    pub fn points(&self) -> impl Iterator<Item = (PointId, Coord<f64>)> + '_ { self.points.iter() }

    /// All lines with their ordered point ids.
    pub fn lines(&self) -> impl Iterator<Item = (LineId, &[PointId])> + '_ {
        (0..self.num_lines()).map(move |i| (LineId(i as u32), self.line_points(LineId(i as u32))))
    }
}
