//! Chain contraction: merges runs of degree-2 segments into lines.
//!
//! A point's degree is the number of distinct segments incident on it.
//! Points of degree other than 2 are junctions (three or more boundaries
//! meeting, or a dangling end).  Every line runs from a junction to the next
//! junction; components without any junction (an island drawn by a single
//! polygon) become one closed line starting at their lowest segment.

use crate::ids::{next_id, LineId, PointId, SegmentId};
use crate::point::PointIndex;
use crate::segment::SegmentTable;

/// Flattened output of one contraction pass.
#[derive(Debug, Default)]
pub(crate) struct LineTable {
    /// CSR offsets into `vertices`; length = `num_lines + 1`.
    pub(crate) offsets:      Vec<u32>,
    /// Point sequences of all lines, concatenated.
    pub(crate) vertices:     Vec<PointId>,
    /// Owning line of every segment, indexed by `SegmentId`.
    pub(crate) segment_line: Vec<LineId>,
}

/// Point → incident segments, in compressed sparse row format.
struct Incidence {
    offsets:  Vec<u32>,
    segments: Vec<SegmentId>,
}

impl Incidence {
    fn new(num_points: usize, table: &SegmentTable) -> Self {
        let mut degree = vec![0u32; num_points];
        for (_, (a, b)) in table.iter() {
            degree[a.index()] += 1;
            degree[b.index()] += 1;
        }

        let offsets: Vec<u32> = std::iter::once(0u32)
            .chain(degree.iter().scan(0u32, |acc, &d| { *acc += d; Some(*acc) }))
            .collect();

        // Filling in segment order keeps every row sorted by segment id.
        let mut cursor = offsets.clone();
        let mut segments = vec![SegmentId(0); table.len() * 2];
        for (id, (a, b)) in table.iter() {
            for p in [a, b] {
                segments[cursor[p.index()] as usize] = id;
                cursor[p.index()] += 1;
            }
        }

        Self { offsets, segments }
    }

    #[inline]
    fn incident(&self, point: PointId) -> &[SegmentId] {
        &self.segments[self.offsets[point.index()] as usize..self.offsets[point.index() + 1] as usize]
    }

    #[inline]
    fn degree(&self, point: PointId) -> usize { self.incident(point).len() }
}

struct Contraction<'a> {
    table:     &'a SegmentTable,
    incidence: Incidence,
    owner:     Vec<Option<LineId>>,
    out:       LineTable,
}

impl Contraction<'_> {
    /// Walk from `start` along `first` until a junction (or `start` again)
    /// is reached, recording the visited points as one new line.
    fn walk(&mut self, start: PointId, first: SegmentId) {
        let line = LineId(next_id(self.out.offsets.len() - 1));
        let mut segment = first;
        let mut current = start;
        self.out.vertices.push(start);

        loop {
            self.owner[segment.index()] = Some(line);
            let (a, b) = self.table.endpoints(segment);
            let next = if a == current { b } else { a };
            self.out.vertices.push(next);

            if next == start || self.incidence.degree(next) != 2 { break; }

            let pair = self.incidence.incident(next);
            let following = if pair[0] == segment { pair[1] } else { pair[0] };
            if self.owner[following.index()].is_some() { break; }

            segment = following;
            current = next;
        }

        self.out.offsets.push(next_id(self.out.vertices.len()));
    }
}

/// Contract all registered segments into lines.
pub(crate) fn contract(points: &PointIndex, table: &SegmentTable) -> LineTable {
    let mut state = Contraction {
        table,
        incidence: Incidence::new(points.len(), table),
        owner:     vec![None; table.len()],
        out:       LineTable {
            offsets:      vec![0],
            vertices:     Vec::with_capacity(table.len() + 1),
            segment_line: Vec::new(),
        },
    };

    for (point, _) in points.iter() {
        let degree = state.incidence.degree(point);
        if degree == 2 || degree == 0 { continue; }
        for i in 0..degree {
            let segment = state.incidence.incident(point)[i];
            if state.owner[segment.index()].is_none() {
                state.walk(point, segment);
            }
        }
    }

    for (segment, (a, _)) in table.iter() {
        if state.owner[segment.index()].is_none() {
            state.walk(a, segment);
        }
    }

    let Contraction { owner, mut out, .. } = state;
    // The second loop seeds a walk from every unowned segment.
    out.segment_line = owner.into_iter()
        .enumerate()
        .map(|(segment, line)| line.unwrap_or_else(|| panic!("segment {segment} left without a line")))
        .collect();
    out
}
