use ahash::AHashMap;

use crate::ids::{next_id, PointId, SegmentId};

/// Deduplicates undirected point pairs into stable `SegmentId`s.
///
/// Pairs are stored with the smaller point id first, so `(a, b)` and `(b, a)`
/// always resolve to the same segment.
#[derive(Clone, Debug, Default)]
pub struct SegmentTable {
    ends:  Vec<(PointId, PointId)>,
    index: AHashMap<(PointId, PointId), SegmentId>,
}

#[inline]
fn key(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl SegmentTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ends:  Vec::with_capacity(capacity),
            index: AHashMap::with_capacity(capacity),
        }
    }

    #[inline] pub fn len(&self) -> usize { self.ends.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ends.is_empty() }

    /// Register the segment `{a, b}`.  Returns `None` for a degenerate pair
    /// (`a == b`), which is never stored.
    pub fn register(&mut self, a: PointId, b: PointId) -> Option<SegmentId> {
        if a == b { return None; }
        let key = key(a, b);
        if let Some(&id) = self.index.get(&key) {
            return Some(id);
        }
        let id = SegmentId(next_id(self.ends.len()));
        self.ends.push(key);
        self.index.insert(key, id);
        Some(id)
    }

    /// Find the segment `{a, b}` without allocating.
    pub fn lookup(&self, a: PointId, b: PointId) -> Option<SegmentId> {
        self.index.get(&key(a, b)).copied()
    }

    /// Endpoints of `id`, lower point id first.
    #[inline]
    pub fn endpoints(&self, id: SegmentId) -> (PointId, PointId) { self.ends[id.index()] }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, (PointId, PointId))> + '_ {
        self.ends.iter().enumerate().map(|(i, &e)| (SegmentId(i as u32), e))
    }
}
