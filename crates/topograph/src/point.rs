use ahash::AHashMap;
use geo::Coord;

use crate::error::{Result, TopologyError};
use crate::ids::{next_id, PointId};

/// Grid cell of a snapped coordinate.
type Cell = (i64, i64);

/// Deduplicates coordinates into stable `PointId`s.
///
/// Coordinates are quantized to a square grid of side `tolerance` (degrees);
/// every coordinate rounding to the same grid node maps to the same point.
/// A value of `1e-7` (~1 cm) matches the 7-decimal precision of OSM
/// coordinates.
#[derive(Clone, Debug)]
pub struct PointIndex {
    tolerance: f64,
    cells:     AHashMap<Cell, PointId>,
    coords:    Vec<Coord<f64>>,
}

impl PointIndex {
    /// Create an empty index snapping to `tolerance`, pre-sized for
    /// `capacity` points.
    pub fn new(tolerance: f64, capacity: usize) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(TopologyError::InvalidTolerance(tolerance));
        }
        Ok(Self {
            tolerance,
            cells:  AHashMap::with_capacity(capacity),
            coords: Vec::with_capacity(capacity),
        })
    }

    #[inline] pub fn tolerance(&self) -> f64 { self.tolerance }

    #[inline] pub fn len(&self) -> usize { self.coords.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.coords.is_empty() }

    #[inline]
    fn cell(&self, coord: Coord<f64>) -> Cell {
        (
            (coord.x / self.tolerance).round() as i64,
            (coord.y / self.tolerance).round() as i64,
        )
    }

    /// Return the point in `coord`'s grid cell, allocating it on first sight.
    pub fn register(&mut self, coord: Coord<f64>) -> PointId {
        let cell = self.cell(coord);
        if let Some(&id) = self.cells.get(&cell) {
            return id;
        }
        let id = PointId(next_id(self.coords.len()));
        self.coords.push(Coord {
            x: cell.0 as f64 * self.tolerance,
            y: cell.1 as f64 * self.tolerance,
        });
        self.cells.insert(cell, id);
        id
    }

    /// Find the point in `coord`'s grid cell without allocating.
    pub fn lookup(&self, coord: Coord<f64>) -> Option<PointId> {
        self.cells.get(&self.cell(coord)).copied()
    }

    /// Canonical (snapped) coordinate of `id`.
    #[inline]
    pub fn coord(&self, id: PointId) -> Coord<f64> { self.coords[id.index()] }

    /// All points in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, Coord<f64>)> + '_ {
        self.coords.iter().enumerate().map(|(i, &c)| (PointId(i as u32), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PointIndex { PointIndex::new(1e-7, 16).unwrap() }

    #[test]
    fn identical_coordinates_share_an_id() {
        let mut points = index();
        let a = points.register(Coord { x: 32.5, y: 0.25 });
        let b = points.register(Coord { x: 32.5, y: 0.25 });
        assert_eq!(a, b);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn coordinates_in_one_cell_share_an_id() {
        let mut points = index();
        let a = points.register(Coord { x: 32.500_000_01, y: 0.25 });
        let b = points.register(Coord { x: 32.499_999_99, y: 0.250_000_02 });
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_cells_get_distinct_ids() {
        let mut points = index();
        let a = points.register(Coord { x: 32.5, y: 0.25 });
        let b = points.register(Coord { x: 32.500_001, y: 0.25 });
        assert_ne!(a, b);
        assert_eq!(points.iter().count(), 2);
    }

    #[test]
    fn lookup_never_allocates() {
        let mut points = index();
        assert_eq!(points.lookup(Coord { x: 1.0, y: 1.0 }), None);
        let a = points.register(Coord { x: 1.0, y: 1.0 });
        assert_eq!(points.lookup(Coord { x: 1.0, y: 1.0 }), Some(a));
        assert_eq!(points.lookup(Coord { x: 2.0, y: 1.0 }), None);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn rejects_bad_tolerance() {
        assert!(PointIndex::new(0.0, 0).is_err());
        assert!(PointIndex::new(f64::NAN, 0).is_err());
        assert!(PointIndex::new(-1e-7, 0).is_err());
    }

    #[test]
    fn stored_coordinate_is_snapped() {
        let mut points = PointIndex::new(0.5, 0).unwrap();
        let a = points.register(Coord { x: 1.2, y: -0.8 });
        assert_eq!(points.coord(a), Coord { x: 1.0, y: -1.0 });
    }
}
