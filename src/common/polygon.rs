use geo::Coord;
use shapefile as shp;

/// Outer ring of the first polygon of a shape, closed, plus the number of
/// polygons (outer rings) the shape holds.  Inner rings are ignored.
///
/// Returns `None` for shapes that are not polygons.
pub fn first_outer_ring(shape: &shp::Shape) -> Option<(Vec<Coord<f64>>, usize)> {
    /// Ensure first and last are the same
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
    }

    fn pick<P>(rings: &[shp::PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> (Vec<Coord<f64>>, usize) {
        let outers: Vec<_> = rings.iter()
            .filter(|ring| matches!(ring, shp::PolygonRing::Outer(_)))
            .collect();

        // A file written without orientation care may carry no outer ring at
        // all; fall back to the first ring.
        let Some(ring) = outers.first().copied().or(rings.first()) else {
            return (Vec::new(), 0)
        };

        let mut coords: Vec<_> = ring.points().iter().map(xy).collect();
        ensure_closed(&mut coords);
        (coords, outers.len().max(1))
    }

    match shape {
        shp::Shape::Polygon(p) => Some(pick(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        shp::Shape::PolygonM(p) => Some(pick(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        shp::Shape::PolygonZ(p) => Some(pick(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> shp::Point { shp::Point { x, y } }

    #[test]
    fn takes_first_outer_ring_only() {
        let outer = vec![pt(0.0, 0.0), pt(0.0, 4.0), pt(4.0, 4.0), pt(4.0, 0.0), pt(0.0, 0.0)];
        let hole = vec![pt(1.0, 1.0), pt(2.0, 1.0), pt(2.0, 2.0), pt(1.0, 2.0), pt(1.0, 1.0)];
        let second = vec![pt(10.0, 0.0), pt(10.0, 1.0), pt(11.0, 1.0), pt(10.0, 0.0)];
        let polygon = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(outer),
            shp::PolygonRing::Inner(hole),
            shp::PolygonRing::Outer(second),
        ]);

        let (ring, polygons) = first_outer_ring(&shp::Shape::Polygon(polygon)).unwrap();
        assert_eq!(polygons, 2);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[2], Coord { x: 4.0, y: 4.0 });
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn rejects_non_polygons() {
        assert!(first_outer_ring(&shp::Shape::Point(pt(1.0, 2.0))).is_none());
        assert!(first_outer_ring(&shp::Shape::NullShape).is_none());
    }
}
