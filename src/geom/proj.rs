use anyhow::{anyhow, Context, Result};
use geo::Coord;
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// Target of every reprojection: WGS84 lon/lat.
const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Reprojects source coordinates to WGS84 lon/lat degrees.
pub struct Reprojector {
    from: Proj4,
    to:   Proj4,
}

impl Reprojector {
    /// Build a reprojector from the PROJ.4 definition of the source CRS.
    pub fn new(source: &str) -> Result<Self> {
        let from = Proj4::from_proj_string(source)
            .with_context(|| anyhow!("failed to build source PROJ.4: {source}"))?;
        let to = Proj4::from_proj_string(WGS84)
            .with_context(|| anyhow!("failed to build target PROJ.4: {WGS84}"))?;
        Ok(Self { from, to })
    }

    /// Reproject one coordinate.  Lon/lat sources are given in degrees.
    pub fn apply(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        // proj4rs works in radians on the geographic side.
        let mut point = if self.from.is_latlong() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.from, &self.to, &mut point)
            .with_context(|| anyhow!("CRS transform failed for ({}, {})", coord.x, coord.y))?;
        Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
    }

    /// Reproject a ring in place.
    pub fn apply_all(&self, coords: &mut [Coord<f64>]) -> Result<()> {
        for coord in coords.iter_mut() {
            *coord = self.apply(*coord)?;
        }
        Ok(())
    }
}
