//! Reading administrative polygons from shapefiles.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use geo::Coord;
use shapefile::{dbase::Record, Shape};
use topograph::AreaSpec;

use crate::common::{first_outer_ring, get_character_field, normalize_name, read_shapefile, shape_kind};
use crate::config::{Config, FieldSchema, Levels};
use crate::geom::Reprojector;

/// One polygon feature: the outer ring of its first polygon plus its names.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFeature {
    /// File the feature was read from.
    pub source:   Arc<Path>,
    /// Position of the feature in its file.
    pub index:    usize,
    /// Closed outer ring in WGS84 lon/lat.
    pub ring:     Vec<Coord<f64>>,
    pub district: Option<String>,
    pub region:   Option<String>,
}

/// What a feature contributes to: its own area and, optionally, a parent
/// area that receives its boundary by symmetric difference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    pub area:   AreaSpec,
    pub parent: Option<AreaSpec>,
}

impl SourceFeature {
    /// `file.shp#index`, unique across all inputs of a build.
    pub fn origin(&self) -> String {
        format!("{}#{}", self.source.display(), self.index)
    }

    /// Classify the feature from which of its names are present:
    /// - no district: the polygon is a subregion, without parent;
    /// - no region: the polygon is a district, without parent;
    /// - both: a district whose subregion is assembled from its districts.
    ///
    /// Returns `None` when both names are missing.
    pub fn classify(&self, levels: &Levels) -> Option<Classified> {
        let spec = |level, raw: &str| AreaSpec::new(level, raw, normalize_name(raw));
        match (self.district.as_deref(), self.region.as_deref()) {
            (None, None) => None,
            (None, Some(region)) => Some(Classified { area: spec(levels.subregion, region), parent: None }),
            (Some(district), None) => Some(Classified { area: spec(levels.district, district), parent: None }),
            (Some(district), Some(region)) => Some(Classified {
                area:   spec(levels.district, district),
                parent: Some(spec(levels.subregion, region)),
            }),
        }
    }
}

/// First schema whose two fields are both present.
pub fn detect_schema<'a>(schemas: &'a [FieldSchema], has_field: impl Fn(&str) -> bool) -> Option<&'a FieldSchema> {
    schemas.iter().find(|schema| has_field(&schema.district) && has_field(&schema.region))
}

/// Contents of the `.prj` file next to a shapefile, if there is one.
fn read_prj(path: &Path) -> Result<Option<String>> {
    let prj = path.with_extension("prj");
    match fs::read_to_string(&prj) {
        Ok(wkt) => Ok(Some(wkt)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("[source] Failed to read {}", prj.display())),
    }
}

/// Refuse projected input unless a source projection is configured.
/// Coordinates are otherwise taken as WGS84 degrees.
fn check_projection(path: &Path, config: &Config) -> Result<()> {
    let Some(wkt) = read_prj(path)? else {
        tracing::debug!(path = %path.display(), "no .prj, assuming WGS84 lon/lat");
        return Ok(())
    };
    match &config.source_proj {
        Some(proj) => tracing::debug!(path = %path.display(), %proj, "reprojecting with the configured projection"),
        None if ["PROJCS", "PROJCRS"].iter().any(|kw| wkt.trim_start().starts_with(kw)) => bail!(
            "[source] {}: the .prj describes a projected coordinate system, set --source-proj to its PROJ.4 definition",
            path.display()),
        None => {}
    }
    Ok(())
}

/// Read every polygon feature of a shapefile.
///
/// Fails when no configured attribute schema matches the file, when a shape
/// is not a polygon, or when the `.prj` is projected and no source projection
/// is set.  Null shapes are skipped.
pub fn read_features(path: &Path, config: &Config) -> Result<Vec<SourceFeature>> {
    check_projection(path, config)?;
    let items = read_shapefile(path)?;
    let features = features_from_items(path, &items, config)?;
    tracing::info!(path = %path.display(), features = features.len(), "read shapefile");
    Ok(features)
}

/// Read the features of every shapefile, in the order given.
pub fn read_all(paths: &[PathBuf], config: &Config) -> Result<Vec<SourceFeature>> {
    let mut features = Vec::new();
    for path in paths {
        features.extend(read_features(path, config)?);
    }
    Ok(features)
}

fn features_from_items(path: &Path, items: &[(Shape, Record)], config: &Config) -> Result<Vec<SourceFeature>> {
    let Some((_, first)) = items.first() else {
        tracing::warn!(path = %path.display(), "shapefile has no features");
        return Ok(Vec::new())
    };

    let Some(schema) = detect_schema(&config.schemas, |field| first.get(field).is_some()) else {
        bail!("[source] {}: important field missing, none of the name schemas {:?} match",
            path.display(),
            config.schemas.iter().map(|s| format!("{}/{}", s.district, s.region)).collect::<Vec<_>>());
    };
    tracing::debug!(path = %path.display(), district = %schema.district, region = %schema.region, "detected name fields");

    let reprojector = config.source_proj.as_deref().map(Reprojector::new).transpose()?;
    let source: Arc<Path> = Arc::from(path);

    let mut features = Vec::with_capacity(items.len());
    for (index, (shape, record)) in items.iter().enumerate() {
        if matches!(shape, Shape::NullShape) {
            tracing::warn!(path = %path.display(), feature = index, "skipping null shape");
            continue;
        }
        let Some((mut ring, polygons)) = first_outer_ring(shape) else {
            bail!("[source] {}: feature {index} is a {} shape, not a polygon", path.display(), shape_kind(shape));
        };
        if polygons > 1 {
            tracing::debug!(feature = index, polygons, "only the first polygon is used");
        }

        if let Some(proj) = &reprojector {
            proj.apply_all(&mut ring)
                .with_context(|| format!("[source] {}: failed to reproject feature {index}", path.display()))?;
        }

        let district = get_character_field(record, &schema.district)
            .with_context(|| format!("[source] {}: feature {index}", path.display()))?;
        let region = get_character_field(record, &schema.region)
            .with_context(|| format!("[source] {}: feature {index}", path.display()))?;
        tracing::trace!(feature = index, ?district, ?region, points = ring.len(), "read feature");

        features.push(SourceFeature { source: source.clone(), index, ring, district, region });
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::dbase::{FieldValue, TableWriterBuilder};
    use shapefile::{Point, Polygon, PolygonRing};
    use topograph::AdminKey;

    fn feature(district: Option<&str>, region: Option<&str>) -> SourceFeature {
        SourceFeature {
            source:   Arc::from(Path::new("mem.shp")),
            index:    0,
            ring:     Vec::new(),
            district: district.map(String::from),
            region:   region.map(String::from),
        }
    }

    #[test]
    fn district_with_region_has_parent() {
        let c = feature(Some("KAMPALA"), Some("CENTRAL")).classify(&Levels::default()).unwrap();
        assert_eq!(c.area.key, AdminKey::new(7, "KAMPALA"));
        assert_eq!(c.area.name, "Kampala");
        let parent = c.parent.unwrap();
        assert_eq!(parent.key, AdminKey::new(6, "CENTRAL"));
        assert_eq!(parent.name, "Central");
    }

    #[test]
    fn missing_district_means_subregion() {
        let c = feature(None, Some("west nile")).classify(&Levels::default()).unwrap();
        assert_eq!(c.area.key, AdminKey::new(6, "WEST NILE"));
        assert_eq!(c.area.name, "West Nile");
        assert!(c.parent.is_none());
    }

    #[test]
    fn missing_region_means_lone_district() {
        let levels = Levels { subregion: 4, district: 5, default: 8 };
        let c = feature(Some("GULU"), None).classify(&levels).unwrap();
        assert_eq!(c.area.key, AdminKey::new(5, "GULU"));
        assert!(c.parent.is_none());
    }

    #[test]
    fn no_names_is_skipped() {
        assert!(feature(None, None).classify(&Levels::default()).is_none());
    }

    #[test]
    fn schema_detection_order() {
        let schemas = Config::default().schemas;
        let merged = ["place", "region", "AREA"];
        let found = detect_schema(&schemas, |f| merged.contains(&f)).unwrap();
        assert_eq!(found.district, "place");

        let both = ["DNAME_2010", "SUBREGION", "place", "region"];
        let found = detect_schema(&schemas, |f| both.contains(&f)).unwrap();
        assert_eq!(found.district, "DNAME_2010");

        assert!(detect_schema(&schemas, |f| f == "DNAME_2010").is_none());
    }

    fn square(x0: f64) -> Polygon {
        let ring = [(x0, 0.0), (x0, 1.0), (x0 + 1.0, 1.0), (x0 + 1.0, 0.0), (x0, 0.0)];
        Polygon::new(PolygonRing::Outer(ring.iter().map(|&(x, y)| Point::new(x, y)).collect()))
    }

    fn record(fields: &[(&str, &str)]) -> Record {
        let mut record = Record::default();
        for &(name, value) in fields {
            record.insert(name.to_string(), FieldValue::Character(Some(value.to_string())));
        }
        record
    }

    /// Write a polygon shapefile whose features all carry `fields` as text columns.
    fn write_shapefile(path: &Path, fields: &[&str], features: &[(Polygon, Record)]) {
        let table = fields.iter().fold(TableWriterBuilder::new(), |table, &name| {
            table.add_character_field(name.try_into().unwrap(), 50)
        });
        let mut writer = shapefile::Writer::from_path(path, table).unwrap();
        for (shape, record) in features {
            writer.write_shape_and_record(shape, record).unwrap();
        }
    }

    fn uganda(path: &Path, districts: &[(f64, &str)]) {
        let features: Vec<_> = districts.iter()
            .map(|&(x0, name)| (square(x0), record(&[("DNAME_2010", name), ("SUBREGION", "CENTRAL")])))
            .collect();
        write_shapefile(path, &["DNAME_2010", "SUBREGION"], &features);
    }

    #[test]
    fn reads_features_with_their_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uganda.shp");
        uganda(&path, &[(30.0, "MASAKA"), (31.0, "MPIGI")]);

        let features = read_features(&path, &Config::default()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1].index, 1);
        assert_eq!(features[1].district.as_deref(), Some("MPIGI"));
        assert_eq!(features[1].region.as_deref(), Some("CENTRAL"));
        assert_eq!(features[1].origin(), format!("{}#1", path.display()));
        // Closed ring of the square.
        assert_eq!(features[0].ring.len(), 5);
        assert_eq!(features[0].ring.first(), features[0].ring.last());
    }

    #[test]
    fn files_are_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("b.shp");
        let second = dir.path().join("a.shp");
        uganda(&first, &[(30.0, "MASAKA")]);
        uganda(&second, &[(31.0, "MPIGI"), (32.0, "WAKISO")]);

        let features = read_all(&[first.clone(), second.clone()], &Config::default()).unwrap();
        let names: Vec<_> = features.iter().map(|f| f.district.as_deref().unwrap()).collect();
        assert_eq!(names, ["MASAKA", "MPIGI", "WAKISO"]);
        assert_eq!(&*features[0].source, first.as_path());
        assert_eq!(&*features[2].source, second.as_path());
        // Indices restart per file, the origin tells them apart.
        assert_eq!(features[0].index, features[1].index);
        assert_ne!(features[0].origin(), features[1].origin());
    }

    #[test]
    fn missing_name_fields_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.shp");
        write_shapefile(&path, &["NAME"], &[(square(0.0), record(&[("NAME", "X")]))]);

        let err = read_features(&path, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("important field missing"), "{err:#}");
    }

    #[test]
    fn projected_prj_needs_a_source_projection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utm.shp");
        uganda(&path, &[(30.0, "MASAKA")]);
        fs::write(path.with_extension("prj"),
            r#"PROJCS["WGS_1984_UTM_Zone_36N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]],PROJECTION["Transverse_Mercator"]]"#).unwrap();

        let err = read_features(&path, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("--source-proj"), "{err:#}");
    }

    #[test]
    fn geographic_prj_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wgs84.shp");
        uganda(&path, &[(30.0, "MASAKA")]);
        fs::write(path.with_extension("prj"),
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#).unwrap();

        assert_eq!(read_features(&path, &Config::default()).unwrap().len(), 1);
    }

    #[test]
    fn null_shapes_are_skipped() {
        let names = record(&[("DNAME_2010", "GULU"), ("SUBREGION", "ACHOLI")]);
        let items = vec![
            (Shape::NullShape, names.clone()),
            (Shape::Polygon(square(0.0)), names),
        ];
        let features = features_from_items(Path::new("mem.shp"), &items, &Config::default()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].index, 1);
    }

    #[test]
    fn non_polygon_shapes_are_fatal() {
        let names = record(&[("DNAME_2010", "GULU"), ("SUBREGION", "ACHOLI")]);
        let items = vec![
            (Shape::Polygon(square(0.0)), names.clone()),
            (Shape::Point(Point::new(0.5, 0.5)), names),
        ];
        let err = features_from_items(Path::new("mem.shp"), &items, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("feature 1 is a Point shape"), "{err}");
    }

    #[test]
    fn empty_input_has_no_features() {
        let features = features_from_items(Path::new("mem.shp"), &[], &Config::default()).unwrap();
        assert!(features.is_empty());
    }
}
