use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};

/// Reads all shapes + attribute records from a given `.shp` file path.
pub fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("Error reading shape+record from {}", path.display()))?;
        items.push((shape, record));
    }
    Ok(items)
}

/// Get the value of a character field, `None` when the field is null or blank.
/// Errors when the field is absent or not a character field.
pub fn get_character_field(record: &Record, field: &str) -> Result<Option<String>> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
        Some(FieldValue::Character(_)) => Ok(None),
        Some(other) => anyhow::bail!("field {field} is not a character field ({})", field_kind(other)),
        None => anyhow::bail!("missing character field: {field}"),
    }
}

/// Short name of a shape's geometry family.
pub fn shape_kind(shape: &Shape) -> &'static str {
    match shape {
        Shape::NullShape => "Null",
        Shape::Point(_) | Shape::PointM(_) | Shape::PointZ(_) => "Point",
        Shape::Polyline(_) | Shape::PolylineM(_) | Shape::PolylineZ(_) => "Polyline",
        Shape::Polygon(_) | Shape::PolygonM(_) | Shape::PolygonZ(_) => "Polygon",
        Shape::Multipoint(_) | Shape::MultipointM(_) | Shape::MultipointZ(_) => "Multipoint",
        Shape::Multipatch(_) => "Multipatch",
    }
}

fn field_kind(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Character(_) => "character",
        FieldValue::Numeric(_) => "numeric",
        FieldValue::Logical(_) => "logical",
        FieldValue::Date(_) => "date",
        FieldValue::Float(_) => "float",
        FieldValue::Integer(_) => "integer",
        FieldValue::Currency(_) => "currency",
        FieldValue::DateTime(_) => "datetime",
        FieldValue::Double(_) => "double",
        FieldValue::Memo(_) => "memo",
        #[allow(unreachable_patterns)]
        _ => "other",
    }
}

/// Overview of a shapefile's content, as printed by `inspect`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapefileSummary {
    pub records:  usize,
    /// Number of shapes per geometry family.
    pub geometry: BTreeMap<&'static str, usize>,
    /// Attribute columns of the first record with their type and value.
    pub columns:  Vec<(String, &'static str, String)>,
}

impl ShapefileSummary {
    pub fn from_items(items: &[(Shape, Record)]) -> Self {
        let mut geometry: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (shape, _) in items {
            *geometry.entry(shape_kind(shape)).or_default() += 1;
        }

        let columns = items.first()
            .map(|(_, record)| {
                let mut columns: Vec<_> = record.clone().into_iter()
                    .map(|(field, value)| {
                        let kind = field_kind(&value);
                        (field, kind, format!("{value:?}"))
                    })
                    .collect();
                columns.sort();
                columns
            })
            .unwrap_or_default();

        Self { records: items.len(), geometry, columns }
    }
}

impl fmt::Display for ShapefileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of records: {}", self.records)?;
        writeln!(f, "Geometry mix:")?;
        for (kind, count) in &self.geometry {
            writeln!(f, "  - {kind}: {count}")?;
        }
        if !self.columns.is_empty() {
            writeln!(f, "Attribute columns:")?;
            for (field, kind, value) in &self.columns {
                writeln!(f, "  - {field} ({kind}): {value}")?;
            }
        }
        Ok(())
    }
}
