//! OSM XML writing operations.
//!
//! Points become nodes, lines become ways and areas become boundary
//! relations.  All ids are negative, as for objects not yet uploaded.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use topograph::{LineId, PointId};

use crate::pipeline::Build;

pub(crate) const GENERATOR: &str = concat!("admintopo ", env!("CARGO_PKG_VERSION"));

#[inline] fn node_id(point: PointId) -> i64 { -(point.index() as i64 + 1) }

#[inline] fn way_id(line: LineId) -> i64 { -(line.index() as i64 + 1) }

/// Escape the five XML special characters of an attribute value.
fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value)
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Write a build as an OSM XML document.
pub fn write_osm<W: Write>(writer: &mut W, build: &Build, timestamp: DateTime<Utc>) -> Result<()> {
    let ts = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    let topo = &build.topology;

    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<osm version="0.6" generator="{GENERATOR}">"#)?;

    for (point, coord) in topo.points() {
        writeln!(writer, r#"  <node id="{}" lat="{:.7}" lon="{:.7}" version="0" timestamp="{ts}"/>"#,
            node_id(point), coord.y, coord.x)?;
    }

    for (line, points) in topo.lines() {
        writeln!(writer, r#"  <way id="{}" version="0" timestamp="{ts}">"#, way_id(line))?;
        for &point in points {
            writeln!(writer, r#"    <nd ref="{}"/>"#, node_id(point))?;
        }
        writeln!(writer, r#"    <tag k="boundary" v="administrative"/>"#)?;
        writeln!(writer, r#"    <tag k="admin_level" v="{}"/>"#, build.levels[line.index()])?;
        writeln!(writer, "  </way>")?;
    }

    for (n, (_, area)) in build.areas.iter().enumerate() {
        writeln!(writer, r#"  <relation id="-{}" version="0" timestamp="{ts}">"#, n + 1)?;
        for (role, lines) in [("outer", &area.outer), ("inner", &area.inner)] {
            for &line in lines {
                writeln!(writer, r#"    <member type="way" ref="{}" role="{role}"/>"#, way_id(line))?;
            }
        }
        writeln!(writer, r#"    <tag k="type" v="boundary"/>"#)?;
        writeln!(writer, r#"    <tag k="boundary" v="administrative"/>"#)?;
        writeln!(writer, r#"    <tag k="admin_level" v="{}"/>"#, area.level)?;
        writeln!(writer, r#"    <tag k="name" v="{}"/>"#, escape(&area.name))?;
        writeln!(writer, "  </relation>")?;
    }

    writeln!(writer, "</osm>")?;
    Ok(())
}

/// Write a build to an OSM XML file, stamped with the current time.
pub fn write_osm_file(path: &Path, build: &Build) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::osm] Failed to create OSM file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_osm(&mut writer, build, Utc::now())
        .with_context(|| format!("[io::osm] Failed to write OSM to {}", path.display()))?;
    writer.flush()
        .with_context(|| format!("[io::osm] Failed to flush {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        nodes = build.topology.num_points(),
        ways = build.topology.num_lines(),
        relations = build.areas.len(),
        "wrote OSM file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::config::Config;
    use crate::pipeline::build;
    use crate::source::SourceFeature;

    fn two_districts() -> Build {
        let square = |x0: f64, name: &str| SourceFeature {
            source:   std::sync::Arc::from(std::path::Path::new("uganda.shp")),
            index:    0,
            ring:     vec![
                geo::Coord { x: x0, y: 0.0 },
                geo::Coord { x: x0 + 1.0, y: 0.0 },
                geo::Coord { x: x0 + 1.0, y: 1.0 },
                geo::Coord { x: x0, y: 1.0 },
            ],
            district: Some(name.into()),
            region:   Some("BUGANDA & CO".into()),
        };
        build(&[square(30.0, "MASAKA"), square(31.0, "MPIGI")], &Config::default()).unwrap()
    }

    fn render(build: &Build) -> String {
        let mut out = Vec::new();
        let ts = Utc.with_ymd_and_hms(2012, 3, 4, 5, 6, 7).unwrap();
        write_osm(&mut out, build, ts).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escapes_attribute_values() {
        assert_eq!(escape("Kampala"), "Kampala");
        assert_eq!(escape(r#"A & "B" <C>"#), "A &amp; &quot;B&quot; &lt;C&gt;");
    }

    #[test]
    fn document_shape() {
        let build = two_districts();
        let xml = render(&build);
        let lines: Vec<&str> = xml.lines().collect();

        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert!(lines[1].starts_with(r#"<osm version="0.6" generator="admintopo "#));
        assert_eq!(*lines.last().unwrap(), "</osm>");

        assert_eq!(xml.matches("<node ").count(), 6);
        assert_eq!(xml.matches("<way ").count(), 3);
        assert_eq!(xml.matches("<relation ").count(), 3);
        assert!(xml.contains(r#"<node id="-1" lat="0.0000000" lon="30.0000000" version="0" timestamp="2012-03-04T05:06:07Z"/>"#));
        assert!(xml.contains(r#"<tag k="name" v="Buganda &amp; Co"/>"#));
        assert!(xml.contains(r#"<tag k="admin_level" v="6"/>"#));
    }

    #[test]
    fn relations_follow_key_order_and_list_outer_first() {
        let build = two_districts();
        let xml = render(&build);

        // Key order: level 6 before level 7, then by name.
        let buganda = xml.find("Buganda").unwrap();
        let masaka = xml.find("Masaka").unwrap();
        let mpigi = xml.find("Mpigi").unwrap();
        assert!(buganda < masaka && masaka < mpigi);

        let first = xml.find(r#"<relation id="-1""#).unwrap();
        let second = xml.find(r#"<relation id="-2""#).unwrap();
        let subregion = &xml[first..second];
        assert_eq!(subregion.matches(r#"role="outer""#).count(), 2);
        assert!(!subregion.contains(r#"role="inner""#));
    }

    #[test]
    fn shared_border_carries_district_level() {
        let build = two_districts();
        let xml = render(&build);
        // Each way element alone, without the relations that follow the last one.
        let ways: Vec<&str> = xml.split("<way ").skip(1)
            .map(|chunk| chunk.split("</way>").next().unwrap_or(chunk))
            .collect();
        assert_eq!(ways.len(), 3);
        let level7 = ways.iter()
            .filter(|way| way.contains(r#"<tag k="admin_level" v="7"/>"#))
            .count();
        assert_eq!(level7, 1);
        assert_eq!(build.levels.iter().filter(|&&level| level == 7).count(), 1);
    }
}
