use crate::foundation::core::PlacemarkRecord;
use crate::foundation::error::{CoverlapError, CoverlapResult};

/// Finds the first `<Placemark>` whose trimmed `<description>` equals `sentinel` and reads its
/// point coordinates.
///
/// Returns `Ok(None)` when no placemark carries the sentinel. Unparseable XML, or a matching
/// placemark without usable coordinates, is a [`CoverlapError::PlacemarkParse`].
pub fn parse_viewer_placemark(xml: &str, sentinel: &str) -> CoverlapResult<Option<PlacemarkRecord>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| CoverlapError::placemark_parse(format!("parse kml: {e}")))?;

    let Some(placemark) = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "Placemark")
        .find(|n| child_text(*n, "description").is_some_and(|d| d.trim() == sentinel))
    else {
        return Ok(None);
    };

    let name = child_text(placemark, "name")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let coords = placemark
        .descendants()
        .find(|n| n.tag_name().name() == "coordinates")
        .and_then(|n| n.text())
        .ok_or_else(|| {
            CoverlapError::placemark_parse(format!("placemark '{name}' has no coordinates"))
        })?;
    let (longitude, latitude, altitude) = parse_coordinate_tuple(coords)?;

    Ok(Some(PlacemarkRecord {
        name,
        latitude,
        longitude,
        altitude,
    }))
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.tag_name().name() == tag)
        .and_then(|c| c.text())
}

/// First `lon,lat[,alt]` tuple of a KML coordinates string. Altitude defaults to 0.
fn parse_coordinate_tuple(raw: &str) -> CoverlapResult<(f64, f64, f64)> {
    let tuple = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| CoverlapError::placemark_parse("empty coordinates"))?;
    let parts: Vec<&str> = tuple.split(',').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(CoverlapError::placemark_parse(format!(
            "expected 'lon,lat[,alt]', got '{tuple}'"
        )));
    }
    let num = |s: &str| -> CoverlapResult<f64> {
        let v: f64 = s
            .trim()
            .parse()
            .map_err(|e| CoverlapError::placemark_parse(format!("bad number '{s}': {e}")))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(CoverlapError::placemark_parse(format!("non-finite number '{s}'")))
        }
    };
    let lon = num(parts[0])?;
    let lat = num(parts[1])?;
    let alt = match parts.get(2) {
        Some(&s) => num(s)?,
        None => 0.0,
    };
    Ok((lon, lat, alt))
}
