//! Module to extract GPS tracks from a GeoJSON file.

use crate::map::projection::LatLon;
use anyhow::Context;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, LineStringType, Value};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Converts a GeoJSON line, made of (longitude, latitude) positions.
fn line_points(line: &LineStringType) -> Vec<LatLon> {
    line.iter()
        .filter(|position| position.len() >= 2)
        .map(|position| LatLon {
            lat: position[1],
            lon: position[0],
        })
        .collect()
}

/// Collects all the lines in the given GeoJSON object, in document order.
fn collect_tracks(geojson: &GeoJson) -> Vec<Vec<LatLon>> {
    fn visit_feature_collection(collection: &FeatureCollection, tracks: &mut Vec<Vec<LatLon>>) {
        for feature in &collection.features {
            visit_feature(feature, tracks);
        }
    }

    fn visit_feature(feature: &Feature, tracks: &mut Vec<Vec<LatLon>>) {
        if let Some(geometry) = &feature.geometry {
            visit_geometry(geometry, tracks);
        }
    }

    fn visit_geometry(geometry: &Geometry, tracks: &mut Vec<Vec<LatLon>>) {
        match &geometry.value {
            Value::LineString(line) => tracks.push(line_points(line)),
            Value::MultiLineString(lines) => tracks.extend(lines.iter().map(line_points)),
            Value::Point(_) | Value::MultiPoint(_) | Value::Polygon(_) | Value::MultiPolygon(_) => {
            }
            Value::GeometryCollection(collection) => {
                for geometry in collection {
                    visit_geometry(geometry, tracks);
                }
            }
        }
    }

    let mut tracks = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(collection) => visit_feature_collection(collection, &mut tracks),
        GeoJson::Feature(feature) => visit_feature(feature, &mut tracks),
        GeoJson::Geometry(geometry) => visit_geometry(geometry, &mut tracks),
    }
    tracks
}

/// Reads the tracks (line strings) contained in the given GeoJSON file.
pub fn read_tracks<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Vec<LatLon>>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {}", path.display()))?;
    let tracks = parse_tracks(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))?;
    debug!("GeoJSON file {} has {} tracks", path.display(), tracks.len());
    Ok(tracks)
}

/// Parses the tracks of a GeoJSON object from the given reader.
pub fn parse_tracks<R: Read>(reader: R) -> anyhow::Result<Vec<Vec<LatLon>>> {
    let geojson = GeoJson::from_reader(reader)?;
    Ok(collect_tracks(&geojson))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[2.35, 48.85], [2.36, 48.86]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [[[1.0, 2.0]], [[3.0, 4.0], [5.0, 6.0]]]
                    }
                }
            ]
        }"#;
        let tracks = parse_tracks(json.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].len(), 2);
        assert_eq!(tracks[0][0].lat, 48.85);
        assert_eq!(tracks[0][0].lon, 2.35);
        assert_eq!(tracks[1].len(), 1);
        assert_eq!(tracks[2][1].lat, 6.0);
        assert_eq!(tracks[2][1].lon, 5.0);
    }

    #[test]
    fn parse_bare_geometry() {
        let json = r#"{
            "type": "GeometryCollection",
            "geometries": [
                {"type": "LineString", "coordinates": [[10.0, 20.0], [11.0, 21.0]]}
            ]
        }"#;
        let tracks = parse_tracks(json.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0][1].lat, 21.0);
    }

    #[test]
    fn parse_invalid_geojson() {
        assert!(parse_tracks(r#"{"type": "Nothing"}"#.as_bytes()).is_err());
    }
}
