//! Module to extract a GPS track from a GPX file.

use crate::map::projection::LatLon;
use anyhow::Context;
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Schema for a GPX file.
#[derive(Deserialize)]
struct Gpx {
    trk: GpxTrack,
}

/// Schema for a track in a GPX file.
#[derive(Deserialize)]
struct GpxTrack {
    trkseg: Vec<GpxTrackSegment>,
}

/// Schema for a segment within a GPX track.
#[derive(Deserialize)]
struct GpxTrackSegment {
    #[serde(default)]
    trkpt: Vec<GpxTrackPoint>,
}

/// Schema for a track point within a GPX track segment.
#[derive(Deserialize)]
struct GpxTrackPoint {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
}

impl From<Gpx> for Vec<LatLon> {
    fn from(gpx: Gpx) -> Self {
        gpx.trk
            .trkseg
            .iter()
            .flat_map(|segment| &segment.trkpt)
            .map(|point| LatLon {
                lat: point.lat,
                lon: point.lon,
            })
            .collect()
    }
}

/// Reads the points of the track contained in the given GPX file, all
/// segments concatenated.
pub fn read_track<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LatLon>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open GPX file: {}", path.display()))?;
    let points = parse_track(BufReader::new(file))
        .with_context(|| format!("Failed to parse GPX file: {}", path.display()))?;
    debug!("GPX track {} has {} points", path.display(), points.len());
    Ok(points)
}

/// Parses the points of a GPX track from the given reader.
pub fn parse_track<R: Read>(reader: R) -> anyhow::Result<Vec<LatLon>> {
    let gpx: Gpx = serde_xml_rs::from_reader(reader)?;
    Ok(gpx.into())
}
