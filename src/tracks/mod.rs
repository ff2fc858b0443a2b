//! Module to read GPS tracks from files, to replay them on the map.

pub mod geojson;
pub mod gpx;
