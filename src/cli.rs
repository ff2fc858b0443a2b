//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tilemosaic::config::MapProvider;

/// Replay positions over a tile mosaic.
#[derive(Parser, Debug)]
#[command(name = "Tilemosaic")]
#[command(version)]
#[command(author)]
#[command(about = "Replay positions over a tile mosaic", long_about = None)]
pub struct Cli {
    /// Sub-command to load a track to replay.
    #[command(subcommand)]
    pub track_params: Option<TrackParams>,

    /// JSON file containing the map provider configuration.
    #[arg(long = "map-config", value_parser = clap::value_parser!(MapProvider))]
    pub map_provider: MapProvider,

    /// Latitude to center the map on, when no track is given.
    #[arg(long, default_value_t = 51.5007, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude to center the map on, when no track is given.
    #[arg(long, default_value_t = -0.1246, allow_negative_numbers = true)]
    pub lon: f64,

    /// Zoom level of the map.
    #[arg(long, short = 'z', default_value_t = 15,
          value_parser = clap::value_parser!(u32).range(0..=22))]
    pub zoom: u32,

    /// Delay between two replayed positions, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub interval_ms: u64,

    /// Replay only one out of this many track points.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub step: u64,

    /// Width and height of the screen.
    #[arg(long, value_delimiter = ',', num_args = 2, default_values_t = [720, 720],
          value_parser = clap::value_parser!(u32).range(16..=8192))]
    pub view_size: Vec<u32>,

    /// Accuracy of the positions, in meters, shown as the marker size.
    #[arg(long, default_value_t = 25.0)]
    pub accuracy_m: f64,

    /// Number of tiles along each axis of the mosaic. Must be odd.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=15))]
    pub grid_size: u32,

    /// Width and height of each tile, in pixels.
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(16..=1024))]
    pub tile_size: u32,

    /// Maximum time to wait for pending tiles before writing the output.
    #[arg(long, default_value_t = 30_000)]
    pub idle_timeout_ms: u64,

    /// PNG file to write the final screen to.
    #[arg(long, short = 'o', default_value = "mosaic.png")]
    pub output: PathBuf,
}

/// Parameters to load a track.
#[derive(Subcommand, Debug)]
pub enum TrackParams {
    /// Replay a track from a GPX file.
    Gpx(TrackFileParams),

    /// Replay the tracks from a GeoJSON file, one after the other.
    Geojson(TrackFileParams),
}

/// Parameters to load a track file.
#[derive(Parser, Debug)]
pub struct TrackFileParams {
    /// File to read.
    #[arg(long = "file", short = 'f')]
    pub file: PathBuf,
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }
}
