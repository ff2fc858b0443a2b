//! Configuration utilities.

use crate::render::pixels::ByteOrder;
use anyhow::{ensure, Context};
use clap::builder;
use clap::error::ErrorKind;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Format of the tiles served by a [`MapProvider`].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    /// Raw RGB565 pixels, 2 bytes per pixel, row by row.
    #[default]
    Raw565,
    /// PNG image, converted to RGB565 once downloaded.
    Png,
}

/// Description of a web service providing tiles.
#[derive(Clone, Debug, Deserialize)]
pub struct MapProvider {
    /// URL of each tile, where the first occurrences of `{x}`, `{y}` and `{z}`
    /// are substituted by the tile's indices and zoom level.
    pub url_template: String,
    /// Format of the tiles returned by the server.
    #[serde(default)]
    pub tile_format: TileFormat,
    /// Byte order of the RGB565 pixels, both in the mosaic and in raw tiles.
    #[serde(default)]
    pub byte_order: ByteOrder,
    /// Maximum duration of each tile request, in milliseconds.
    #[serde(default = "MapProvider::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Referer HTTP header to attach to each tile request.
    pub referer: Option<String>,
    /// User-agent HTTP header to attach to each tile request.
    pub user_agent: Option<String>,
}

impl MapProvider {
    /// Creates a configuration for raw RGB565 tiles at the given URL template,
    /// with default settings.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            tile_format: TileFormat::default(),
            byte_order: ByteOrder::default(),
            timeout_ms: Self::default_timeout_ms(),
            referer: None,
            user_agent: None,
        }
    }

    /// Returns the timeout of each tile request.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn default_timeout_ms() -> u64 {
        2000
    }

    /// Reads a map provider configuration from the given JSON file.
    fn read_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| {
            format!(
                "Failed to read map provider configuration from: {}",
                path.display()
            )
        })?;
        let reader = BufReader::new(file);
        let provider: Self = serde_json::from_reader(reader).with_context(|| {
            format!(
                "Failed to parse map provider configuration from: {}",
                path.display()
            )
        })?;

        Ok(provider)
    }
}

/// Helper struct to parse a [`MapProvider`] configuration directly from a Clap
/// argument.
#[derive(Clone)]
pub struct MapProviderParser;

impl builder::TypedValueParser for MapProviderParser {
    type Value = MapProvider;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        MapProvider::read_from_file(value).map_err(|e| {
            let arg_str = arg.map(|a| a.to_string());
            let msg = format!(
                "Failed to parse map provider configuration{}{}: {}\n",
                arg_str.map(|a| format!(" ({})", a)).unwrap_or_default(),
                value
                    .to_str()
                    .map(|f| format!(" from file `{}`", f))
                    .unwrap_or_default(),
                e
            );
            clap::Error::raw(ErrorKind::Io, msg).with_cmd(cmd)
        })
    }
}

impl builder::ValueParserFactory for MapProvider {
    type Parser = MapProviderParser;

    fn value_parser() -> Self::Parser {
        MapProviderParser
    }
}

/// Layout of the mosaic and timing of its updates.
#[derive(Clone, Debug)]
pub struct MosaicConfig {
    /// Number of tiles along each axis of the grid. Must be odd.
    pub grid_size: usize,
    /// Width and height of each tile, in pixels.
    pub tile_size: usize,
    /// Minimum duration between two screen invalidations.
    pub invalidate_interval: Duration,
    /// Initial value of every byte of the mosaic.
    pub fill_byte: u8,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            tile_size: 256,
            invalidate_interval: Duration::from_millis(80),
            fill_byte: 128,
        }
    }
}

impl MosaicConfig {
    /// Checks that the grid has a center cell and that tiles aren't empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.grid_size % 2 == 1,
            "Grid size must be odd, got {}",
            self.grid_size
        );
        ensure!(self.tile_size > 0, "Tile size must be positive");
        Ok(())
    }
}
