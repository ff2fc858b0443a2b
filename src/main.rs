//! Tilemosaic - replay positions over a tile mosaic, and save the result.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cli;
mod headless;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, TrackParams};
use headless::{HeadlessRenderer, Object};
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;
use tilemosaic::config::MosaicConfig;
use tilemosaic::map::projection::LatLon;
use tilemosaic::platform::NativePlatform;
use tilemosaic::tracks::{geojson, gpx};
use tilemosaic::TileMap;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Cli {
        track_params,
        map_provider,
        lat,
        lon,
        zoom,
        interval_ms,
        step,
        view_size,
        accuracy_m,
        grid_size,
        tile_size,
        idle_timeout_ms,
        output,
    } = Cli::parse();

    let positions = match &track_params {
        None => vec![LatLon { lat, lon }],
        Some(TrackParams::Gpx(params)) => gpx::read_track(&params.file)?,
        Some(TrackParams::Geojson(params)) => geojson::read_tracks(&params.file)?
            .into_iter()
            .flatten()
            .collect(),
    };
    let Some(&last) = positions.last() else {
        bail!("No position to replay");
    };
    info!("Replaying {} positions at zoom level {zoom}", positions.len());

    let config = MosaicConfig {
        grid_size: grid_size as usize,
        tile_size: tile_size as usize,
        ..MosaicConfig::default()
    };
    let (width, height) = (view_size[0], view_size[1]);
    let renderer = HeadlessRenderer::new(width, height, map_provider.byte_order);
    let platform = NativePlatform::new(&map_provider)?;
    let mut map = TileMap::new(map_provider, config, platform, renderer, Object::Chart)
        .context("Failed to create the tile map")?;
    map.set_view_size(width as i32, height as i32);

    let interval = Duration::from_millis(interval_ms);
    let replayed = positions
        .iter()
        .step_by(step as usize)
        .chain(std::iter::once(&last));
    for position in replayed {
        map.update_position(position.lat, position.lon, zoom);
        if let Some(size) = map.meters_to_pixels(2.0 * accuracy_m) {
            map.lock_scene().renderer_mut().set_marker_size(size);
        }
        map.offset_object_to(Object::Marker, position.lat, position.lon);
        debug!(
            "Position {position:?}, mosaic at {:?}, {} pending jobs",
            map.image_offset(),
            map.pending_jobs()
        );
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    if !map.wait_idle(Duration::from_millis(idle_timeout_ms)) {
        warn!(
            "Timed out waiting for tiles, {} jobs still pending",
            map.pending_jobs()
        );
    }

    {
        let scene = map.lock_scene();
        let screen = scene.renderer().compose(scene.mosaic())?;
        screen
            .save(&output)
            .with_context(|| format!("Failed to write the screen to: {}", output.display()))?;
        info!(
            "Saved the screen to {} after {} invalidations",
            output.display(),
            scene.renderer().invalidations()
        );
    }

    map.shutdown();
    Ok(())
}
