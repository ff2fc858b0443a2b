//! Binding of the mosaic to the screen: the public entry point of the tile
//! map.

use crate::config::{MapProvider, MosaicConfig};
use crate::map::job_channel::{job_channel, JobSender};
use crate::map::projection::{meters_to_pixels, pixel_offset, LatLon, Point};
use crate::map::tile_grid::{GridCell, TileGrid};
use crate::map::tiles::TileIndex;
use crate::platform::Platform;
use crate::render::mosaic::MosaicBuffer;
use crate::render::{Renderer, Scene, SharedScene};
use crate::util::{lock, warn_on_error};
use crate::worker::FetchWorker;
use anyhow::Context;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A continuously updated mosaic of map tiles around a geographic position,
/// displayed through a [`Renderer`].
///
/// Position updates are cheap: they only re-assign grid cells and enqueue
/// jobs. Tiles are downloaded and composited by a background worker thread,
/// which runs until the map is dropped.
pub struct TileMap<R: Renderer> {
    /// Layout of the mosaic.
    config: MosaicConfig,
    /// Tiles assigned to each cell of the mosaic, shared with the worker.
    grid: Arc<Mutex<TileGrid>>,
    /// Mosaic and renderer, behind the render lock.
    scene: SharedScene<R>,
    /// Channel to send jobs to the worker. `None` once stopped.
    jobs_tx: Option<JobSender>,
    /// Worker thread. `None` once stopped.
    worker: Option<JoinHandle<()>>,
    /// Object displaying the mosaic.
    chart: R::Object,
    /// Half of the viewport size, i.e. the screen position of the viewport
    /// center.
    half_view: Point<i32>,
    /// Screen position of the mosaic's top-left corner.
    image_to_view_offset: Point<i32>,
    /// Tile in the top-left cell at the last update.
    origin: Point<i32>,
    /// Position and zoom level of the last update.
    position: Option<(LatLon, u32)>,
}

impl<R: Renderer> TileMap<R> {
    /// Default viewport width and height, in pixels.
    const DEFAULT_VIEW_SIZE: i32 = 720;

    /// Creates the mosaic and starts the fetch worker.
    ///
    /// The mosaic is displayed by the `chart` object once the first position
    /// is known.
    pub fn new<P: Platform>(
        map_provider: MapProvider,
        config: MosaicConfig,
        platform: P,
        renderer: R,
        chart: R::Object,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let size = MosaicBuffer::byte_len(config.grid_size, config.tile_size);
        let mosaic = MosaicBuffer::new(
            platform.allocate(size),
            config.grid_size,
            config.tile_size,
            config.fill_byte,
        )?;
        let grid = Arc::new(Mutex::new(TileGrid::new(config.grid_size)));
        let scene = Arc::new(Mutex::new(Scene::new(mosaic, renderer)));

        let (jobs_tx, jobs_rx) = job_channel();
        let worker = FetchWorker::new(
            platform,
            map_provider,
            grid.clone(),
            scene.clone(),
            config.invalidate_interval,
        );
        let handle = thread::Builder::new()
            .name("tile-fetch".to_string())
            .spawn(move || worker.run(jobs_rx))
            .context("Failed to spawn the fetch worker thread")?;

        let half = Self::DEFAULT_VIEW_SIZE / 2;
        Ok(Self {
            config,
            grid,
            scene,
            jobs_tx: Some(jobs_tx),
            worker: Some(handle),
            chart,
            half_view: Point { x: half, y: half },
            image_to_view_offset: Point::default(),
            origin: Point::default(),
            position: None,
        })
    }

    /// Sets the size of the viewport in which the map is displayed. Takes
    /// effect at the next position update.
    pub fn set_view_size(&mut self, width: i32, height: i32) {
        self.half_view = Point {
            x: width / 2,
            y: height / 2,
        };
    }

    /// Centers the map on the given position.
    ///
    /// Cells whose tile changed are updated in the background; in the
    /// meantime they show stale or blank content.
    pub fn update_position(&mut self, lat: f64, lon: f64, zoom: u32) {
        let zoom = if zoom > TileIndex::MAX_ZOOM {
            warn!("Clamping zoom level {zoom} => {}", TileIndex::MAX_ZOOM);
            TileIndex::MAX_ZOOM
        } else {
            zoom
        };
        self.position = Some((LatLon { lat, lon }, zoom));

        let jobs = {
            let mut grid = lock(&self.grid);
            let jobs = grid.update(lat, lon, zoom);
            self.origin = grid.origin();
            jobs
        };
        if !jobs.is_empty() {
            debug!("Enqueuing {} tile jobs", jobs.len());
        }
        if let Some(jobs_tx) = &self.jobs_tx {
            warn_on_error(jobs_tx.send_jobs(jobs), "tile jobs");
        }

        let pixel = pixel_offset(lat, lon, zoom, self.origin, self.config.tile_size as u32);
        self.image_to_view_offset = self.half_view - pixel;

        let mut scene = lock(&self.scene);
        scene.show_mosaic(self.chart, self.image_to_view_offset);
    }

    /// Moves the given object so that it is centered on the given position
    /// on the map.
    pub fn offset_object_to(&self, object: R::Object, lat: f64, lon: f64) {
        let Some((_, zoom)) = self.position else {
            debug!("No position yet, not placing {object:?}");
            return;
        };
        let pixel = pixel_offset(lat, lon, zoom, self.origin, self.config.tile_size as u32);

        let mut scene = lock(&self.scene);
        scene.center_object_at(object, pixel + self.image_to_view_offset);
    }

    /// Converts a distance on the ground around the current position into
    /// pixels, or returns `None` before the first position update.
    pub fn meters_to_pixels(&self, meters: f64) -> Option<f64> {
        self.position.map(|(position, zoom)| {
            meters_to_pixels(meters, position.lat, zoom, self.config.tile_size as u32)
        })
    }

    /// Returns the tile in the top-left cell of the mosaic.
    pub fn origin(&self) -> Point<i32> {
        self.origin
    }

    /// Returns the screen position of the mosaic's top-left corner.
    pub fn image_offset(&self) -> Point<i32> {
        self.image_to_view_offset
    }

    /// Returns the tile currently assigned to the given cell.
    ///
    /// May be called while holding the guard returned by
    /// [`lock_scene()`](Self::lock_scene).
    pub fn tile_at(&self, cell: GridCell) -> Option<TileIndex> {
        lock(&self.grid).get(cell)
    }

    /// Acquires the render lock, e.g. to draw the mosaic on screen.
    ///
    /// The worker can't update the mosaic while the returned guard is alive.
    pub fn lock_scene(&self) -> MutexGuard<'_, Scene<R>> {
        lock(&self.scene)
    }

    /// Returns the number of jobs not yet processed by the worker.
    pub fn pending_jobs(&self) -> usize {
        self.jobs_tx.as_ref().map_or(0, JobSender::pending)
    }

    /// Blocks until the worker processed all jobs, or the timeout elapses.
    ///
    /// Returns whether the worker became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.jobs_tx
            .as_ref()
            .is_none_or(|jobs_tx| jobs_tx.wait_idle(timeout))
    }

    /// Stops the worker, discarding pending jobs. Blocks until the tile being
    /// downloaded, if any, is done.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// Closes the job channel and joins the worker thread.
    fn stop(&mut self) {
        if let Some(jobs_tx) = self.jobs_tx.take() {
            jobs_tx.close();
        }
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(()) => info!("Fetch worker stopped"),
                Err(e) => error!("Fetch worker panicked: {e:?}"),
            }
        }
    }
}

impl<R: Renderer> Drop for TileMap<R> {
    fn drop(&mut self) {
        self.stop();
    }
}
