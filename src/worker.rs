//! Background worker applying [`TileJob`]s to the mosaic.

use crate::config::{MapProvider, TileFormat};
use crate::map::job_channel::JobReceiver;
use crate::map::tile_grid::{GridCell, TileGrid, TileJob};
use crate::map::tiles::TileIndex;
use crate::platform::Platform;
use crate::render::pixels::{decode_png, rgba_to_rgb565};
use crate::render::throttle::Throttle;
use crate::render::{Renderer, Scene, SharedScene};
use crate::util::lock;
use anyhow::{bail, Context};
use log::{debug, error, info, trace, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What processing a job did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// Pixels were moved between two cells.
    Moved,
    /// A tile was downloaded and written into its cell.
    Written,
    /// The cell already held the tile, nothing was downloaded.
    Superseded,
    /// The tile lies beyond the North or South edge of the world, nothing was
    /// downloaded.
    OffPlanet,
    /// The download failed.
    FetchFailed,
    /// The downloaded tile couldn't be decoded or had the wrong size.
    Malformed,
    /// The grid moved on while the tile was downloading, so it was dropped.
    Outdated,
}

/// Worker draining the job channel on a background thread.
///
/// This is the only writer of the mosaic, so mosaic updates never race with
/// each other. They only need to exclude the renderer, via the render lock.
pub struct FetchWorker<P, R> {
    /// Host capabilities.
    platform: P,
    /// Provider to fetch the tiles from.
    map_provider: MapProvider,
    /// Tiles assigned to each cell of the mosaic.
    grid: Arc<Mutex<TileGrid>>,
    /// Mosaic and renderer, behind the render lock.
    scene: SharedScene<R>,
    /// Rate limiter for screen invalidations.
    throttle: Throttle,
}

impl<P: Platform, R: Renderer> FetchWorker<P, R> {
    /// Creates a new worker.
    pub fn new(
        platform: P,
        map_provider: MapProvider,
        grid: Arc<Mutex<TileGrid>>,
        scene: SharedScene<R>,
        invalidate_interval: Duration,
    ) -> Self {
        Self {
            platform,
            map_provider,
            grid,
            scene,
            throttle: Throttle::new(invalidate_interval),
        }
    }

    /// Loop that processes the jobs received on the given channel.
    ///
    /// This loop terminates when the sending side of the channel is dropped.
    /// Once the channel is closed, remaining jobs are discarded.
    pub fn run(mut self, jobs: JobReceiver) {
        info!("Starting fetch worker");
        while let Some(job) = jobs.recv() {
            if jobs.is_closed() {
                trace!("Discarding {job:?}");
            } else {
                let outcome = self.process(job);
                trace!("{job:?} => {outcome:?}");
            }
            jobs.complete();
        }
        info!("End of FetchWorker::run");
    }

    /// Processes the given job.
    pub fn process(&mut self, job: TileJob) -> JobOutcome {
        match job {
            TileJob::Move { src, dst } => self.move_tile(src, dst),
            TileJob::Fetch {
                cell,
                index,
                generation,
            } => self.fetch_tile(cell, index, generation),
        }
    }

    /// Moves the pixels of the `src` cell into the `dst` cell.
    fn move_tile(&mut self, src: GridCell, dst: GridCell) -> JobOutcome {
        debug!("Moving tile from {src:?} to {dst:?}");
        let mut scene = lock(&self.scene);
        scene.mosaic_mut().shift_tile(src, dst);
        Self::invalidate(&mut self.throttle, &self.platform, &mut scene);
        JobOutcome::Moved
    }

    /// Downloads the given tile and writes it into the given cell, unless the
    /// cell already holds it.
    ///
    /// Fetches requested before the last scroll of the grid are dropped: the
    /// moves of that scroll are queued behind them, so the cell they target
    /// would be overwritten. The newer grid update requested the tile again.
    fn fetch_tile(&mut self, cell: GridCell, index: TileIndex, generation: u64) -> JobOutcome {
        {
            let grid = lock(&self.grid);
            if grid.get(cell) == Some(index) {
                debug!("Cell {cell:?} already holds tile {index:?}");
                return JobOutcome::Superseded;
            }
            if grid.generation() != generation {
                debug!("Grid scrolled since tile {index:?} was requested");
                return JobOutcome::Outdated;
            }
        }
        if !index.is_on_planet() {
            debug!("Tile {index:?} is beyond the edge of the world");
            return JobOutcome::OffPlanet;
        }

        let body = match self.download(&index) {
            Ok(body) => body,
            Err(e) => {
                error!("Requesting tile {index:?} returned an error: {e:#}");
                return JobOutcome::FetchFailed;
            }
        };
        let tile = match self.decode(&index, body) {
            Ok(tile) => tile,
            Err(e) => {
                warn!("{e:#}");
                return JobOutcome::Malformed;
            }
        };

        // Lock order: scene, then grid.
        let mut scene = lock(&self.scene);
        let mut grid = lock(&self.grid);
        if grid.generation() != generation || grid.expected(cell) != Some(index) {
            debug!("Tile {index:?} is no longer wanted in cell {cell:?}");
            return JobOutcome::Outdated;
        }

        if let Err(e) = scene.mosaic_mut().write_tile(cell, &tile) {
            warn!("Rejecting tile {index:?}: {e}");
            return JobOutcome::Malformed;
        }
        grid.set(cell, Some(index));
        drop(grid);

        Self::invalidate(&mut self.throttle, &self.platform, &mut scene);
        JobOutcome::Written
    }

    /// Fetches the given tile from the network.
    fn download(&self, index: &TileIndex) -> anyhow::Result<Vec<u8>> {
        let url = index.url(&self.map_provider.url_template);
        debug!(
            "Fetching tile {}/{}/{} from {url}",
            index.z, index.x, index.y
        );

        let response = self.platform.get(&url)?;
        if !response.is_ok() {
            bail!(
                "Tile server replied with status code {} for tile {index:?}",
                response.status
            );
        }
        Ok(response.body)
    }

    /// Converts a downloaded tile into RGB565 pixels.
    fn decode(&self, index: &TileIndex, body: Vec<u8>) -> anyhow::Result<Vec<u8>> {
        match self.map_provider.tile_format {
            TileFormat::Raw565 => Ok(body),
            TileFormat::Png => {
                let rgba = decode_png(&body)
                    .with_context(|| format!("Failed to decode PNG data for tile: {index:?}"))?;
                Ok(rgba_to_rgb565(&rgba, self.map_provider.byte_order))
            }
        }
    }

    /// Requests a redraw of the screen, unless one was requested recently.
    fn invalidate(throttle: &mut Throttle, platform: &P, scene: &mut Scene<R>) {
        if throttle.ready(platform.now_millis()) {
            scene.renderer_mut().invalidate_screen();
        }
    }
}
