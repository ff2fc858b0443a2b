//! A square grid of tiles centered on the viewport, at a given zoom level.
//!
//! The grid records which tile is (or is about to be) rendered in each region
//! of the mosaic. Each position update scrolls the grid when the center tile
//! changes, and returns the [`TileJob`]s needed to bring the mosaic's pixels
//! in line with the new assignments.

use super::projection::{project, Point};
use super::tiles::TileIndex;
use log::{debug, info, trace};

/// Position of a cell within the grid, from the top-left corner.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GridCell {
    /// Column, from West to East.
    pub gx: usize,
    /// Row, from North to South.
    pub gy: usize,
}

/// Unit of work for the fetch worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileJob {
    /// Relocate the pixels already cached in `src` into `dst`.
    Move {
        /// Cell to copy pixels from.
        src: GridCell,
        /// Cell to copy pixels to.
        dst: GridCell,
    },
    /// Download a tile and write it into a cell.
    Fetch {
        /// Cell to write the tile into.
        cell: GridCell,
        /// Tile to download.
        index: TileIndex,
        /// [Generation](TileGrid::generation()) of the grid when the job was
        /// created. The cell is only meaningful as long as the grid didn't
        /// scroll since then.
        generation: u64,
    },
}

impl TileJob {
    /// Checks whether this is a [`TileJob::Move`].
    pub fn is_move(&self) -> bool {
        matches!(self, TileJob::Move { .. })
    }

    /// Checks whether this is a [`TileJob::Fetch`].
    pub fn is_fetch(&self) -> bool {
        matches!(self, TileJob::Fetch { .. })
    }
}

/// Assignment of tiles to the cells of the grid.
#[derive(Clone, Debug)]
pub struct TileGrid {
    /// Number of cells along each axis. Always odd.
    size: usize,
    /// Tile held by each cell, in row-major order. `None` for cells that have
    /// no content yet.
    cells: Box<[Option<TileIndex>]>,
    /// Continuous tile coordinates of the viewport center.
    center: Point<f64>,
    /// Center tile of the last update, or `None` before the first update.
    center_tile: Option<Point<i32>>,
    /// Tile expected in the top-left cell.
    origin: Point<i32>,
    /// Zoom level of the last update.
    zoom: Option<u32>,
    /// Number of times the cell assignments were scrolled or reset.
    generation: u64,
}

impl TileGrid {
    /// Creates an empty grid with `size` cells along each axis.
    ///
    /// The size must be odd, so that the grid has a center cell.
    pub fn new(size: usize) -> Self {
        debug_assert!(size % 2 == 1, "grid size must be odd, got {size}");
        Self {
            size,
            cells: vec![None; size * size].into_boxed_slice(),
            center: Point::default(),
            center_tile: None,
            origin: Point::default(),
            zoom: None,
            generation: 0,
        }
    }

    /// Returns the number of cells along each axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the continuous tile coordinates of the viewport center.
    pub fn center(&self) -> Point<f64> {
        self.center
    }

    /// Returns the tile expected in the top-left cell.
    pub fn origin(&self) -> Point<i32> {
        self.origin
    }

    /// Returns the current zoom level, or `None` before the first update.
    pub fn zoom(&self) -> Option<u32> {
        self.zoom
    }

    /// Returns the number of times the cell assignments were scrolled or
    /// reset so far.
    ///
    /// Pixels of the mosaic only follow a scroll once the corresponding
    /// [`TileJob::Move`]s are processed, so a fetch from an older generation
    /// can't tell where its tile belongs anymore.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterates over all cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> {
        let size = self.size;
        (0..size).flat_map(move |gy| (0..size).map(move |gx| GridCell { gx, gy }))
    }

    /// Returns the cell at the given signed position, or `None` if it lies
    /// outside of the grid.
    pub fn cell_at(&self, gx: i32, gy: i32) -> Option<GridCell> {
        let size = self.size as i32;
        if (0..size).contains(&gx) && (0..size).contains(&gy) {
            Some(GridCell {
                gx: gx as usize,
                gy: gy as usize,
            })
        } else {
            None
        }
    }

    /// Returns the tile currently assigned to the given cell.
    pub fn get(&self, cell: GridCell) -> Option<TileIndex> {
        self.cells[self.slot(cell)]
    }

    /// Assigns a tile to the given cell.
    pub fn set(&mut self, cell: GridCell, index: Option<TileIndex>) {
        let slot = self.slot(cell);
        self.cells[slot] = index;
    }

    /// Returns the tile that the given cell should hold at the current origin
    /// and zoom level.
    pub fn expected(&self, cell: GridCell) -> Option<TileIndex> {
        self.zoom.map(|z| TileIndex {
            z,
            x: self.origin.x + cell.gx as i32,
            y: self.origin.y + cell.gy as i32,
        })
    }

    /// Re-centers the grid on the given position, and returns the jobs needed
    /// to update the mosaic.
    ///
    /// All the [`TileJob::Move`]s come before the [`TileJob::Fetch`]es. Cell
    /// assignments are updated right away for moved tiles, before the pixels
    /// are actually relocated; the fetch worker reconciles this by skipping
    /// fetches for cells that already hold the requested tile.
    pub fn update(&mut self, lat: f64, lon: f64, zoom: u32) -> Vec<TileJob> {
        let center = project(lat, lon, zoom);
        let center_tile = center.floor();

        let previous = match self.center_tile {
            Some(previous) if self.zoom == Some(zoom) => previous,
            _ => {
                if let Some(old_zoom) = self.zoom {
                    info!("Zoom level changed from {old_zoom} to {zoom}, resetting the grid");
                }
                self.cells.fill(None);
                self.generation += 1;
                center_tile
            }
        };

        let mut jobs = Vec::new();

        let delta = center_tile - previous;
        if delta != Point::default() {
            info!("Center tile moved by {},{}", delta.x, delta.y);
            self.shift(delta, &mut jobs);
            self.generation += 1;
        }
        let moves = jobs.len();

        let half = (self.size / 2) as i32;
        self.origin = center_tile - Point { x: half, y: half };
        self.center = center;
        self.zoom = Some(zoom);

        for cell in self.cells() {
            let expected = TileIndex {
                z: zoom,
                x: self.origin.x + cell.gx as i32,
                y: self.origin.y + cell.gy as i32,
            };
            if self.get(cell) != Some(expected) {
                trace!("Cell {cell:?} is missing tile {expected:?}");
                jobs.push(TileJob::Fetch {
                    cell,
                    index: expected,
                    generation: self.generation,
                });
            }
        }

        self.center_tile = Some(center_tile);

        debug!(
            "Grid update at {center:?}: {moves} moves, {} fetches",
            jobs.len() - moves
        );
        jobs
    }

    /// Scrolls the cell assignments by `-delta`, emitting a move job for each
    /// cell whose content is still within the grid.
    ///
    /// The scan direction along each axis follows the sign of `delta`, so that
    /// applying the moves in order never overwrites a cell before it was
    /// copied.
    fn shift(&mut self, delta: Point<i32>, jobs: &mut Vec<TileJob>) {
        let old = self.cells.clone();
        let xs = Self::scan_order(self.size, delta.x);
        let ys = Self::scan_order(self.size, delta.y);

        for &gy in &ys {
            for &gx in &xs {
                let dst = GridCell { gx, gy };
                let slot = self.slot(dst);
                match self.cell_at(gx as i32 + delta.x, gy as i32 + delta.y) {
                    Some(src) => {
                        let moved = old[self.slot(src)];
                        self.cells[slot] = moved;
                        jobs.push(TileJob::Move { src, dst });
                    }
                    None => self.cells[slot] = None,
                }
            }
        }
    }

    /// Returns the indices along one axis, in the order to process them when
    /// shifting by `delta` along this axis.
    fn scan_order(size: usize, delta: i32) -> Vec<usize> {
        if delta < 0 {
            (0..size).rev().collect()
        } else {
            (0..size).collect()
        }
    }

    /// Index of the given cell in the row-major `cells` array.
    fn slot(&self, cell: GridCell) -> usize {
        cell.gy * self.size + cell.gx
    }
}
