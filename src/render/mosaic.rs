//! The mosaic: a single pixel buffer holding a square grid of tiles.
//!
//! Pixels are stored as RGB565, i.e. 2 bytes per pixel, row by row. The tile in
//! grid cell `(gx, gy)` occupies the square region starting at pixel
//! `(gx * tile_size, gy * tile_size)`.

use crate::map::tile_grid::GridCell;
use anyhow::ensure;

/// Number of bytes per pixel in the mosaic and in tile payloads.
pub const BYTES_PER_PIXEL: usize = 2;

/// Pixel buffer holding a grid of tiles.
pub struct MosaicBuffer {
    /// Number of tiles along each axis.
    grid_size: usize,
    /// Width and height of each tile, in pixels.
    tile_size: usize,
    /// Pixels, row by row.
    pixels: Box<[u8]>,
}

impl MosaicBuffer {
    /// Returns the number of bytes needed to hold a mosaic of the given
    /// dimensions.
    pub fn byte_len(grid_size: usize, tile_size: usize) -> usize {
        let side = grid_size * tile_size;
        side * side * BYTES_PER_PIXEL
    }

    /// Creates a mosaic over the given storage, which must hold exactly
    /// [`Self::byte_len()`] bytes. Every byte is initialized to `fill`.
    pub fn new(
        mut pixels: Vec<u8>,
        grid_size: usize,
        tile_size: usize,
        fill: u8,
    ) -> anyhow::Result<Self> {
        let expected = Self::byte_len(grid_size, tile_size);
        ensure!(
            pixels.len() == expected,
            "Mosaic storage has {} bytes, expected {expected}",
            pixels.len()
        );
        pixels.fill(fill);
        Ok(Self {
            grid_size,
            tile_size,
            pixels: pixels.into_boxed_slice(),
        })
    }

    /// Returns the width of the mosaic, in pixels.
    pub fn width(&self) -> u32 {
        (self.grid_size * self.tile_size) as u32
    }

    /// Returns the height of the mosaic, in pixels.
    pub fn height(&self) -> u32 {
        self.width()
    }

    /// Returns the number of bytes between two consecutive rows.
    pub fn stride(&self) -> usize {
        self.grid_size * self.tile_size * BYTES_PER_PIXEL
    }

    /// Returns the number of bytes of a tile payload.
    pub fn tile_len(&self) -> usize {
        self.tile_size * self.tile_size * BYTES_PER_PIXEL
    }

    /// Returns the raw pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns a copy of the region of the given cell, in the same layout as a
    /// tile payload.
    pub fn read_tile(&self, cell: GridCell) -> Vec<u8> {
        let row = self.tile_size * BYTES_PER_PIXEL;
        let base = self.cell_offset(cell);
        let mut tile = Vec::with_capacity(self.tile_len());
        for y in 0..self.tile_size {
            let start = base + y * self.stride();
            tile.extend_from_slice(&self.pixels[start..start + row]);
        }
        tile
    }

    /// Writes the given tile payload into the region of the given cell.
    ///
    /// The payload must hold exactly [`Self::tile_len()`] bytes, otherwise the
    /// mosaic is left untouched and an error is returned. The top row and left
    /// column of the region are blanked rather than copied.
    pub fn write_tile(&mut self, cell: GridCell, tile: &[u8]) -> anyhow::Result<()> {
        ensure!(
            tile.len() == self.tile_len(),
            "Tile payload has {} bytes, expected {}",
            tile.len(),
            self.tile_len()
        );

        self.blank_leading_edge(cell);

        let row = self.tile_size * BYTES_PER_PIXEL;
        let base = self.cell_offset(cell);
        let stride = self.stride();
        for y in 1..self.tile_size {
            let dst = base + y * stride;
            self.pixels[dst + BYTES_PER_PIXEL..dst + row]
                .copy_from_slice(&tile[y * row + BYTES_PER_PIXEL..(y + 1) * row]);
        }
        Ok(())
    }

    /// Copies the region of the `src` cell into the region of the `dst` cell.
    ///
    /// The top row and left column of the destination are blanked rather than
    /// copied.
    pub fn shift_tile(&mut self, src: GridCell, dst: GridCell) {
        if src == dst {
            return;
        }

        self.blank_leading_edge(dst);

        let row = self.tile_size * BYTES_PER_PIXEL;
        let src_base = self.cell_offset(src);
        let dst_base = self.cell_offset(dst);
        let stride = self.stride();
        for y in 1..self.tile_size {
            let from = src_base + y * stride;
            let to = dst_base + y * stride;
            self.pixels
                .copy_within(from + BYTES_PER_PIXEL..from + row, to + BYTES_PER_PIXEL);
        }
    }

    /// Zeroes the top row and the left column of the given cell.
    fn blank_leading_edge(&mut self, cell: GridCell) {
        let row = self.tile_size * BYTES_PER_PIXEL;
        let base = self.cell_offset(cell);
        let stride = self.stride();
        self.pixels[base..base + row].fill(0);
        for y in 1..self.tile_size {
            let start = base + y * stride;
            self.pixels[start..start + BYTES_PER_PIXEL].fill(0);
        }
    }

    /// Byte offset of the top-left pixel of the given cell.
    fn cell_offset(&self, cell: GridCell) -> usize {
        debug_assert!(cell.gx < self.grid_size && cell.gy < self.grid_size);
        cell.gy * self.tile_size * self.stride() + cell.gx * self.tile_size * BYTES_PER_PIXEL
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GRID: usize = 3;
    const TILE: usize = 4;
    const FILL: u8 = 128;

    fn mosaic() -> MosaicBuffer {
        MosaicBuffer::new(vec![0; MosaicBuffer::byte_len(GRID, TILE)], GRID, TILE, FILL).unwrap()
    }

    /// A tile whose bytes all differ from each other and from the fill value.
    fn tile(seed: u8) -> Vec<u8> {
        (0..TILE * TILE * BYTES_PER_PIXEL)
            .map(|i| seed.wrapping_add(i as u8) | 1)
            .collect()
    }

    /// The tile as it should appear in the mosaic, with blank leading edges.
    fn blanked(mut tile: Vec<u8>) -> Vec<u8> {
        let row = TILE * BYTES_PER_PIXEL;
        tile[..row].fill(0);
        for y in 1..TILE {
            tile[y * row..y * row + BYTES_PER_PIXEL].fill(0);
        }
        tile
    }

    fn cell(gx: usize, gy: usize) -> GridCell {
        GridCell { gx, gy }
    }

    #[test]
    fn mosaic_new() {
        let mosaic = mosaic();
        assert_eq!(mosaic.width(), 12);
        assert_eq!(mosaic.height(), 12);
        assert_eq!(mosaic.stride(), 24);
        assert_eq!(mosaic.tile_len(), 32);
        assert_eq!(mosaic.pixels().len(), 288);
        assert!(mosaic.pixels().iter().all(|&b| b == FILL));
    }

    #[test]
    fn mosaic_new_wrong_size() {
        assert!(MosaicBuffer::new(vec![0; 287], GRID, TILE, FILL).is_err());
    }

    #[test]
    fn mosaic_write_tile() {
        let mut mosaic = mosaic();
        let t = tile(10);
        mosaic.write_tile(cell(1, 2), &t).unwrap();

        assert_eq!(mosaic.read_tile(cell(1, 2)), blanked(t.clone()));
        // Second row of the tile, without its first pixel, lands at pixel
        // (1 * 4 + 1, 2 * 4 + 1) of the mosaic.
        let offset = ((2 * TILE + 1) * GRID * TILE + TILE + 1) * BYTES_PER_PIXEL;
        let row = TILE * BYTES_PER_PIXEL;
        assert_eq!(
            &mosaic.pixels()[offset..offset + row - BYTES_PER_PIXEL],
            &t[row + BYTES_PER_PIXEL..2 * row]
        );

        for other in [cell(0, 0), cell(2, 2), cell(1, 1), cell(0, 2), cell(2, 1)] {
            assert!(mosaic.read_tile(other).iter().all(|&b| b == FILL));
        }
    }

    #[test]
    fn mosaic_cells_do_not_overlap() {
        let mut mosaic = mosaic();
        for gy in 0..GRID {
            for gx in 0..GRID {
                let seed = (gy * GRID + gx) as u8 * 20;
                mosaic.write_tile(cell(gx, gy), &tile(seed)).unwrap();
            }
        }
        for gy in 0..GRID {
            for gx in 0..GRID {
                let seed = (gy * GRID + gx) as u8 * 20;
                assert_eq!(mosaic.read_tile(cell(gx, gy)), blanked(tile(seed)));
            }
        }

        // The last row of cell (0, 1) ends right before the first row of
        // cell (0, 2).
        let end = (2 * TILE * GRID * TILE) * BYTES_PER_PIXEL;
        let last_row = &mosaic.pixels()[end - GRID * TILE * BYTES_PER_PIXEL..];
        assert_eq!(
            &last_row[BYTES_PER_PIXEL..TILE * BYTES_PER_PIXEL],
            &tile(3 * 20)[(TILE - 1) * TILE * BYTES_PER_PIXEL + BYTES_PER_PIXEL..]
        );
    }

    #[test]
    fn mosaic_write_tile_rejects_bad_length() {
        let mut mosaic = mosaic();
        let mut t = tile(10);
        t.pop();
        assert!(mosaic.write_tile(cell(1, 1), &t).is_err());
        assert!(mosaic.write_tile(cell(1, 1), &[]).is_err());
        assert!(mosaic.pixels().iter().all(|&b| b == FILL));
    }

    #[test]
    fn mosaic_shift_tile() {
        let mut mosaic = mosaic();
        let t = tile(50);
        mosaic.write_tile(cell(0, 0), &t).unwrap();
        mosaic.shift_tile(cell(0, 0), cell(2, 1));

        assert_eq!(mosaic.read_tile(cell(2, 1)), blanked(t.clone()));
        // The source is left as is.
        assert_eq!(mosaic.read_tile(cell(0, 0)), blanked(t));
    }

    #[test]
    fn mosaic_shift_tile_onto_itself() {
        let mut mosaic = mosaic();
        mosaic.shift_tile(cell(1, 1), cell(1, 1));
        assert!(mosaic.pixels().iter().all(|&b| b == FILL));
    }

    #[test]
    fn mosaic_shift_row_in_place() {
        // Scroll a row of tiles one cell to the left, in the order used by the
        // grid update.
        let mut mosaic = mosaic();
        for gx in 0..GRID {
            mosaic.write_tile(cell(gx, 1), &tile(gx as u8 * 40)).unwrap();
        }
        for gx in 0..GRID - 1 {
            mosaic.shift_tile(cell(gx + 1, 1), cell(gx, 1));
        }
        for gx in 0..GRID - 1 {
            assert_eq!(
                mosaic.read_tile(cell(gx, 1)),
                blanked(tile((gx as u8 + 1) * 40))
            );
        }

        // And back to the right, scanning from the other end.
        for gx in (1..GRID).rev() {
            mosaic.shift_tile(cell(gx - 1, 1), cell(gx, 1));
        }
        assert_eq!(mosaic.read_tile(cell(2, 1)), blanked(tile(80)));
        assert_eq!(mosaic.read_tile(cell(1, 1)), blanked(tile(40)));
    }
}
