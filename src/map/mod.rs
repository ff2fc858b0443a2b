//! Geographic side of the map: projection, tile addressing, and the grid of
//! tiles kept around the viewport.

pub mod job_channel;
pub mod projection;
pub mod tile_grid;
pub mod tiles;
