//! Tilemosaic - a scrolling mosaic of map tiles around a moving position.
//!
//! A [`TileMap`] keeps a square grid of web map tiles centered on the current
//! position, stitched into a single RGB565 image. When the position changes,
//! tiles still in view are moved within the mosaic and missing ones are
//! downloaded by a background worker, so that the host only ever needs to
//! display one image and offset it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod map;
pub mod platform;
pub mod render;
#[cfg(test)]
mod testing;
pub mod tracks;
pub mod util;
pub mod viewport;
pub mod worker;

pub use viewport::TileMap;
