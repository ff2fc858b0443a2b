//! Renderer drawing the map into an offscreen image.

use anyhow::Context;
use image::{imageops, Rgba, RgbaImage};
use log::{debug, trace};
use tilemosaic::map::projection::Point;
use tilemosaic::render::mosaic::MosaicBuffer;
use tilemosaic::render::pixels::{rgb565_to_rgba, ByteOrder};
use tilemosaic::render::Renderer;

/// Background color outside of the mosaic.
const BACKGROUND: Rgba<u8> = Rgba([0x40, 0x40, 0x40, 0xFF]);
/// Color of the position marker.
const MARKER_COLOR: Rgba<u8> = Rgba([0xE0, 0x20, 0x20, 0xFF]);
/// Minimal width and height of the position marker, in pixels.
const MIN_MARKER_SIZE: i32 = 5;

/// Objects displayed on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Object {
    /// The map mosaic.
    Chart,
    /// Square marker at the current position.
    Marker,
}

/// Renderer keeping track of object positions, to compose a screenshot on
/// demand.
pub struct HeadlessRenderer {
    /// Width and height of the screen.
    screen: Point<i32>,
    /// Byte order of the mosaic pixels.
    byte_order: ByteOrder,
    /// Top-left corner of the mosaic on screen, once shown.
    chart_position: Option<Point<i32>>,
    /// Size of the mosaic.
    chart_size: Point<i32>,
    /// Top-left corner of the marker on screen, once placed.
    marker_position: Option<Point<i32>>,
    /// Width and height of the marker.
    marker_size: i32,
    /// Number of screen invalidations.
    invalidations: usize,
}

impl HeadlessRenderer {
    /// Creates a renderer for a screen of the given size.
    pub fn new(width: u32, height: u32, byte_order: ByteOrder) -> Self {
        Self {
            screen: Point {
                x: width as i32,
                y: height as i32,
            },
            byte_order,
            chart_position: None,
            chart_size: Point::default(),
            marker_position: None,
            marker_size: MIN_MARKER_SIZE,
            invalidations: 0,
        }
    }

    /// Sets the size of the marker, e.g. to show the accuracy of the position.
    pub fn set_marker_size(&mut self, size: f64) {
        self.marker_size = (size.round() as i32).max(MIN_MARKER_SIZE);
        debug!("Marker size = {}", self.marker_size);
    }

    /// Returns the number of screen invalidations so far.
    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    /// Draws the screen, with the given mosaic as the chart.
    pub fn compose(&self, mosaic: &MosaicBuffer) -> anyhow::Result<RgbaImage> {
        let mut screen =
            RgbaImage::from_pixel(self.screen.x as u32, self.screen.y as u32, BACKGROUND);

        if let Some(position) = self.chart_position {
            let chart = rgb565_to_rgba(
                mosaic.pixels(),
                mosaic.width(),
                mosaic.height(),
                self.byte_order,
            )
            .context("Mosaic size doesn't match its dimensions")?;
            imageops::overlay(&mut screen, &chart, position.x as i64, position.y as i64);
        }

        if let Some(position) = self.marker_position {
            let marker = RgbaImage::from_pixel(
                self.marker_size as u32,
                self.marker_size as u32,
                MARKER_COLOR,
            );
            imageops::overlay(&mut screen, &marker, position.x as i64, position.y as i64);
        }

        Ok(screen)
    }
}

impl Renderer for HeadlessRenderer {
    type Object = Object;

    fn set_image_source(&mut self, object: Object, mosaic: &MosaicBuffer) {
        match object {
            Object::Chart => {
                self.chart_size = Point {
                    x: mosaic.width() as i32,
                    y: mosaic.height() as i32,
                };
            }
            Object::Marker => debug!("Ignoring image source for {object:?}"),
        }
    }

    fn set_position(&mut self, object: Object, x: i32, y: i32) {
        trace!("{object:?} at ({x}, {y})");
        let position = Some(Point { x, y });
        match object {
            Object::Chart => self.chart_position = position,
            Object::Marker => self.marker_position = position,
        }
    }

    fn size(&self, object: Object) -> Point<i32> {
        match object {
            Object::Chart => self.chart_size,
            Object::Marker => Point {
                x: self.marker_size,
                y: self.marker_size,
            },
        }
    }

    fn invalidate_screen(&mut self) {
        self.invalidations += 1;
        trace!("Screen invalidated ({} times)", self.invalidations);
    }
}
