//! Conversions between latitude-longitude coordinates, Mercator's projection
//! and pixels of the stitched mosaic.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Equatorial radius of the Earth in the Web-Mercator model, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Data structure representing a point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Point<T> {
    type Output = Self;

    fn mul(self, scalar: T) -> Self {
        Point {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Point<f64> {
    /// Rounds both coordinates down to the nearest integer.
    pub fn floor(self) -> Point<i32> {
        Point {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }
}

impl From<Point<i32>> for Point<f64> {
    fn from(p: Point<i32>) -> Self {
        Point {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

/// Data structure representing a latitude-longitude coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl LatLon {
    /// Converts the coordinates into Mercator's projection, where the whole
    /// world is a unit square.
    pub fn as_mercator(&self) -> Point<f64> {
        let x = 0.5 + self.lon / 360.0;
        let s = (self.lat * PI / 180.0).tan().asinh();
        let y = 0.5 - s / (2.0 * PI);

        Point { x, y }
    }
}

/// Number of tiles along each axis at the given zoom level.
fn world_tiles(zoom: u32) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Projects the given coordinates onto continuous tile coordinates at the
/// given zoom level.
///
/// The result is meaningless for latitudes at or beyond the poles, callers
/// must keep `|lat| < 90`.
pub fn project(lat: f64, lon: f64, zoom: u32) -> Point<f64> {
    LatLon { lat, lon }.as_mercator() * world_tiles(zoom)
}

/// Inverse of [`project()`]: returns the coordinates of the given continuous
/// tile position.
pub fn unproject(tile: Point<f64>, zoom: u32) -> LatLon {
    let n = world_tiles(zoom);
    let lon = tile.x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * tile.y / n)).sinh().atan() * 180.0 / PI;
    LatLon { lat, lon }
}

/// Returns the pixel position of the given coordinates inside a mosaic whose
/// top-left tile is `origin`.
pub fn pixel_offset(
    lat: f64,
    lon: f64,
    zoom: u32,
    origin: Point<i32>,
    tile_size: u32,
) -> Point<i32> {
    ((project(lat, lon, zoom) - origin.into()) * tile_size as f64).floor()
}

/// Converts a distance on the ground at the given latitude into a number of
/// pixels at the given zoom level.
pub fn meters_to_pixels(meters: f64, lat: f64, zoom: u32, tile_size: u32) -> f64 {
    let meters_per_pixel =
        (lat * PI / 180.0).cos() * 2.0 * PI * EARTH_RADIUS / (tile_size as f64 * world_tiles(zoom));
    meters / meters_per_pixel
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn project_null_island() {
        let p = project(0.0, 0.0, 0);
        assert_close(p.x, 0.5);
        assert_close(p.y, 0.5);
    }

    #[test]
    fn project_antimeridian_edge() {
        let p = project(85.05, 180.0, 1);
        assert_close(p.x, 2.0);
        assert!(p.y > 0.0 && p.y < 0.001);
    }

    #[test]
    fn project_london() {
        let tile = project(51.5074, -0.1278, 10).floor();
        assert_eq!(tile, Point { x: 511, y: 340 });
    }

    #[test]
    fn unproject_inverts_project() {
        for &(lat, lon) in &[(51.5, -0.12), (-33.86, 151.2), (0.0, 0.0), (70.0, -179.0)] {
            let back = unproject(project(lat, lon, 15), 15);
            assert!((back.lat - lat).abs() < 1e-9);
            assert!((back.lon - lon).abs() < 1e-9);
        }
    }

    #[test]
    fn pixel_offset_from_origin() {
        // Center of tile (3, 2) at zoom 3, seen from origin (1, 1).
        let center = unproject(Point { x: 3.5, y: 2.5 }, 3);
        let p = pixel_offset(center.lat, center.lon, 3, Point { x: 1, y: 1 }, 256);
        assert!((p.x - 640).abs() <= 1, "{p:?}");
        assert!((p.y - 384).abs() <= 1, "{p:?}");
    }

    #[test]
    fn meters_to_pixels_at_equator() {
        // At zoom 0, the equator spans exactly one tile.
        let circumference = 2.0 * PI * EARTH_RADIUS;
        assert_close(meters_to_pixels(circumference, 0.0, 0, 256), 256.0);
        // Each zoom level doubles the scale.
        assert_close(meters_to_pixels(circumference, 0.0, 1, 256), 512.0);
    }

    #[test]
    fn meters_to_pixels_shrinks_meters_towards_poles() {
        let equator = meters_to_pixels(100.0, 0.0, 15, 256);
        let north = meters_to_pixels(100.0, 60.0, 15, 256);
        assert_close(north, 2.0 * equator);
    }

    #[test]
    fn point_arithmetic() {
        let a = Point { x: 3, y: -2 };
        let b = Point { x: 1, y: 5 };
        assert_eq!(a + b, Point { x: 4, y: 3 });
        assert_eq!(a - b, Point { x: 2, y: -7 });
        assert_eq!(a * 2, Point { x: 6, y: -4 });
        assert_eq!(Point { x: -0.5, y: 1.5 }.floor(), Point { x: -1, y: 1 });
    }
}
