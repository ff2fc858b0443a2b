//! Addressing of map tiles on a tile server.

/// Index of a tile in Mercator coordinates.
///
/// The x and y indices are signed: the grid of tiles around the viewport can
/// extend past the edges of the world, see [`Self::is_on_planet()`] and
/// [`Self::wrapped()`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TileIndex {
    /// Zoom level.
    pub z: u32,
    /// Index from West to East.
    pub x: i32,
    /// Index from North to South.
    pub y: i32,
}

impl TileIndex {
    /// Maximum supported zoom level, so that tile indices fit in an `i32`.
    pub const MAX_ZOOM: u32 = 30;

    /// Number of tiles along each axis at the given zoom level.
    pub fn world_tiles(z: u32) -> i32 {
        1 << z.min(Self::MAX_ZOOM)
    }

    /// Checks whether this tile lies within the North and South edges of the
    /// world.
    ///
    /// Tiles beyond the East and West edges are still on the planet, they just
    /// need to be [wrapped](Self::wrapped()).
    pub fn is_on_planet(&self) -> bool {
        self.y >= 0 && self.y < Self::world_tiles(self.z)
    }

    /// Returns the same tile with its x index wrapped around the antimeridian.
    pub fn wrapped(&self) -> TileIndex {
        TileIndex {
            z: self.z,
            x: self.x.rem_euclid(Self::world_tiles(self.z)),
            y: self.y,
        }
    }

    /// Returns the URL of this tile, given a template containing `{x}`, `{y}`
    /// and `{z}` placeholders.
    pub fn url(&self, template: &str) -> String {
        let index = self.wrapped();
        format_url(template, index.x, index.y, index.z)
    }
}

/// Substitutes the first occurrence of each of the `{x}`, `{y}` and `{z}`
/// placeholders in the given template.
pub fn format_url(template: &str, x: i32, y: i32, z: u32) -> String {
    template
        .replacen("{x}", &x.to_string(), 1)
        .replacen("{y}", &y.to_string(), 1)
        .replacen("{z}", &z.to_string(), 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_url_substitutes_placeholders() {
        assert_eq!(
            format_url("http://tiles.local:5000/{z}/{x}/{y}", 16371, 10896, 15),
            "http://tiles.local:5000/15/16371/10896"
        );
    }

    #[test]
    fn format_url_first_occurrence_only() {
        assert_eq!(format_url("{x}-{x}/{y}{y}/{z}", 1, 2, 3), "1-{x}/2{y}/3");
    }

    #[test]
    fn format_url_missing_placeholders() {
        assert_eq!(
            format_url("http://example.com/tile.raw", 1, 2, 3),
            "http://example.com/tile.raw"
        );
    }

    #[test]
    fn tile_wraps_around_antimeridian() {
        let z = 3;
        assert_eq!(TileIndex { z, x: -1, y: 2 }.wrapped(), TileIndex { z, x: 7, y: 2 });
        assert_eq!(TileIndex { z, x: 8, y: 2 }.wrapped(), TileIndex { z, x: 0, y: 2 });
        assert_eq!(TileIndex { z, x: 5, y: 2 }.wrapped(), TileIndex { z, x: 5, y: 2 });
        assert_eq!(
            TileIndex { z, x: -1, y: 2 }.url("/{z}/{x}/{y}.raw"),
            "/3/7/2.raw"
        );
    }

    #[test]
    fn tile_on_planet() {
        let z = 2;
        assert!(TileIndex { z, x: -3, y: 0 }.is_on_planet());
        assert!(TileIndex { z, x: 0, y: 3 }.is_on_planet());
        assert!(!TileIndex { z, x: 0, y: -1 }.is_on_planet());
        assert!(!TileIndex { z, x: 0, y: 4 }.is_on_planet());
    }
}
