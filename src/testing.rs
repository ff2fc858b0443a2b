//! Fake host collaborators for unit tests.

use crate::map::projection::Point;
use crate::platform::{HttpResponse, Platform};
use crate::render::mosaic::{MosaicBuffer, BYTES_PER_PIXEL};
use crate::render::Renderer;
use crate::util::lock;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tile size used in tests, small enough to compare whole mosaics.
pub const TILE_SIZE: usize = 4;

/// Raw tile served by [`FakePlatform`] for tile `(x, y)`. Every byte is odd,
/// so it never matches a blank or default-filled mosaic.
pub fn fake_tile(x: i32, y: i32) -> Vec<u8> {
    let seed = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(7));
    (0..TILE_SIZE * TILE_SIZE * BYTES_PER_PIXEL)
        .map(|i| seed.wrapping_add(i as i32) as u8 | 1)
        .collect()
}

/// The tile as it appears in the mosaic once written, with its top row and
/// left column blanked.
pub fn blanked(mut tile: Vec<u8>) -> Vec<u8> {
    let row = TILE_SIZE * BYTES_PER_PIXEL;
    tile[..row].fill(0);
    for y in 1..TILE_SIZE {
        tile[y * row..y * row + BYTES_PER_PIXEL].fill(0);
    }
    tile
}

#[derive(Default)]
struct FakeState {
    fetched: Vec<String>,
    now: u64,
    status: Option<u16>,
    unreachable: bool,
    payload_len: Option<usize>,
    body: Option<Vec<u8>>,
}

/// Platform serving [`fake_tile()`]s for URLs ending in `/{x}/{y}`, and
/// recording every request.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs requested so far.
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.state).fetched.clone()
    }

    pub fn set_now(&self, now: u64) {
        lock(&self.state).now = now;
    }

    pub fn set_status(&self, status: u16) {
        lock(&self.state).status = Some(status);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.state).unreachable = unreachable;
    }

    /// Truncates or pads served tiles to the given length.
    pub fn set_payload_len(&self, len: usize) {
        lock(&self.state).payload_len = Some(len);
    }

    /// Serves the given body for every URL.
    pub fn set_body(&self, body: Vec<u8>) {
        lock(&self.state).body = Some(body);
    }
}

impl Platform for FakePlatform {
    fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let mut state = lock(&self.state);
        state.fetched.push(url.to_string());
        if state.unreachable {
            bail!("Connection refused: {url}");
        }

        let body = match &state.body {
            Some(body) => body.clone(),
            None => {
                let mut parts = url.rsplit('/');
                let y = parts.next().and_then(|y| y.parse().ok()).unwrap_or(0);
                let x = parts.next().and_then(|x| x.parse().ok()).unwrap_or(0);
                let mut tile = fake_tile(x, y);
                if let Some(len) = state.payload_len {
                    tile.resize(len, 1);
                }
                tile
            }
        };

        Ok(HttpResponse {
            status: state.status.unwrap_or(200),
            body,
        })
    }

    fn now_millis(&self) -> u64 {
        lock(&self.state).now
    }
}

/// Renderer recording the calls it receives.
#[derive(Default)]
pub struct FakeRenderer {
    /// Number of screen invalidations.
    pub invalidations: usize,
    /// Last position of each object.
    pub positions: HashMap<u32, Point<i32>>,
    /// Dimensions of the images passed to `set_image_source()`.
    pub sources: Vec<(u32, u32, u32)>,
    /// Size of each object, (0, 0) if absent.
    pub sizes: HashMap<u32, Point<i32>>,
}

impl Renderer for FakeRenderer {
    type Object = u32;

    fn set_image_source(&mut self, object: u32, mosaic: &MosaicBuffer) {
        self.sources.push((object, mosaic.width(), mosaic.height()));
    }

    fn set_position(&mut self, object: u32, x: i32, y: i32) {
        self.positions.insert(object, Point { x, y });
    }

    fn size(&self, object: u32) -> Point<i32> {
        self.sizes.get(&object).copied().unwrap_or_default()
    }

    fn invalidate_screen(&mut self) {
        self.invalidations += 1;
    }
}
