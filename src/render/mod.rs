//! Module to composite tiles into the mosaic, and to hand it over to the
//! display.

pub mod mosaic;
pub mod pixels;
pub mod throttle;

use crate::map::projection::Point;
use mosaic::MosaicBuffer;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Rendering toolkit displaying the mosaic and other objects on screen.
///
/// Implementations never draw into the mosaic: they only display it, and
/// position objects relative to the screen's top-left corner.
pub trait Renderer: Send + 'static {
    /// Handle to an object on screen.
    type Object: Copy + Debug + Send + 'static;

    /// Uses the given mosaic as the image displayed by `object`.
    ///
    /// The mosaic must only be read while the [`Scene`] is locked, i.e. during
    /// this call or when the host draws through [`Scene::mosaic()`].
    fn set_image_source(&mut self, object: Self::Object, mosaic: &MosaicBuffer);

    /// Moves the top-left corner of `object` to the given screen position.
    fn set_position(&mut self, object: Self::Object, x: i32, y: i32);

    /// Returns the (width, height) of `object`, in pixels.
    fn size(&self, object: Self::Object) -> Point<i32>;

    /// Requests a redraw of the screen.
    fn invalidate_screen(&mut self);
}

/// The mosaic together with the renderer displaying it.
///
/// Both are only ever accessed through a [`SharedScene`], whose lock is the
/// render lock: holding it guarantees that no tile is half-written into the
/// mosaic, and that no object is repositioned mid-frame.
pub struct Scene<R> {
    /// Stitched tiles.
    mosaic: MosaicBuffer,
    /// Rendering toolkit.
    renderer: R,
}

/// A [`Scene`] behind the render lock.
pub type SharedScene<R> = Arc<Mutex<Scene<R>>>;

impl<R: Renderer> Scene<R> {
    /// Creates a new scene.
    pub fn new(mosaic: MosaicBuffer, renderer: R) -> Self {
        Self { mosaic, renderer }
    }

    /// Returns the mosaic, e.g. to draw it on screen.
    pub fn mosaic(&self) -> &MosaicBuffer {
        &self.mosaic
    }

    /// Returns the mosaic for the compositor to update it.
    pub fn mosaic_mut(&mut self) -> &mut MosaicBuffer {
        &mut self.mosaic
    }

    /// Returns the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Returns the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Displays the mosaic in `object`, with its top-left corner at the given
    /// screen position.
    pub fn show_mosaic(&mut self, object: R::Object, position: Point<i32>) {
        self.renderer.set_image_source(object, &self.mosaic);
        self.renderer.set_position(object, position.x, position.y);
    }

    /// Moves `object` so that its center lies at the given screen position.
    pub fn center_object_at(&mut self, object: R::Object, position: Point<i32>) {
        let size = self.renderer.size(object);
        self.renderer
            .set_position(object, position.x - size.x / 2, position.y - size.y / 2);
    }
}
