//! Drawing surface abstraction the renderers target.

use std::sync::Arc;

use crate::palette::{Color, Gradient};

mod recording;

pub use recording::{DrawCommand, RecordingSurface};

/// Fill/stroke source for subsequent drawing calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Gradient(Arc<Gradient>),
}

/// Minimal pixel-surface contract required by the mode renderers.
///
/// Coordinates are in logical pixels. `backing_size` reports the physical
/// backing-store dimensions, which change on resize and on DPI changes; the
/// render loop watches them to invalidate the gradient cache.
pub trait Surface {
    /// Logical drawing dimensions in pixels.
    fn logical_size(&self) -> (f32, f32);

    /// Physical backing-store dimensions.
    fn backing_size(&self) -> (u32, u32);

    /// Erases all previously drawn content.
    fn clear(&mut self);

    /// Selects the paint used by subsequent fill and stroke calls.
    fn set_paint(&mut self, paint: Paint);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32);

    /// Starts a new path, discarding any unstroked one.
    fn begin_path(&mut self);

    fn move_to(&mut self, x: f32, y: f32);

    fn line_to(&mut self, x: f32, y: f32);

    /// Strokes the current path with the given line width.
    fn stroke(&mut self, width: f32);
}
