//! Pointer input for mouse and touch.

use kurbo::{Point, Rect};

/// Pointer event type for unified mouse/touch handling.
///
/// Touch input reaches the canvas as the first touch point.
///
/// Positions are client coordinates; see [`to_canvas_local`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up,
    /// The pointer left the canvas.
    Leave,
}

/// Translate a client position into canvas-local logical coordinates.
///
/// `bounds` is the canvas's on-screen rectangle. Only its origin matters;
/// the device scale is already baked into the backing store.
pub fn to_canvas_local(client: Point, bounds: Rect) -> Point {
    Point::new(client.x - bounds.x0, client.y - bounds.y0)
}
