//! Application state and the pointer state machine.

use crate::canvas::Canvas;
use crate::codec::{self, CodecError};
use crate::config::TileConfig;
use crate::edges::{EdgeBundle, EdgeError, Side};
use crate::input::{PointerEvent, to_canvas_local};
use crate::overlay::{GridSpacing, Overlay};
use crate::persistence::TileStore;
use crate::room::{self, RoomId};
use crate::storage::Storage;
use crate::text::signature_label;
use crate::tools::{Brush, Color, ToolKind};
use kurbo::{Point, Rect};
use thiserror::Error;

/// Pointer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
}

/// Clipboard write failure.
#[derive(Debug, Error)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere to put copied text.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// A PNG ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Owns the canvas and the overlay and routes user intent to them.
pub struct InteractionController<S: Storage> {
    canvas: Canvas<S>,
    overlay: Overlay,
    state: DrawState,
    tool: ToolKind,
    brush: Brush,
    locked: bool,
    /// Text stamped by the sign tool before the timestamp.
    pub sign_text: String,
    room: RoomId,
    edges: Option<EdgeBundle>,
    /// Side an imported strip is placed on.
    pub import_side: Side,
}

impl<S: Storage> InteractionController<S> {
    pub fn new(config: &TileConfig, store: TileStore<S>, room: RoomId) -> Self {
        let canvas = Canvas::open(config, store);
        let overlay = Overlay::new(config.grid, config.width, config.height, config.scale_factor());
        Self {
            canvas,
            overlay,
            state: DrawState::Idle,
            tool: ToolKind::default(),
            brush: config.brush(),
            locked: false,
            sign_text: String::new(),
            room,
            edges: None,
            import_side: Side::default(),
        }
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// The last generated edge bundle.
    pub fn edges(&self) -> Option<&EdgeBundle> {
        self.edges.as_ref()
    }

    /// Feed a pointer event. `bounds` is the canvas's on-screen rectangle.
    pub fn handle_pointer(&mut self, event: PointerEvent, bounds: Rect) {
        match (self.state, event) {
            (_, PointerEvent::Down { .. } | PointerEvent::Move { .. }) if self.locked => {}
            (DrawState::Idle, PointerEvent::Down { position }) => {
                let point = to_canvas_local(position, bounds);
                if self.tool.draws_strokes() {
                    self.canvas
                        .begin_stroke(point, self.tool, self.brush.color, self.brush.width() as f64);
                    self.state = DrawState::Drawing;
                } else {
                    self.stamp_signature(point);
                }
            }
            (DrawState::Drawing, PointerEvent::Move { position }) => {
                self.canvas.continue_stroke(to_canvas_local(position, bounds));
            }
            (DrawState::Drawing, PointerEvent::Up | PointerEvent::Leave) => {
                self.canvas.end_stroke();
                self.state = DrawState::Idle;
            }
            _ => {}
        }
    }

    fn stamp_signature(&mut self, point: Point) {
        let label = signature_label(&self.sign_text, &chrono::Local::now());
        self.canvas
            .stamp(point, &label, self.brush.color, self.brush.sign_font_size());
    }

    /// Enter view-only mode.
    ///
    /// A stroke in progress is finished first so its pixels are committed.
    pub fn lock(&mut self) {
        if self.state == DrawState::Drawing {
            self.canvas.end_stroke();
            self.state = DrawState::Idle;
        }
        self.locked = true;
        log::info!("Canvas locked");
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        log::info!("Canvas unlocked");
    }

    pub fn toggle_lock(&mut self) {
        if self.locked {
            self.unlock();
        } else {
            self.lock();
        }
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    pub fn set_brush_width(&mut self, width: u32) {
        self.brush.set_width(width);
    }

    pub fn set_grid(&mut self, spacing: GridSpacing) {
        self.overlay.set_spacing(spacing);
    }

    pub fn undo(&mut self) -> bool {
        self.canvas.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.canvas.redo()
    }

    pub fn clear(&mut self) {
        self.state = DrawState::Idle;
        self.canvas.clear();
    }

    /// Extract all four strips, keep them, and copy the JSON bundle.
    ///
    /// Clipboard failures are ignored; the bundle is still returned.
    pub fn generate_edges(&mut self, clipboard: &mut dyn ClipboardSink) -> Result<&EdgeBundle, CodecError> {
        let bundle = self.canvas.extract_edges()?;
        match bundle.to_json() {
            Ok(json) => {
                if let Err(e) = clipboard.set_text(&json) {
                    log::debug!("Edge bundle not copied: {}", e);
                }
            }
            Err(e) => log::debug!("Edge bundle not serialized: {}", e),
        }
        Ok(&*self.edges.insert(bundle))
    }

    /// Import a strip for [`Self::import_side`] from a data URL or JSON bundle.
    pub fn import_edge(&mut self, input: &str) -> Result<(), EdgeError> {
        self.canvas.preview_import(self.import_side, input)
    }

    /// Encode the tile as a PNG named for the current room.
    pub fn export_png(&self, unix_millis: i64) -> Result<ExportedImage, CodecError> {
        let bytes = codec::encode_png(self.canvas.raster().pixels())?;
        Ok(ExportedImage {
            filename: room::export_filename(&self.room, unix_millis),
            bytes,
        })
    }

    /// Switch rooms. Blank input is ignored.
    pub fn set_room(&mut self, value: &str) -> bool {
        let Some(room) = RoomId::parse(value) else {
            return false;
        };
        self.canvas.store().save_room(room.as_str());
        log::info!("Room set to {}", room);
        self.room = room;
        true
    }

    pub fn invite_url(&self, base: &str) -> String {
        room::invite_url(base, &self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    const BOUNDS: Rect = Rect::new(100.0, 50.0, 1000.0, 650.0);

    fn controller() -> InteractionController<MemoryStorage> {
        let store = TileStore::new(Arc::new(MemoryStorage::new()));
        let room = RoomId::parse("abc").unwrap();
        InteractionController::new(&TileConfig::default(), store, room)
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y) }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    fn scribble(c: &mut InteractionController<MemoryStorage>) {
        c.handle_pointer(down(150.0, 100.0), BOUNDS);
        c.handle_pointer(moved(300.0, 120.0), BOUNDS);
        c.handle_pointer(moved(450.0, 300.0), BOUNDS);
        c.handle_pointer(PointerEvent::Up, BOUNDS);
    }

    #[derive(Default)]
    struct RecordingClipboard {
        text: Option<String>,
        fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError("denied".into()));
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_pen_state_machine() {
        let mut c = controller();
        c.handle_pointer(down(150.0, 100.0), BOUNDS);
        assert_eq!(c.state(), DrawState::Drawing);
        c.handle_pointer(moved(300.0, 100.0), BOUNDS);
        c.handle_pointer(PointerEvent::Leave, BOUNDS);
        assert_eq!(c.state(), DrawState::Idle);
        assert_eq!(c.canvas().history().undo_len(), 2);
    }

    #[test]
    fn test_coordinates_are_canvas_local() {
        let mut c = controller();
        c.handle_pointer(down(110.0, 60.0), BOUNDS);
        c.handle_pointer(moved(111.0, 60.0), BOUNDS);
        c.handle_pointer(PointerEvent::Up, BOUNDS);
        assert!(c.canvas().raster().pixels().get_pixel(10, 10)[3] > 0);
        assert_eq!(c.canvas().raster().pixels().get_pixel(110, 60)[3], 0);
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut c = controller();
        c.handle_pointer(moved(300.0, 120.0), BOUNDS);
        c.handle_pointer(PointerEvent::Up, BOUNDS);
        assert!(c.canvas().raster().is_blank());
        assert_eq!(c.canvas().history().undo_len(), 1);
    }

    #[test]
    fn test_sign_stamps_and_stays_idle() {
        let mut c = controller();
        c.set_tool(ToolKind::Sign);
        c.sign_text = "@ada".into();
        c.handle_pointer(down(200.0, 200.0), BOUNDS);
        assert_eq!(c.state(), DrawState::Idle);
        assert!(!c.canvas().raster().is_blank());
        assert_eq!(c.canvas().history().undo_len(), 2);
    }

    #[test]
    fn test_lock_suppresses_pointer_mutation() {
        let mut c = controller();
        scribble(&mut c);
        let before = c.canvas().raster().snapshot();

        c.lock();
        for tool in ToolKind::ALL {
            c.set_tool(tool);
            scribble(&mut c);
        }
        assert_eq!(c.canvas().raster().snapshot(), before);
        assert_eq!(c.canvas().history().undo_len(), 2);

        c.unlock();
        assert_eq!(c.canvas().raster().snapshot(), before);
        c.set_tool(ToolKind::Pen);
        scribble(&mut c);
        assert_ne!(c.canvas().raster().snapshot(), before);
    }

    #[test]
    fn test_lock_mid_stroke_commits() {
        let mut c = controller();
        c.handle_pointer(down(150.0, 100.0), BOUNDS);
        c.handle_pointer(moved(300.0, 100.0), BOUNDS);
        c.toggle_lock();
        assert!(c.is_locked());
        assert_eq!(c.state(), DrawState::Idle);
        assert_eq!(c.canvas().history().undo_len(), 2);
    }

    #[test]
    fn test_startup_scenario() {
        let mut c = controller();
        let blank = c.canvas().raster().snapshot();
        assert!(c.canvas().raster().is_blank());
        assert_eq!(c.canvas().history().undo_len(), 1);

        scribble(&mut c);
        let drawn = c.canvas().raster().snapshot();
        assert_eq!(c.canvas().history().undo_len(), 2);
        let stored = c.canvas().store().load_tile().unwrap().unwrap();
        assert!(!codec::decode_data_url(&stored).unwrap().pixels().all(|p| p[3] == 0));

        assert!(c.undo());
        assert_eq!(c.canvas().raster().snapshot(), blank);
        assert_eq!(c.canvas().history().undo_len(), 1);
        assert_eq!(c.canvas().history().redo_len(), 1);

        assert!(c.redo());
        assert_eq!(c.canvas().raster().snapshot(), drawn);
    }

    #[test]
    fn test_generate_edges_copies_bundle() {
        let mut c = controller();
        scribble(&mut c);
        let mut clipboard = RecordingClipboard::default();
        let json = c.generate_edges(&mut clipboard).unwrap().to_json().unwrap();
        assert_eq!(clipboard.text.as_deref(), Some(json.as_str()));
        assert!(c.edges().is_some());
    }

    #[test]
    fn test_generate_edges_ignores_clipboard_failure() {
        let mut c = controller();
        let mut clipboard = RecordingClipboard { fail: true, ..Default::default() };
        assert!(c.generate_edges(&mut clipboard).is_ok());
        assert!(c.edges().is_some());
    }

    #[test]
    fn test_import_uses_selected_side() {
        let mut source = controller();
        source.set_color(Color::rgb(255, 0, 0));
        source.handle_pointer(down(995.0, 50.0), BOUNDS);
        source.handle_pointer(moved(995.0, 650.0), BOUNDS);
        source.handle_pointer(PointerEvent::Up, BOUNDS);
        let mut clipboard = RecordingClipboard::default();
        source.generate_edges(&mut clipboard).unwrap();
        let bundle = clipboard.text.unwrap();

        let mut target = controller();
        target.import_side = Side::Right;
        target.import_edge(&bundle).unwrap();
        let pixels = target.canvas().raster().pixels();
        assert!(pixels.get_pixel(893, 300)[3] > 0);
        assert_eq!(pixels.get_pixel(5, 300)[3], 0);

        assert!(target.import_edge("{not json").is_err());
        assert_eq!(target.canvas().history().undo_len(), 2);
    }

    #[test]
    fn test_export_png() {
        let c = controller();
        let image = c.export_png(42).unwrap();
        assert_eq!(image.filename, "cocreate_abc_42.png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_set_room() {
        let mut c = controller();
        assert!(!c.set_room("   "));
        assert!(c.set_room(" team "));
        assert_eq!(c.room().as_str(), "team");
        assert_eq!(c.canvas().store().load_room().as_deref(), Some("team"));
        assert_eq!(c.invite_url("https://tiles.example/"), "https://tiles.example/?room=team");
    }

    #[test]
    fn test_grid_does_not_touch_raster() {
        let mut c = controller();
        c.set_grid(GridSpacing::from_px(12).unwrap());
        assert_eq!(c.overlay().spacing().px(), 12);
        assert!(c.canvas().raster().is_blank());
        assert!(c.canvas().store().load_tile().unwrap().is_none());
    }
}
