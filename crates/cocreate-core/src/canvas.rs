//! The canvas surface: raster, stroke state and undo history.
//!
//! Every committed mutation pushes a snapshot and writes the tile through to
//! storage before returning. Intermediate stroke segments only touch pixels;
//! the write happens once, when the stroke ends.

use crate::codec::CodecError;
use crate::config::TileConfig;
use crate::edges::{self, EdgeBundle, EdgeError, Side};
use crate::history::History;
use crate::persistence::{RestoreOutcome, TileStore};
use crate::raster::Raster;
use crate::storage::Storage;
use crate::text::{self, TextRasterizer};
use crate::tools::{Color, Composite, ToolKind};
use kurbo::Point;

/// A stroke in progress.
#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    last: Point,
    color: Color,
    width: f64,
    composite: Composite,
    segments: usize,
}

/// The tile being edited, with its history and persistence slot.
pub struct Canvas<S: Storage> {
    raster: Raster,
    history: History,
    store: TileStore<S>,
    stroke: Option<ActiveStroke>,
    text: Box<dyn TextRasterizer>,
    edge_thickness: u32,
    restore_outcome: RestoreOutcome,
}

impl<S: Storage> Canvas<S> {
    /// Open the tile: restore from storage (or start blank) and record the
    /// resulting state as the first snapshot.
    pub fn open(config: &TileConfig, store: TileStore<S>) -> Self {
        let mut raster = Raster::new(config.width, config.height, config.scale_factor());
        let restore_outcome = store.restore_into(&mut raster);
        log::info!("Opened {}x{} tile ({:?})", config.width, config.height, restore_outcome);

        let mut history = History::with_limit(config.history_limit);
        history.push(raster.snapshot());

        Self {
            raster,
            history,
            store,
            stroke: None,
            text: text::load_rasterizer(config.font_path.as_deref()),
            edge_thickness: config.edge_thickness,
            restore_outcome,
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &TileStore<S> {
        &self.store
    }

    /// How the tile was restored when the canvas opened.
    pub fn restore_outcome(&self) -> RestoreOutcome {
        self.restore_outcome
    }

    /// Check if a stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Start a stroke at `point`.
    ///
    /// Pen and sign paint `color`; the eraser clears to transparent.
    pub fn begin_stroke(&mut self, point: Point, tool: ToolKind, color: Color, width: f64) {
        self.stroke = Some(ActiveStroke {
            last: point,
            color,
            width,
            composite: tool.composite(),
            segments: 0,
        });
    }

    /// Extend the current stroke to `point` and rasterize the new segment.
    pub fn continue_stroke(&mut self, point: Point) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        self.raster
            .stroke_segment(stroke.last, point, stroke.width, stroke.color, stroke.composite);
        stroke.last = point;
        stroke.segments += 1;
    }

    /// Finish the current stroke, snapshot it and persist the tile.
    pub fn end_stroke(&mut self) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        log::debug!("Stroke ended after {} segments", stroke.segments);
        self.commit();
    }

    /// Render `text` with its baseline starting at `point`.
    pub fn stamp(&mut self, point: Point, text: &str, color: Color, size: f32) {
        let scale = self.raster.scale() as f32;
        let origin = (point.x as f32 * scale, point.y as f32 * scale);
        let src = color.to_rgba(255);
        let raster = &mut self.raster;
        self.text.rasterize(text, size * scale, origin, &mut |x, y, coverage| {
            raster.blend(x, y, src, coverage, Composite::SourceOver);
        });
        log::debug!("Stamped {:?} at ({}, {})", text, point.x, point.y);
        self.commit();
    }

    /// Erase the whole tile.
    pub fn clear(&mut self) {
        self.stroke = None;
        self.raster.clear();
        log::info!("Tile cleared");
        self.commit();
    }

    /// Encode the current tile as a PNG data URL.
    pub fn export_encoded(&self) -> Result<String, CodecError> {
        self.raster.encode()
    }

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.raster.restore(snapshot);
                self.store.save_tile_or_warn(&self.raster);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.raster.restore(snapshot);
                self.store.save_tile_or_warn(&self.raster);
                true
            }
            None => false,
        }
    }

    /// Encode one border strip.
    pub fn extract_edge(&self, side: Side) -> Result<String, CodecError> {
        edges::extract(&self.raster, side, self.edge_thickness)
    }

    /// Encode all four border strips.
    pub fn extract_edges(&self) -> Result<EdgeBundle, CodecError> {
        edges::extract_all(&self.raster, self.edge_thickness)
    }

    /// Draw a neighbour's border strip onto this tile at half opacity.
    ///
    /// Despite the name this is a real, persisted edit: it is snapshotted and
    /// can only be taken back with undo. On error nothing changes.
    pub fn preview_import(&mut self, side: Side, input: &str) -> Result<(), EdgeError> {
        let strip = edges::decode_import(input, side)?;
        edges::apply_preview(&mut self.raster, side, &strip);
        log::info!("Imported {} edge", side);
        self.commit();
        Ok(())
    }

    fn commit(&mut self) {
        self.history.push(self.raster.snapshot());
        self.store.save_tile_or_warn(&self.raster);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::TILE_KEY;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn open_blank() -> Canvas<MemoryStorage> {
        Canvas::open(&TileConfig::default(), TileStore::new(Arc::new(MemoryStorage::new())))
    }

    fn draw_line(canvas: &mut Canvas<MemoryStorage>, y: f64) {
        canvas.begin_stroke(Point::new(10.0, y), ToolKind::Pen, Color::INK, 6.0);
        canvas.continue_stroke(Point::new(200.0, y));
        canvas.continue_stroke(Point::new(400.0, y + 20.0));
        canvas.end_stroke();
    }

    #[test]
    fn test_open_blank() {
        let canvas = open_blank();
        assert!(canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 1);
        assert_eq!(canvas.restore_outcome(), RestoreOutcome::Empty);
    }

    #[test]
    fn test_stroke_snapshots_and_persists() {
        let mut canvas = open_blank();
        draw_line(&mut canvas, 100.0);

        assert!(!canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 2);
        let stored = canvas.store().load_tile().unwrap().unwrap();
        assert_eq!(stored, canvas.export_encoded().unwrap());
    }

    #[test]
    fn test_continue_without_begin_is_noop() {
        let mut canvas = open_blank();
        canvas.continue_stroke(Point::new(10.0, 10.0));
        canvas.end_stroke();
        assert!(canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 1);
        assert!(canvas.store().load_tile().unwrap().is_none());
    }

    #[test]
    fn test_moves_do_not_persist_until_end() {
        let mut canvas = open_blank();
        canvas.begin_stroke(Point::new(10.0, 10.0), ToolKind::Pen, Color::INK, 6.0);
        canvas.continue_stroke(Point::new(100.0, 10.0));
        assert!(!canvas.raster().is_blank());
        assert!(canvas.store().load_tile().unwrap().is_none());
        assert_eq!(canvas.history().undo_len(), 1);

        canvas.end_stroke();
        assert!(canvas.store().load_tile().unwrap().is_some());
    }

    #[test]
    fn test_eraser_removes_pixels() {
        let mut canvas = open_blank();
        draw_line(&mut canvas, 100.0);
        canvas.begin_stroke(Point::new(0.0, 100.0), ToolKind::Eraser, Color::INK, 40.0);
        canvas.continue_stroke(Point::new(900.0, 100.0));
        canvas.continue_stroke(Point::new(900.0, 120.0));
        canvas.continue_stroke(Point::new(0.0, 120.0));
        canvas.end_stroke();
        assert!(canvas.raster().is_blank());
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut canvas = open_blank();
        let initial = canvas.raster().snapshot();
        for i in 0..5 {
            draw_line(&mut canvas, 50.0 + i as f64 * 60.0);
        }
        let last = canvas.raster().snapshot();

        for _ in 0..5 {
            assert!(canvas.undo());
        }
        assert!(!canvas.undo());
        assert_eq!(canvas.raster().snapshot(), initial);

        for _ in 0..5 {
            assert!(canvas.redo());
        }
        assert!(!canvas.redo());
        assert_eq!(canvas.raster().snapshot(), last);
    }

    #[test]
    fn test_draw_after_undo_clears_redo() {
        let mut canvas = open_blank();
        draw_line(&mut canvas, 100.0);
        draw_line(&mut canvas, 200.0);
        canvas.undo();
        canvas.undo();
        assert_eq!(canvas.history().redo_len(), 2);

        draw_line(&mut canvas, 300.0);
        assert_eq!(canvas.history().redo_len(), 0);
        assert!(!canvas.redo());
    }

    #[test]
    fn test_undo_persists_restored_state() {
        let mut canvas = open_blank();
        let blank = canvas.export_encoded().unwrap();
        draw_line(&mut canvas, 100.0);
        canvas.undo();
        assert_eq!(canvas.store().load_tile().unwrap().unwrap(), blank);
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut canvas = open_blank();
        draw_line(&mut canvas, 100.0);
        let drawn = canvas.raster().snapshot();

        canvas.clear();
        assert!(canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 3);

        canvas.undo();
        assert_eq!(canvas.raster().snapshot(), drawn);
    }

    #[test]
    fn test_stamp_marks_raster() {
        let mut canvas = open_blank();
        canvas.stamp(Point::new(20.0, 40.0), "Signed", Color::INK, 18.0);
        assert!(!canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 2);
        assert!(canvas.store().load_tile().unwrap().is_some());
    }

    #[test]
    fn test_stamp_renders_distinct_text() {
        let mut first = open_blank();
        let mut second = open_blank();
        first.stamp(Point::new(20.0, 40.0), "AAAA", Color::INK, 18.0);
        second.stamp(Point::new(20.0, 40.0), "WXYZ", Color::INK, 18.0);

        assert_ne!(first.raster().snapshot(), second.raster().snapshot());
        let partial = first.raster().pixels().pixels().any(|p| p[3] > 0 && p[3] < 255);
        assert!(partial, "glyph edges should be antialiased");
    }

    #[test]
    fn test_restore_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut first = Canvas::open(&TileConfig::default(), TileStore::new(storage.clone()));
        draw_line(&mut first, 100.0);
        let drawn = first.raster().snapshot();

        let second = Canvas::open(&TileConfig::default(), TileStore::new(storage));
        assert_eq!(second.restore_outcome(), RestoreOutcome::Restored);
        assert_eq!(second.raster().snapshot(), drawn);
        assert_eq!(second.history().undo_len(), 1);
    }

    #[test]
    fn test_corrupt_storage_opens_blank() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TILE_KEY, "data:image/png;base64,????").unwrap();

        let canvas = Canvas::open(&TileConfig::default(), TileStore::new(storage));
        assert_eq!(canvas.restore_outcome(), RestoreOutcome::Corrupt);
        assert!(canvas.raster().is_blank());
        assert_eq!(canvas.history().undo_len(), 1);
    }

    #[test]
    fn test_failed_import_changes_nothing() {
        let mut canvas = open_blank();
        draw_line(&mut canvas, 100.0);
        let before = canvas.raster().snapshot();
        let stored = canvas.store().load_tile().unwrap();

        for input in ["{oops", r#"{"R":"data:image/png;base64,AAAA"}"#, "data:image/png;base64,AAAA"] {
            assert!(canvas.preview_import(Side::Left, input).is_err());
        }
        assert_eq!(canvas.raster().snapshot(), before);
        assert_eq!(canvas.history().undo_len(), 2);
        assert_eq!(canvas.store().load_tile().unwrap(), stored);
    }

    #[test]
    fn test_import_is_snapshotted() {
        let mut source = open_blank();
        source.begin_stroke(Point::new(3.0, 0.0), ToolKind::Pen, Color::rgb(255, 0, 0), 4.0);
        source.continue_stroke(Point::new(3.0, 600.0));
        source.end_stroke();
        let bundle = source.extract_edges().unwrap().to_json().unwrap();

        let mut target = open_blank();
        target.preview_import(Side::Left, &bundle).unwrap();
        assert!(!target.raster().is_blank());
        assert_eq!(target.history().undo_len(), 2);

        target.undo();
        assert!(target.raster().is_blank());
    }
}
