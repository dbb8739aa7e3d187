//! Core application state and lifecycle.

use crate::cli::Launch;
use crate::native::{self, SystemClipboard};
use crate::shortcuts::{self, ShortcutAction};
use crate::ui::{self, ToolbarView, UiAction, UiState};
use cocreate_core::controller::{ClipboardSink, DrawState, InteractionController};
use cocreate_core::edges::{EdgeBundle, EdgeError, Side};
use cocreate_core::input::PointerEvent;
use cocreate_core::persistence::{RestoreOutcome, open_session_store};
use cocreate_core::room::resolve_room;
use cocreate_core::storage::Storage;
use cocreate_core::tools::ToolKind;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions};
use kurbo::Point;

type SessionStorage = Box<dyn Storage>;

/// Main application state.
pub struct CoCreateApp {
    controller: InteractionController<SessionStorage>,
    ui_state: UiState,
    invite_base: String,
    tile_texture: Option<TextureHandle>,
    /// Raster changed since the last texture upload.
    tile_dirty: bool,
    grid_texture: Option<TextureHandle>,
    grid_revision: Option<u64>,
}

impl CoCreateApp {
    pub fn new(cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let Launch {
            mut config,
            data_dir,
            requested_room,
            invite_base,
        } = launch;
        if config.scale.is_none() {
            config.scale = Some(cc.egui_ctx.pixels_per_point() as f64);
        }

        let store = open_session_store(data_dir);
        let room = resolve_room(requested_room, &store);
        let controller = InteractionController::new(&config, store, room);

        let mut ui_state = UiState {
            room_input: controller.room().to_string(),
            ..Default::default()
        };
        if controller.canvas().restore_outcome() == RestoreOutcome::Corrupt {
            ui_state.status = Some("Saved tile was unreadable, started blank".to_string());
        }

        Self {
            controller,
            ui_state,
            invite_base,
            tile_texture: None,
            tile_dirty: true,
            grid_texture: None,
            grid_revision: None,
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::SetTool(tool) => self.controller.set_tool(tool),
            UiAction::SetColor(color) => self.controller.set_color(color),
            UiAction::SetBrushWidth(width) => self.controller.set_brush_width(width),
            UiAction::SetGrid(spacing) => self.controller.set_grid(spacing),
            UiAction::SetSignText(text) => self.controller.sign_text = text,
            UiAction::ToggleLock => {
                self.controller.toggle_lock();
                self.tile_dirty = true;
            }
            UiAction::Undo => self.tile_dirty |= self.controller.undo(),
            UiAction::Redo => self.tile_dirty |= self.controller.redo(),
            UiAction::Clear => {
                self.controller.clear();
                self.tile_dirty = true;
            }
            UiAction::GenerateEdges => match self.controller.generate_edges(&mut SystemClipboard) {
                Ok(_) => self.ui_state.status = Some("Edges generated".to_string()),
                Err(e) => log::error!("Failed to extract edges: {}", e),
            },
            UiAction::SetImportSide(side) => self.controller.import_side = side,
            UiAction::ImportEdge => self.import_edge(),
            UiAction::PasteImport => {
                if let Some(text) = native::paste_text() {
                    self.ui_state.import_text = text;
                }
            }
            UiAction::ExportPng => self.export_png(),
            UiAction::SetRoom => {
                if !self.controller.set_room(&self.ui_state.room_input) {
                    self.ui_state.room_input = self.controller.room().to_string();
                }
            }
            UiAction::CopyEdge(side) => self.copy_edge(side),
            UiAction::CopyInvite => {
                let invite = self.controller.invite_url(&self.invite_base);
                self.ui_state.status = Some(copy_or_show(&mut SystemClipboard, &invite, "Invite copied"));
            }
            UiAction::DismissError => self.ui_state.error = None,
        }
    }

    fn import_edge(&mut self) {
        match self.controller.import_edge(&self.ui_state.import_text) {
            Ok(()) => {
                self.tile_dirty = true;
                self.ui_state.status = Some(format!("Imported {} edge", self.controller.import_side));
            }
            Err(EdgeError::EmptyInput) => {}
            Err(e) => {
                log::warn!("Edge import failed: {}", e);
                self.ui_state.error = Some(e.user_message().to_string());
            }
        }
    }

    /// Copy the bundle JSON (`None`) or one side's data URL.
    fn copy_edge(&mut self, side: Option<Side>) {
        let Some(text) = self.controller.edges().and_then(|bundle| edge_text(bundle, side)) else {
            return;
        };
        let copied = match SystemClipboard.set_text(&text) {
            Ok(()) => "Copied to clipboard".to_string(),
            Err(e) => {
                log::debug!("Edge text not copied: {}", e);
                "Clipboard unavailable; select the text below to copy it".to_string()
            }
        };
        self.ui_state.status = Some(copied);
    }

    fn export_png(&self) {
        match self.controller.export_png(chrono::Utc::now().timestamp_millis()) {
            Ok(image) => native::save_png(&image),
            Err(e) => log::error!("Failed to encode PNG: {}", e),
        }
    }

    /// Upload the raster and grid layer when they changed.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        if self.tile_dirty || self.tile_texture.is_none() {
            let pixels = self.controller.canvas().raster().pixels();
            let image = color_image(pixels.width(), pixels.height(), pixels.as_raw());
            upload(ctx, &mut self.tile_texture, "tile", image);
            self.tile_dirty = false;
        }

        let overlay = self.controller.overlay();
        if self.grid_revision != Some(overlay.revision()) {
            let layer = overlay.layer();
            let image = color_image(layer.width(), layer.height(), layer.as_raw());
            upload(ctx, &mut self.grid_texture, "grid", image);
            self.grid_revision = Some(overlay.revision());
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        let raster = self.controller.canvas().raster();
        let size = egui::vec2(raster.width() as f32, raster.height() as f32);
        self.sync_textures(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(Color32::from_gray(243)))
            .show(ctx, |ui| {
                let rect = Rect::from_center_size(ui.available_rect_before_wrap().center(), size);
                ui.allocate_rect(rect, Sense::hover());

                let painter = ui.painter_at(rect);
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.rect_filled(rect, 0.0, Color32::WHITE);
                for texture in [&self.tile_texture, &self.grid_texture].into_iter().flatten() {
                    painter.image(texture.id(), rect, uv, Color32::WHITE);
                }
                ui.painter()
                    .rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_gray(200)), egui::StrokeKind::Outside);

                if self.ui_state.error.is_none() {
                    self.handle_canvas_input(ctx, rect);
                }
            });
    }

    fn handle_canvas_input(&mut self, ctx: &egui::Context, rect: Rect) {
        let bounds = to_kurbo_rect(rect);
        // popups and modals drawn over the canvas take the pointer
        let covered = ctx.is_pointer_over_area();
        let on_canvas = |pos: Pos2| rect.contains(pos) && !covered;
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let Some(pointer) = pointer_event(&event, on_canvas) else {
                continue;
            };
            let was_drawing = self.controller.state() == DrawState::Drawing;
            self.controller.handle_pointer(pointer, bounds);
            let stamped = self.controller.tool() == ToolKind::Sign && matches!(pointer, PointerEvent::Down { .. });
            if was_drawing || stamped || self.controller.state() == DrawState::Drawing {
                self.tile_dirty = true;
            }
        }
    }
}

impl eframe::App for CoCreateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.ui_state.error.is_none() {
            if let Some(shortcut) = shortcuts::consume(ctx) {
                self.handle_action(shortcut_action(shortcut));
            }
        }

        let view = toolbar_view(&self.controller);
        if let Some(action) = ui::render_ui(ctx, &mut self.ui_state, &view) {
            self.handle_action(action);
        }

        self.show_canvas(ctx);
    }
}

fn toolbar_view<S: Storage>(c: &InteractionController<S>) -> ToolbarView<'_> {
    ToolbarView {
        tool: c.tool(),
        color: c.brush().color,
        brush_width: c.brush().width(),
        grid: c.overlay().spacing(),
        locked: c.is_locked(),
        can_undo: c.canvas().history().can_undo(),
        can_redo: c.canvas().history().can_redo(),
        room: c.room().to_string(),
        import_side: c.import_side,
        edges: c.edges(),
    }
}

/// The bundle JSON for `None`, otherwise one side's data URL.
fn edge_text(bundle: &EdgeBundle, side: Option<Side>) -> Option<String> {
    match side {
        Some(side) => Some(bundle.get(side).to_string()),
        None => match bundle.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::error!("Failed to serialize edges: {}", e);
                None
            }
        },
    }
}

/// Copy `text`, or return it in the status line when the clipboard fails.
fn copy_or_show(clipboard: &mut dyn ClipboardSink, text: &str, done: &str) -> String {
    match clipboard.set_text(text) {
        Ok(()) => done.to_string(),
        Err(e) => {
            log::debug!("Clipboard write failed: {}", e);
            format!("Copy this link: {}", text)
        }
    }
}

fn shortcut_action(shortcut: ShortcutAction) -> UiAction {
    match shortcut {
        ShortcutAction::Undo => UiAction::Undo,
        ShortcutAction::Redo => UiAction::Redo,
        ShortcutAction::Export => UiAction::ExportPng,
        ShortcutAction::CopyEdges => UiAction::GenerateEdges,
        ShortcutAction::ToggleLock => UiAction::ToggleLock,
        ShortcutAction::Pen => UiAction::SetTool(ToolKind::Pen),
        ShortcutAction::Eraser => UiAction::SetTool(ToolKind::Eraser),
        ShortcutAction::Sign => UiAction::SetTool(ToolKind::Sign),
    }
}

/// Map an egui input event to a canvas pointer event.
///
/// `on_canvas` tells whether a position hits the uncovered canvas. Touches
/// arrive as simulated pointer events. Moving off the canvas is a leave.
fn pointer_event(event: &egui::Event, on_canvas: impl Fn(Pos2) -> bool) -> Option<PointerEvent> {
    match *event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed: true,
            ..
        } if on_canvas(pos) => Some(PointerEvent::Down { position: to_point(pos) }),
        egui::Event::PointerButton {
            button: egui::PointerButton::Primary,
            pressed: false,
            ..
        } => Some(PointerEvent::Up),
        egui::Event::PointerMoved(pos) if on_canvas(pos) => Some(PointerEvent::Move { position: to_point(pos) }),
        egui::Event::PointerMoved(_) | egui::Event::PointerGone => Some(PointerEvent::Leave),
        _ => None,
    }
}

fn to_point(pos: Pos2) -> Point {
    Point::new(pos.x as f64, pos.y as f64)
}

fn to_kurbo_rect(rect: Rect) -> kurbo::Rect {
    kurbo::Rect::new(rect.min.x as f64, rect.min.y as f64, rect.max.x as f64, rect.max.y as f64)
}

fn color_image(width: u32, height: u32, rgba: &[u8]) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([width as usize, height as usize], rgba)
}

fn upload(ctx: &egui::Context, slot: &mut Option<TextureHandle>, name: &str, image: ColorImage) {
    match slot {
        Some(texture) => texture.set(image, TextureOptions::LINEAR),
        None => *slot = Some(ctx.load_texture(name, image, TextureOptions::LINEAR)),
    }
}
