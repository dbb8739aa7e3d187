//! UI panels using egui.

use cocreate_core::edges::{EdgeBundle, Side};
use cocreate_core::overlay::GridSpacing;
use cocreate_core::tools::{Color, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH, ToolKind};
use egui::{Align2, Color32, Context, CornerRadius, Frame, Margin, RichText, Stroke, Vec2};

/// Actions the UI can request from the app.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SetTool(ToolKind),
    SetColor(Color),
    SetBrushWidth(u32),
    SetGrid(GridSpacing),
    SetSignText(String),
    ToggleLock,
    Undo,
    Redo,
    Clear,
    /// Extract all four edges and copy the bundle.
    GenerateEdges,
    /// Copy one side's data URL, or the whole JSON bundle for `None`.
    CopyEdge(Option<Side>),
    SetImportSide(Side),
    /// Import the text in the import box.
    ImportEdge,
    /// Fill the import box from the clipboard.
    PasteImport,
    ExportPng,
    /// Apply the room typed into the room box.
    SetRoom,
    CopyInvite,
    DismissError,
}

/// Read-only view of the controller for one frame.
#[derive(Debug, Clone)]
pub struct ToolbarView<'a> {
    pub tool: ToolKind,
    pub color: Color,
    pub brush_width: u32,
    pub grid: GridSpacing,
    pub locked: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub room: String,
    pub import_side: Side,
    /// Last generated bundle.
    pub edges: Option<&'a EdgeBundle>,
}

/// Text fields and modal state owned by the UI.
#[derive(Debug, Default)]
pub struct UiState {
    pub sign_text: String,
    pub room_input: String,
    pub import_text: String,
    /// Blocking error shown in a modal.
    pub error: Option<String>,
    /// Short-lived status line.
    pub status: Option<String>,
    pub shortcuts_modal_open: bool,
}

/// Render all UI panels. Returns the first action triggered this frame.
pub fn render_ui(ctx: &Context, ui_state: &mut UiState, view: &ToolbarView<'_>) -> Option<UiAction> {
    let toolbar_action = render_toolbar(ctx, ui_state, view);
    let edges_action = render_edges_panel(ctx, ui_state, view);
    let modal_action = render_error_modal(ctx, ui_state);
    if ui_state.shortcuts_modal_open {
        render_shortcuts_modal(ctx, ui_state);
    }

    modal_action.or(toolbar_action).or(edges_action)
}

fn render_toolbar(ctx: &Context, ui_state: &mut UiState, view: &ToolbarView<'_>) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            for tool in ToolKind::ALL {
                if ui.selectable_label(view.tool == tool, tool.label()).clicked() {
                    action = Some(UiAction::SetTool(tool));
                }
            }
            panel_separator(ui);

            let mut rgb = [view.color.r, view.color.g, view.color.b];
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                action = Some(UiAction::SetColor(Color::rgb(rgb[0], rgb[1], rgb[2])));
            }

            let mut width = view.brush_width;
            let slider = egui::Slider::new(&mut width, MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).text("Brush");
            if ui.add(slider).changed() {
                action = Some(UiAction::SetBrushWidth(width));
            }
            panel_separator(ui);

            ui.label("Grid");
            egui::ComboBox::from_id_salt("grid_spacing")
                .selected_text(view.grid.label())
                .show_ui(ui, |ui| {
                    for spacing in GridSpacing::OPTIONS {
                        if ui.selectable_label(view.grid == spacing, spacing.label()).clicked() {
                            action = Some(UiAction::SetGrid(spacing));
                        }
                    }
                });
            panel_separator(ui);

            let lock_label = if view.locked { "Unlock" } else { "Lock" };
            if ui.button(lock_label).on_hover_text("Ctrl+L").clicked() {
                action = Some(UiAction::ToggleLock);
            }
            if ui.add_enabled(view.can_undo, egui::Button::new("Undo")).on_hover_text("Ctrl+Z").clicked() {
                action = Some(UiAction::Undo);
            }
            if ui
                .add_enabled(view.can_redo, egui::Button::new("Redo"))
                .on_hover_text("Ctrl+Shift+Z")
                .clicked()
            {
                action = Some(UiAction::Redo);
            }
            if ui.button("Clear").clicked() {
                action = Some(UiAction::Clear);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("?").on_hover_text("Keyboard shortcuts").clicked() {
                    ui_state.shortcuts_modal_open = true;
                }
                if view.locked {
                    ui.label(RichText::new("View only").color(Color32::from_rgb(220, 38, 38)));
                }
            });
        });

        ui.horizontal(|ui| {
            ui.label("Signature");
            let sign = ui.add(
                egui::TextEdit::singleline(&mut ui_state.sign_text)
                    .hint_text("@handle")
                    .desired_width(140.0),
            );
            if sign.changed() {
                action = Some(UiAction::SetSignText(ui_state.sign_text.clone()));
            }
            panel_separator(ui);

            ui.label(format!("Room: {}", view.room));
            let room = ui.add(
                egui::TextEdit::singleline(&mut ui_state.room_input)
                    .hint_text("room id")
                    .desired_width(110.0),
            );
            let submitted = room.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Join").clicked() || submitted {
                action = Some(UiAction::SetRoom);
            }
            if ui.button("Copy invite").clicked() {
                action = Some(UiAction::CopyInvite);
            }
            panel_separator(ui);

            if ui.button("Export PNG").on_hover_text("Ctrl+E").clicked() {
                action = Some(UiAction::ExportPng);
            }
            if let Some(status) = &ui_state.status {
                ui.label(RichText::new(status).color(Color32::from_gray(110)));
            }
        });
        ui.add_space(4.0);
    });

    action
}

fn render_edges_panel(ctx: &Context, ui_state: &mut UiState, view: &ToolbarView<'_>) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::bottom("edges").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let generate = if view.edges.is_some() { "Regenerate edges" } else { "Generate edges" };
            if ui.button(generate).on_hover_text("Ctrl+Shift+C").clicked() {
                action = Some(UiAction::GenerateEdges);
            }
            panel_separator(ui);

            ui.label("Import side");
            for side in Side::ALL {
                if ui.selectable_label(view.import_side == side, side.code()).clicked() {
                    action = Some(UiAction::SetImportSide(side));
                }
            }
            if ui.button("Paste").clicked() {
                action = Some(UiAction::PasteImport);
            }
            if ui.button("Import").clicked() {
                action = Some(UiAction::ImportEdge);
            }
        });
        ui.add(
            egui::TextEdit::multiline(&mut ui_state.import_text)
                .hint_text("Paste a data URL or the JSON from 'Copy edges'")
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
        if let Some(bundle) = view.edges {
            if let Some(copy) = render_edge_bundle(ui, bundle) {
                action = Some(copy);
            }
        }
        ui.add_space(4.0);
    });

    action
}

/// The generated bundle, so it can be copied by hand when the clipboard fails.
fn render_edge_bundle(ui: &mut egui::Ui, bundle: &EdgeBundle) -> Option<UiAction> {
    let mut action = None;

    egui::CollapsingHeader::new("Edge bundle (JSON)")
        .id_salt("edge_bundle_json")
        .show(ui, |ui| {
            if ui.button("Copy JSON").clicked() {
                action = Some(UiAction::CopyEdge(None));
            }
            let json = bundle.to_json().unwrap_or_default();
            read_only_text(ui, &json);
        });

    egui::CollapsingHeader::new("Edge codes (data URLs)")
        .id_salt("edge_bundle_sides")
        .show(ui, |ui| {
            for side in Side::ALL {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(side.code()).strong());
                    if ui.small_button("Copy").clicked() {
                        action = Some(UiAction::CopyEdge(Some(side)));
                    }
                });
                read_only_text(ui, bundle.get(side));
            }
        });

    action
}

fn read_only_text(ui: &mut egui::Ui, text: &str) {
    let mut text = text;
    ui.add(
        egui::TextEdit::multiline(&mut text)
            .font(egui::TextStyle::Monospace)
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );
}

fn render_error_modal(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    let message = ui_state.error.as_ref()?;
    let mut action = None;

    egui::Modal::new(egui::Id::new("error_modal")).show(ctx, |ui| {
        ui.set_width(320.0);
        ui.label(RichText::new("Import failed").size(16.0).strong());
        ui.add_space(8.0);
        ui.label(message);
        ui.add_space(12.0);
        if ui.button("OK").clicked() {
            action = Some(UiAction::DismissError);
        }
    });

    action
}

fn render_shortcuts_modal(ctx: &Context, ui_state: &mut UiState) {
    use crate::shortcuts::ShortcutRegistry;

    egui::Area::new(egui::Id::new("shortcuts_modal"))
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_width(280.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Keyboard Shortcuts").size(16.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").clicked() {
                            ui_state.shortcuts_modal_open = false;
                        }
                    });
                });
                ui.add_space(8.0);
                for shortcut in ShortcutRegistry::all() {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(shortcut.format())
                                .size(12.0)
                                .family(egui::FontFamily::Monospace)
                                .color(Color32::from_rgb(100, 116, 139)),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(RichText::new(shortcut.description).size(12.0));
                        });
                    });
                }
            });
        });
}

fn panel_frame() -> Frame {
    Frame::new()
        .fill(Color32::from_rgba_unmultiplied(250, 250, 252, 250))
        .corner_radius(CornerRadius::same(8))
        .stroke(Stroke::new(1.0, Color32::from_gray(220)))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 8,
            offset: [0, 2],
            color: Color32::from_black_alpha(15),
        })
        .inner_margin(Margin::same(12))
}

/// Vertical separator for toolbars.
fn panel_separator(ui: &mut egui::Ui) {
    ui.add_space(6.0);
    ui.separator();
    ui.add_space(6.0);
}
