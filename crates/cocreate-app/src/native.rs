//! Native clipboard and file dialogs.

use cocreate_core::controller::{ClipboardError, ClipboardSink, ExportedImage};

/// The system clipboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Read text from the system clipboard.
pub fn paste_text() -> Option<String> {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
        Ok(text) => Some(text),
        Err(e) => {
            log::debug!("Clipboard read failed: {}", e);
            None
        }
    }
}

/// Save an exported PNG using the native file dialog.
pub fn save_png(image: &ExportedImage) {
    let dialog = rfd::FileDialog::new()
        .set_title("Export PNG")
        .set_file_name(&image.filename)
        .add_filter("PNG Image", &["png"]);

    if let Some(path) = dialog.save_file() {
        if let Err(e) = std::fs::write(&path, &image.bytes) {
            log::error!("Failed to write PNG: {}", e);
        } else {
            log::info!("Exported PNG to: {:?}", path);
        }
    }
}
