//! Single-slot tile persistence.
//!
//! The whole tile lives under one fixed key as a PNG data URL and is
//! restored from there on startup. The room id has its own key.

use crate::codec::{self, CodecError};
use crate::raster::Raster;
use crate::storage::{FileStorage, MemoryStorage, Storage, StorageResult};
use std::path::PathBuf;
use std::sync::Arc;

/// Key holding the encoded tile.
pub const TILE_KEY: &str = "cc_tile";

/// Key holding the current room id.
pub const ROOM_KEY: &str = "cc_room";

/// What happened when restoring the tile at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was stored; the raster is blank.
    Empty,
    /// The stored tile was decoded onto the raster.
    Restored,
    /// The stored tile could not be read or decoded; the raster is blank.
    Corrupt,
}

/// Reads and writes the tile and room slots of a storage backend.
pub struct TileStore<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for TileStore<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

impl<S: Storage> TileStore<S> {
    /// Create a tile store over the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Encode and write the raster to the tile slot.
    pub fn save_tile(&self, raster: &Raster) -> Result<(), PersistError> {
        let encoded = raster.encode()?;
        self.storage.set(TILE_KEY, &encoded)?;
        log::debug!("Saved tile ({} bytes)", encoded.len());
        Ok(())
    }

    /// Write the raster, logging failures instead of returning them.
    pub fn save_tile_or_warn(&self, raster: &Raster) {
        if let Err(e) = self.save_tile(raster) {
            log::warn!("Failed to persist tile: {}", e);
        }
    }

    /// Raw encoded tile, if any.
    pub fn load_tile(&self) -> StorageResult<Option<String>> {
        self.storage.get(TILE_KEY)
    }

    /// Restore the stored tile onto `raster`.
    ///
    /// Any failure leaves `raster` blank.
    pub fn restore_into(&self, raster: &mut Raster) -> RestoreOutcome {
        raster.clear();

        let encoded = match self.load_tile() {
            Ok(Some(encoded)) => encoded,
            Ok(None) => return RestoreOutcome::Empty,
            Err(e) => {
                log::warn!("Failed to read stored tile: {}", e);
                return RestoreOutcome::Corrupt;
            }
        };

        match codec::decode_data_url(&encoded) {
            Ok(image) => {
                raster.replace_pixels(image);
                RestoreOutcome::Restored
            }
            Err(e) => {
                log::warn!("Stored tile is corrupt, starting blank: {}", e);
                RestoreOutcome::Corrupt
            }
        }
    }

    /// Stored room id, if any.
    pub fn load_room(&self) -> Option<String> {
        match self.storage.get(ROOM_KEY) {
            Ok(room) => room.filter(|r| !r.trim().is_empty()),
            Err(e) => {
                log::warn!("Failed to read stored room: {}", e);
                None
            }
        }
    }

    /// Persist the room id. Failures are logged.
    pub fn save_room(&self, room: &str) {
        if let Err(e) = self.storage.set(ROOM_KEY, room) {
            log::warn!("Failed to persist room: {}", e);
        }
    }
}

/// Errors writing the tile slot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),
}

/// A tile store over whichever backend could be opened.
pub type SessionTileStore = TileStore<Box<dyn Storage>>;

/// Open the file-backed store, or an in-memory one if the directory is unusable.
///
/// With the in-memory fallback the tile still works but is lost on exit.
pub fn open_session_store(dir: Option<PathBuf>) -> SessionTileStore {
    let storage: Box<dyn Storage> = match dir.map_or_else(FileStorage::default_location, FileStorage::new) {
        Ok(storage) => {
            log::info!("Storing tile in {}", storage.base_path().display());
            Box::new(storage)
        }
        Err(e) => {
            log::warn!("File storage unavailable, tile will not survive a restart: {}", e);
            Box::new(MemoryStorage::new())
        }
    };
    TileStore::new(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::tools::{Color, Composite};
    use kurbo::Point;

    fn store() -> TileStore<MemoryStorage> {
        TileStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_restore_empty() {
        let store = store();
        let mut raster = Raster::new(20, 20, 1.0);
        assert_eq!(store.restore_into(&mut raster), RestoreOutcome::Empty);
        assert!(raster.is_blank());
    }

    #[test]
    fn test_save_and_restore() {
        let store = store();
        let mut raster = Raster::new(20, 20, 1.0);
        raster.stroke_segment(Point::new(0.0, 10.0), Point::new(20.0, 10.0), 4.0, Color::INK, Composite::SourceOver);
        store.save_tile(&raster).unwrap();

        let mut restored = Raster::new(20, 20, 1.0);
        assert_eq!(store.restore_into(&mut restored), RestoreOutcome::Restored);
        assert_eq!(restored.snapshot(), raster.snapshot());
    }

    #[test]
    fn test_restore_corrupt_falls_back_to_blank() {
        let store = store();
        store.storage().set(TILE_KEY, "data:image/png;base64,bm90IGEgcG5n").unwrap();

        let mut raster = Raster::new(20, 20, 1.0);
        raster.stroke_segment(Point::new(0.0, 0.0), Point::new(20.0, 20.0), 4.0, Color::INK, Composite::SourceOver);
        assert_eq!(store.restore_into(&mut raster), RestoreOutcome::Corrupt);
        assert!(raster.is_blank());
    }

    #[test]
    fn test_room_slot() {
        let store = store();
        assert_eq!(store.load_room(), None);
        store.save_room("abc12345");
        assert_eq!(store.load_room().as_deref(), Some("abc12345"));
    }

    #[test]
    fn test_blank_room_ignored() {
        let store = store();
        store.save_room("   ");
        assert_eq!(store.load_room(), None);
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_session_store(Some(dir.path().to_path_buf()));
        let raster = Raster::new(8, 8, 1.0);
        store.save_tile(&raster).unwrap();
        assert!(store.load_tile().unwrap().unwrap().starts_with("data:image/png"));
        assert!(dir.path().join("cc_tile.slot").exists());
    }

    #[test]
    fn test_session_store_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let store = open_session_store(Some(blocker.join("tiles")));
        store.save_room("abc");
        assert_eq!(store.load_room().as_deref(), Some("abc"));
        assert!(!blocker.join("tiles").exists());
    }
}
