//! File-based storage implementation for native platforms.

use super::{Storage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const SLOT_EXTENSION: &str = "slot";

/// File-based storage for native platforms.
///
/// Each key is stored as one file in a base directory.
pub struct FileStorage {
    /// Base directory for stored values.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/cocreate/`
    /// On Windows: `%LOCALAPPDATA%\cocreate\`
    pub fn default_location() -> StorageResult<Self> {
        Self::new(default_data_dir()?)
    }

    /// Get the file path for a key.
    fn slot_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.{}", safe_key, SLOT_EXTENSION))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Platform data directory for CoCreate.
pub fn default_data_dir() -> StorageResult<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
    Ok(base.join("cocreate"))
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.slot_path(key);
        // Replace atomically via rename.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_set_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        storage.set("cc_tile", "data:image/png;base64,AAAA").unwrap();
        let loaded = storage.get("cc_tile").unwrap();

        assert_eq!(loaded.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_file_storage_missing() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(storage.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_file_storage_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();

        storage.set("cc_room", "abc").unwrap();
        assert!(nested.join("cc_room.slot").exists());
    }

    #[test]
    fn test_file_storage_overwrite_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        storage.set("cc_tile", "first").unwrap();
        storage.set("cc_tile", "second").unwrap();

        assert_eq!(storage.get("cc_tile").unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("cc_tile.tmp").exists());
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        storage.set("room/../with*special", "v").unwrap();
        assert_eq!(storage.get("room/../with*special").unwrap().as_deref(), Some("v"));
    }
}
