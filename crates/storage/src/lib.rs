//! File-backed key-value storage for marker layouts
//!
//! Each key is one file under the storage root: `<encoded key>.json`.

use directories::ProjectDirs;
use sensor_layout_core::{KeyValueStore, StorageError};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted in the platform's local data directory
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "SensorLayout", "SensorLayout")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().join("layouts") })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`
    ///
    /// Bytes outside `[A-Za-z0-9_-]` are percent-encoded so any key maps to a
    /// single file name.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(char::from(byte));
            } else {
                let _ = write!(name, "%{byte:02X}");
            }
        }
        name.push_str(".json");
        self.root.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        // Write through a temp file so readers never see a partial layout
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_layout_core::{
        BoundingBox, DocumentPoint, LayoutPersistence, MarkerStore, ZoneElement, ZoneIndex,
        ZoneSelector,
    };

    #[test]
    fn set_then_get_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let mut store = FileStore::with_root(temp.path().join("nested"));

        assert_eq!(store.get("svg-items").unwrap(), None);

        store.set("svg-items", "[]").unwrap();
        store.set("svg-items", "[1]").unwrap();

        assert_eq!(store.get("svg-items").unwrap().as_deref(), Some("[1]"));
        assert!(!store.path_for("svg-items").with_extension("json.tmp").exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let mut store = FileStore::with_root(temp.path());

        store.set("layout", "[]").unwrap();
        store.remove("layout").unwrap();
        store.remove("layout").unwrap();

        assert_eq!(store.get("layout").unwrap(), None);
    }

    #[test]
    fn keys_are_encoded_into_single_file_names() {
        let store = FileStore::with_root("/data");

        assert_eq!(store.path_for("svg-items"), PathBuf::from("/data/svg-items.json"));
        assert_eq!(store.path_for("../floor 2"), PathBuf::from("/data/%2E%2E%2Ffloor%202.json"));
    }

    #[test]
    fn layouts_persist_across_store_instances() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let zones = ZoneIndex::from_elements(
            &[ZoneElement::rect("A", BoundingBox::new(0.0, 0.0, 100.0, 100.0))],
            &ZoneSelector::default(),
        );
        let mut markers = MarkerStore::new();
        markers.create("Light", DocumentPoint::new(50.0, 50.0), &zones).unwrap();

        let mut persistence = LayoutPersistence::new(FileStore::with_root(temp.path()));
        persistence.save(&markers, "floor-1").unwrap();

        let reopened = LayoutPersistence::new(FileStore::with_root(temp.path()));
        let loaded = reopened.load("floor-1", &zones).unwrap();
        assert_eq!(loaded.snapshot(), markers.snapshot());

        let raw = fs::read_to_string(temp.path().join("floor-1.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["zoneId"], "A");
    }
}
