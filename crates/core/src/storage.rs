//! Named key-value slots backing the collection and preferences.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::warn;

/// Slot holding the JSON-encoded game collection.
pub const COLLECTION_SLOT: &str = "gameshelf_games";
/// Slot holding the dark mode preference as `"true"`/`"false"`.
pub const DARK_MODE_SLOT: &str = "darkMode";

/// Synchronous string storage addressed by a fixed key.
pub trait SlotStorage {
    /// Read the value stored under `key`, or `None` when nothing was written yet.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: SlotStorage + ?Sized> SlotStorage for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Slots persisted as individual files inside a directory.
#[derive(Debug, Clone)]
pub struct FileSlots {
    root: PathBuf,
}

impl FileSlots {
    /// Create slots rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory containing the slot files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path used for `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl SlotStorage for FileSlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let bytes =
            fs::read(&path).with_context(|| format!("failed to read slot {}", path.display()))?;
        let contents = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(err) => {
                warn!("slot {} is not valid UTF-8", path.display());
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create slot directory {}", self.root.display()))?;

        let path = self.slot_path(key);
        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to stage slot in {}", self.root.display()))?;
        staged
            .write_all(value.as_bytes())
            .with_context(|| format!("failed to write slot {}", path.display()))?;
        staged
            .persist(&path)
            .with_context(|| format!("failed to replace slot {}", path.display()))?;
        Ok(())
    }
}

/// Process-local slots, lost when dropped.
#[derive(Debug, Default)]
pub struct MemorySlots {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySlots {
    /// Create an empty slot map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot, mainly for tests.
    pub fn with_value(self, key: &str, value: impl Into<String>) -> Self {
        self.values.write().insert(key.to_string(), value.into());
        self
    }
}

impl SlotStorage for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn sanitize_key(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "slot".to_string()
    } else {
        result
    }
}
