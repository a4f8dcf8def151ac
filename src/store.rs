use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::LabelError;
use crate::models::{Label, LabelledImage};

/// Key holding the last selected images folder.
pub const IMAGES_PATH_KEY: &str = "imagesPath";
/// Key holding the label vocabulary.
pub const LABELS_KEY: &str = "labels";
/// Folder key used while no images folder has been selected.
pub const DEFAULT_FOLDER_KEY: &str = "default";
/// Suffix appended to a folder key to address its label collection.
pub const IMAGES_KEY_SUFFIX: &str = ".images";

/// Normalizes an images folder path into the key namespace used by the store.
///
/// Paths differing only in case share a key; the empty path maps to
/// [`DEFAULT_FOLDER_KEY`].
pub fn folder_key(images_path: &str) -> String {
    if images_path.is_empty() {
        DEFAULT_FOLDER_KEY.to_string()
    } else {
        images_path.to_lowercase()
    }
}

/// Store key of the label collection for `images_path`.
pub fn images_key(images_path: &str) -> String {
    format!("{}{}", folder_key(images_path), IMAGES_KEY_SUFFIX)
}

/// LabelStore is a JSON-file backed key-value store.
///
/// Features:
/// - Thread-safe access via RwLock
/// - Every write is persisted before returning (temp file + rename)
/// - In-memory state only changes once the file write succeeded
pub struct LabelStore {
    /// Current contents of the store
    values: RwLock<Map<String, Value>>,
    /// Path to the store file
    path: PathBuf,
}

impl LabelStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LabelError> {
        let path = path.into();
        let values = Self::load_from_file(&path)?;
        log::debug!("Opened label store {} ({} keys)", path.display(), values.len());

        Ok(Self {
            values: RwLock::new(values),
            path,
        })
    }

    fn load_from_file(path: &Path) -> Result<Map<String, Value>, LabelError> {
        if !path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(LabelError::StorageIo(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} does not hold a JSON object (found {})",
                    path.display(),
                    json_kind(&other)
                ),
            ))),
        }
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `key` is present, even if its value is `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Reads `key` as `T`; `Ok(None)` when the key was never set.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LabelError> {
        let values = self.read();
        match values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }

    /// Writes `key` and persists the whole store synchronously.
    pub fn set_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), LabelError> {
        let value = serde_json::to_value(value)?;
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);

        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.write_file(&updated)?;

        *values = updated;
        Ok(())
    }

    /// The persisted images folder, or an empty string if none was selected.
    pub fn get_images_path(&self) -> Result<String, LabelError> {
        Ok(self.get_setting::<String>(IMAGES_PATH_KEY)?.unwrap_or_default())
    }

    /// Persists the images folder. The path is not checked for existence.
    pub fn set_images_path(&self, images_path: &str) -> Result<(), LabelError> {
        self.set_setting(IMAGES_PATH_KEY, images_path)
    }

    /// Reads the label collection of an images folder.
    ///
    /// # Arguments
    /// * `images_path` - The folder as selected; case is folded by [`images_key`]
    ///
    /// # Returns
    /// The saved entries in save order, empty if the folder has none
    pub fn get_labelled_images(&self, images_path: &str) -> Result<Vec<LabelledImage>, LabelError> {
        Ok(self
            .get_setting::<Vec<LabelledImage>>(&images_key(images_path))?
            .unwrap_or_default())
    }

    /// Replaces the label collection of an images folder and persists it.
    pub fn set_labelled_images(
        &self,
        images_path: &str,
        images: &[LabelledImage],
    ) -> Result<(), LabelError> {
        self.set_setting(&images_key(images_path), images)
    }

    /// The stored label vocabulary, empty if never seeded.
    pub fn get_labels(&self) -> Result<Vec<Label>, LabelError> {
        Ok(self.get_setting::<Vec<Label>>(LABELS_KEY)?.unwrap_or_default())
    }

    /// Stores `labels` as the vocabulary unless one is already present.
    ///
    /// Returns whether the vocabulary was written.
    pub fn seed_labels(&self, labels: &[Label]) -> Result<bool, LabelError> {
        if self.contains(LABELS_KEY) {
            return Ok(false);
        }
        self.set_setting(LABELS_KEY, labels)?;
        log::info!("Seeded label vocabulary with {} labels", labels.len());
        Ok(true)
    }

    /// Writes the current state to disk.
    pub fn flush(&self) -> Result<(), LabelError> {
        let values = self.read();
        self.write_file(&values)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Map<String, Value>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_file(&self, values: &Map<String, Value>) -> Result<(), LabelError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
