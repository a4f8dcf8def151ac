use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the labelling core.
///
/// Every variant is handled at the action boundary (the controller or a
/// Tauri command); none of them is expected to escape a single user action.
#[derive(Debug, Error)]
pub enum LabelError {
    /// A folder or destination picker was dismissed without a selection.
    #[error("Selection cancelled")]
    UserCancelled,

    /// The images folder could not be enumerated.
    #[error("Cannot read directory {}: {}", path.display(), source)]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A label index outside the vocabulary, or an otherwise unusable request.
    #[error("Invalid labels: {0}")]
    Validation(String),

    /// The persistence file could not be read or written.
    #[error("Storage error: {0}")]
    StorageIo(#[from] std::io::Error),

    /// A stored value did not have the expected shape.
    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A filename that would escape its folder.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl LabelError {
    /// Whether the UI should fall back to the empty "no images" state.
    pub fn is_empty_listing(&self) -> bool {
        matches!(self, LabelError::DirectoryUnreadable { .. })
    }
}

impl From<LabelError> for String {
    fn from(err: LabelError) -> Self {
        err.to_string()
    }
}
