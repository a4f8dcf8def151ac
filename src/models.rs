use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of label checkboxes shown in the preview pane.
pub const LABEL_SLOTS: usize = 9;

/// One entry of the fixed label vocabulary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub index: u8,
}

impl Label {
    pub fn new(name: impl Into<String>, index: u8) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// The vocabulary seeded into a fresh store.
pub fn default_labels() -> Vec<Label> {
    [
        "Amaretto",
        "Aria",
        "Chick Pea",
        "Espresso",
        "Lucifer",
        "Oreo",
        "Popcorn",
        "Pumpkin",
        "Whiskey",
    ]
    .iter()
    .enumerate()
    .map(|(i, name)| Label::new(*name, (i + 1) as u8))
    .collect()
}

/// Label assignment for a single image, keyed by filename within its folder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LabelledImage {
    pub path: String,
    pub labels: Vec<u8>,
}

/// Summary text shown next to each filename in the image list.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(into = "String")]
pub enum Badge {
    /// Never saved in this folder.
    Unlabelled,
    /// Saved with an empty label set.
    NoLabels,
    /// Saved with this many labels.
    Labels(usize),
}

impl Badge {
    /// Badge for a saved entry, or [`Badge::Unlabelled`] when there is none.
    pub fn for_entry(entry: Option<&LabelledImage>) -> Self {
        match entry {
            None => Badge::Unlabelled,
            Some(image) if image.labels.is_empty() => Badge::NoLabels,
            Some(image) => Badge::Labels(image.labels.len()),
        }
    }

    pub fn is_labelled(&self) -> bool {
        !matches!(self, Badge::Unlabelled)
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::Unlabelled => write!(f, "Unlabelled"),
            Badge::NoLabels => write!(f, "No labels"),
            Badge::Labels(1) => write!(f, "1 label"),
            Badge::Labels(n) => write!(f, "{} labels", n),
        }
    }
}

impl From<Badge> for String {
    fn from(badge: Badge) -> Self {
        badge.to_string()
    }
}

/// A row of the image list.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageListItem {
    pub name: String,
    pub badge: Badge,
    pub labelled: bool,
}

/// The image list for the current folder.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageList {
    pub images_path: String,
    pub items: Vec<ImageListItem>,
    /// Set when the folder is unset, unreadable or holds no images.
    pub empty: bool,
}

/// The image shown in the preview pane and its checkbox state.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub name: String,
    /// Absolute path of the image, loaded by the webview through the asset protocol.
    pub file_path: String,
    /// `checked[i]` is the state of the checkbox for label index `i + 1`.
    pub checked: [bool; LABEL_SLOTS],
}

impl ImageView {
    /// Label indices of the checked boxes, ascending.
    pub fn checked_labels(&self) -> Vec<u8> {
        checked_to_labels(&self.checked)
    }
}

/// Converts a label list into checkbox state, ignoring out-of-range indices.
pub fn labels_to_checked(labels: &[u8]) -> [bool; LABEL_SLOTS] {
    let mut checked = [false; LABEL_SLOTS];
    for &label in labels {
        let slot = label as usize;
        if (1..=LABEL_SLOTS).contains(&slot) {
            checked[slot - 1] = true;
        }
    }
    checked
}

/// Label indices of the checked boxes, in ascending order.
pub fn checked_to_labels(checked: &[bool; LABEL_SLOTS]) -> Vec<u8> {
    checked
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(i, _)| (i + 1) as u8)
        .collect()
}

/// Result of a save-and-advance action.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub list: ImageList,
    pub next: Option<ImageView>,
}

/// Generic API result for IPC commands
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ImageList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
}

impl ApiResult {
    /// Create a successful result
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// The user dismissed a picker; nothing happened.
    pub fn cancelled() -> Self {
        Self {
            success: true,
            cancelled: Some(true),
            ..Default::default()
        }
    }

    pub fn with_list(list: ImageList) -> Self {
        Self {
            success: true,
            list: Some(list),
            ..Default::default()
        }
    }

    pub fn with_image(image: ImageView) -> Self {
        Self {
            success: true,
            image: Some(image),
            ..Default::default()
        }
    }

    pub fn with_saved(outcome: SaveOutcome) -> Self {
        Self {
            success: true,
            list: Some(outcome.list),
            image: outcome.next,
            ..Default::default()
        }
    }

    pub fn with_export(copied: usize, export_path: impl Into<String>) -> Self {
        Self {
            success: true,
            copied: Some(copied),
            export_path: Some(export_path.into()),
            ..Default::default()
        }
    }
}
