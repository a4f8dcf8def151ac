use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::LabelError;
use crate::export::ExportService;
use crate::filesystem::{list_images_or_empty, validate_path};
use crate::labels::LabelAssignmentService;
use crate::models::{
    checked_to_labels, labels_to_checked, Badge, ImageList, ImageListItem, ImageView, Label,
    LabelledImage, SaveOutcome, LABEL_SLOTS,
};
use crate::store::LabelStore;

/// Source of folder selections, usually a native dialog.
///
/// Returning `None` means the user dismissed the picker.
pub trait FolderPicker {
    fn pick_folder(&self) -> Option<PathBuf>;
}

impl<F> FolderPicker for F
where
    F: Fn() -> Option<PathBuf>,
{
    fn pick_folder(&self) -> Option<PathBuf> {
        self()
    }
}

/// Process-wide settings the controller works from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    images_path: String,
}

impl Settings {
    pub fn new(images_path: impl Into<String>) -> Self {
        Self {
            images_path: images_path.into(),
        }
    }

    /// Reads the persisted settings.
    pub fn load(store: &LabelStore) -> Result<Self, LabelError> {
        Ok(Self::new(store.get_images_path()?))
    }

    pub fn images_path(&self) -> &str {
        &self.images_path
    }

    /// The only way to change the images folder: persist first, then adopt.
    fn set_images_path(&mut self, store: &LabelStore, images_path: String) -> Result<(), LabelError> {
        store.set_images_path(&images_path)?;
        self.images_path = images_path;
        Ok(())
    }
}

/// Maps a key name to the label checkbox it toggles (`"1"`..=`"9"`).
pub fn label_for_key(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ '1'..='9'), None) => c.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

/// The image after `current` in listing order, wrapping to the first.
///
/// An image missing from the listing is treated as sitting before the start.
pub fn next_image_name<'a>(images: &'a [String], current: Option<&str>) -> Option<&'a String> {
    let position = current.and_then(|name| images.iter().position(|i| i == name));
    match position {
        Some(i) if i + 1 < images.len() => images.get(i + 1),
        _ => images.first(),
    }
}

/// The image before `current` in listing order, wrapping to the last.
pub fn previous_image_name<'a>(images: &'a [String], current: Option<&str>) -> Option<&'a String> {
    let position = current.and_then(|name| images.iter().position(|i| i == name));
    match position {
        Some(i) if i > 0 => images.get(i - 1),
        _ => images.last(),
    }
}

/// Merges a listing with saved assignments into list rows with badges.
pub fn build_image_list(images_path: &str, names: Vec<String>, saved: &[LabelledImage]) -> ImageList {
    let items: Vec<ImageListItem> = names
        .into_iter()
        .map(|name| {
            let badge = Badge::for_entry(saved.iter().find(|entry| entry.path == name));
            ImageListItem {
                labelled: badge.is_labelled(),
                badge,
                name,
            }
        })
        .collect();

    ImageList {
        images_path: images_path.to_string(),
        empty: items.is_empty(),
        items,
    }
}

struct ControllerState {
    settings: Settings,
    current: Option<String>,
    checked: [bool; LABEL_SLOTS],
}

/// LabellerController sequences the store, lister, assignment and export
/// services in response to user actions.
///
/// Actions run one at a time: each takes the state mutex for its whole
/// duration, and tokio's mutex hands it out in request order.
pub struct LabellerController {
    labels: LabelAssignmentService,
    state: Mutex<ControllerState>,
}

impl LabellerController {
    pub fn new(labels: LabelAssignmentService, settings: Settings) -> Self {
        Self {
            labels,
            state: Mutex::new(ControllerState {
                settings,
                current: None,
                checked: [false; LABEL_SLOTS],
            }),
        }
    }

    /// Builds a controller whose settings come from the store.
    pub fn from_store(labels: LabelAssignmentService) -> Result<Self, LabelError> {
        let settings = Settings::load(labels.store())?;
        Ok(Self::new(labels, settings))
    }

    /// Labels offered as checkboxes, in display order.
    pub fn vocabulary(&self) -> &[Label] {
        self.labels.vocabulary()
    }

    /// The selected images folder, empty if none.
    pub async fn images_path(&self) -> String {
        self.state.lock().await.settings.images_path().to_string()
    }

    /// Initial list for the persisted folder.
    pub async fn startup(&self) -> Result<ImageList, LabelError> {
        let state = self.state.lock().await;
        log::info!("Starting with images folder '{}'", state.settings.images_path());
        self.list_for(state.settings.images_path())
    }

    /// Asks `picker` for a new images folder; `Ok(None)` if cancelled.
    pub async fn select_folder(
        &self,
        picker: &impl FolderPicker,
    ) -> Result<Option<ImageList>, LabelError> {
        let folder = match pick(picker) {
            Err(LabelError::UserCancelled) => {
                log::debug!("Folder selection cancelled");
                return Ok(None);
            }
            result => result?,
        };

        let mut state = self.state.lock().await;
        state
            .settings
            .set_images_path(self.labels.store(), folder.to_string_lossy().into_owned())?;
        state.current = None;
        state.checked = [false; LABEL_SLOTS];
        log::info!("Selected images folder {}", folder.display());

        self.list_for(state.settings.images_path()).map(Some)
    }

    /// Current list with badges. Unreadable folders produce an empty list.
    pub async fn image_list(&self) -> Result<ImageList, LabelError> {
        let state = self.state.lock().await;
        self.list_for(state.settings.images_path())
    }

    /// Displays `name` and mirrors its saved labels into the checkboxes.
    pub async fn select_image(&self, name: &str) -> Result<ImageView, LabelError> {
        let mut state = self.state.lock().await;
        self.show(&mut state, name)
    }

    /// The image currently displayed, if any.
    pub async fn current_image(&self) -> Result<Option<ImageView>, LabelError> {
        let state = self.state.lock().await;
        match &state.current {
            Some(name) => Ok(Some(self.view(&state, name)?)),
            None => Ok(None),
        }
    }

    /// Shows the image after the current one, wrapping to the first.
    ///
    /// # Returns
    /// `None` when the folder lists no images
    pub async fn next_image(&self) -> Result<Option<ImageView>, LabelError> {
        let mut state = self.state.lock().await;
        let images = self.listing(state.settings.images_path());
        let target = next_image_name(&images, state.current.as_deref()).cloned();
        match target {
            Some(name) => self.show(&mut state, &name).map(Some),
            None => Ok(None),
        }
    }

    /// Shows the image before the current one, wrapping to the last.
    pub async fn previous_image(&self) -> Result<Option<ImageView>, LabelError> {
        let mut state = self.state.lock().await;
        let images = self.listing(state.settings.images_path());
        let target = previous_image_name(&images, state.current.as_deref()).cloned();
        match target {
            Some(name) => self.show(&mut state, &name).map(Some),
            None => Ok(None),
        }
    }

    /// Flips the checkbox of label `index` (1-based).
    pub async fn toggle_label(&self, index: u8) -> Result<[bool; LABEL_SLOTS], LabelError> {
        let slot = checkbox_slot(index)?;
        let mut state = self.state.lock().await;
        state.checked[slot] = !state.checked[slot];
        Ok(state.checked)
    }

    /// Sets the checkbox of label `index` (1-based) without saving.
    ///
    /// # Returns
    /// The checkbox state after the change
    pub async fn set_label_checked(
        &self,
        index: u8,
        checked: bool,
    ) -> Result<[bool; LABEL_SLOTS], LabelError> {
        let slot = checkbox_slot(index)?;
        let mut state = self.state.lock().await;
        state.checked[slot] = checked;
        Ok(state.checked)
    }

    /// Digit keys toggle their checkbox; any other key is ignored (`None`).
    pub async fn handle_key(&self, key: &str) -> Option<[bool; LABEL_SLOTS]> {
        let index = label_for_key(key)?;
        self.toggle_label(index).await.ok()
    }

    /// Saves the checked labels for the current image, then moves on.
    ///
    /// A rejected save leaves the checkbox state untouched. Once the save is
    /// stored the outcome always carries the refreshed list; `next` is `None`
    /// when there is no next image or it cannot be shown.
    pub async fn save_and_advance(&self) -> Result<SaveOutcome, LabelError> {
        let mut state = self.state.lock().await;
        let current = state
            .current
            .clone()
            .ok_or_else(|| LabelError::Validation("No image selected".to_string()))?;

        let labels = checked_to_labels(&state.checked);
        let images_path = state.settings.images_path().to_string();
        let saved = self.labels.set_labels(&images_path, &current, &labels)?;

        let names = self.listing(&images_path);
        let next = next_image_name(&names, Some(&current)).cloned();
        let list = build_image_list(&images_path, names, &saved);

        // The save already happened, so a failure to show the next image
        // must not hide the refreshed list.
        let next = match next {
            Some(name) => match self.show(&mut state, &name) {
                Ok(view) => Some(view),
                Err(e) => {
                    log::warn!("Saved {} but cannot show {}: {}", current, name, e);
                    None
                }
            },
            None => None,
        };

        Ok(SaveOutcome { list, next })
    }

    /// Exports the current folder into a picked destination.
    ///
    /// Returns the destination and the copied count, or `None` if cancelled.
    pub async fn export(
        &self,
        picker: &impl FolderPicker,
    ) -> Result<Option<(PathBuf, usize)>, LabelError> {
        let destination = match pick(picker) {
            Err(LabelError::UserCancelled) => {
                log::debug!("Export cancelled");
                return Ok(None);
            }
            result => result?,
        };

        let state = self.state.lock().await;
        let copied =
            ExportService::new(&self.labels).export(state.settings.images_path(), &destination)?;
        Ok(Some((destination, copied)))
    }

    /// Persists the store; called on shutdown.
    pub async fn flush(&self) -> Result<(), LabelError> {
        let _state = self.state.lock().await;
        self.labels.store().flush()
    }

    fn listing(&self, images_path: &str) -> Vec<String> {
        list_images_or_empty(images_path)
    }

    fn list_for(&self, images_path: &str) -> Result<ImageList, LabelError> {
        let names = self.listing(images_path);
        let saved = self.labels.get_all(images_path)?;
        Ok(build_image_list(images_path, names, &saved))
    }

    fn show(&self, state: &mut ControllerState, name: &str) -> Result<ImageView, LabelError> {
        let images_path = state.settings.images_path();
        if images_path.is_empty() {
            return Err(LabelError::Validation("No images folder selected".to_string()));
        }

        validate_path(Path::new(images_path), name)?;
        let labels = self.labels.get_labels(images_path, name)?;
        state.current = Some(name.to_string());
        state.checked = labels_to_checked(&labels);
        self.view(state, name)
    }

    fn view(&self, state: &ControllerState, name: &str) -> Result<ImageView, LabelError> {
        let file_path = validate_path(Path::new(state.settings.images_path()), name)?;
        Ok(ImageView {
            name: name.to_string(),
            file_path: file_path.to_string_lossy().into_owned(),
            checked: state.checked,
        })
    }
}

fn pick(picker: &impl FolderPicker) -> Result<PathBuf, LabelError> {
    picker.pick_folder().ok_or(LabelError::UserCancelled)
}

fn checkbox_slot(index: u8) -> Result<usize, LabelError> {
    let slot = index as usize;
    if (1..=LABEL_SLOTS).contains(&slot) {
        Ok(slot - 1)
    } else {
        Err(LabelError::Validation(format!(
            "label {} has no checkbox (expected 1-{})",
            index, LABEL_SLOTS
        )))
    }
}
