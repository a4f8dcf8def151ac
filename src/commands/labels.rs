use tauri::State;

use crate::controller::LabellerController;
use crate::models::{ApiResult, Label, LABEL_SLOTS};

/// Returns the label vocabulary, in checkbox order.
#[tauri::command]
pub async fn get_label_vocabulary(
    controller: State<'_, LabellerController>,
) -> Result<Vec<Label>, String> {
    Ok(controller.vocabulary().to_vec())
}

/// Flips the checkbox of a label.
///
/// # Arguments
/// * `index` - Label index, 1 to 9
#[tauri::command]
pub async fn toggle_label(
    index: u8,
    controller: State<'_, LabellerController>,
) -> Result<[bool; LABEL_SLOTS], String> {
    controller.toggle_label(index).await.map_err(String::from)
}

/// Handles a key released anywhere in the window.
///
/// Digits 1-9 toggle the matching checkbox and return the new state; any
/// other key returns `None`.
#[tauri::command]
pub async fn handle_label_key(
    key: String,
    controller: State<'_, LabellerController>,
) -> Result<Option<[bool; LABEL_SLOTS]>, String> {
    Ok(controller.handle_key(&key).await)
}

#[tauri::command]
pub async fn set_label_checked(
    index: u8,
    checked: bool,
    controller: State<'_, LabellerController>,
) -> Result<[bool; LABEL_SLOTS], String> {
    controller
        .set_label_checked(index, checked)
        .await
        .map_err(String::from)
}

/// Saves the checked labels for the displayed image and shows the next one.
///
/// On a rejected save the checkbox state is kept and the error is returned
/// in the result.
#[tauri::command]
pub async fn save_and_next(controller: State<'_, LabellerController>) -> Result<ApiResult, String> {
    match controller.save_and_advance().await {
        Ok(outcome) => Ok(ApiResult::with_saved(outcome)),
        Err(e) => {
            log::warn!("Save rejected: {}", e);
            Ok(ApiResult::error(e))
        }
    }
}
