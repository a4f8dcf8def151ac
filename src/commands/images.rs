use tauri::{AppHandle, State};

use crate::commands::{allow_images_folder, DialogPicker};
use crate::controller::LabellerController;
use crate::models::ApiResult;

/// Gets the persisted images folder.
///
/// Returns an empty string when no folder was ever selected.
#[tauri::command]
pub async fn get_images_path(controller: State<'_, LabellerController>) -> Result<String, String> {
    Ok(controller.images_path().await)
}

/// Opens the folder picker and switches to the chosen images folder.
///
/// Dismissing the picker leaves everything as it was and reports `cancelled`.
#[tauri::command]
pub async fn select_images_path(
    app: AppHandle,
    controller: State<'_, LabellerController>,
) -> Result<ApiResult, String> {
    let picker = DialogPicker::new(&app, "Choose images folder");
    match controller.select_folder(&picker).await {
        Ok(Some(list)) => {
            allow_images_folder(&app, &list.images_path);
            Ok(ApiResult::with_list(list))
        }
        Ok(None) => Ok(ApiResult::cancelled()),
        Err(e) => Ok(ApiResult::error(e)),
    }
}

/// Lists the images of the current folder with their label badges.
///
/// An unreadable folder yields an empty list flagged `empty`.
#[tauri::command]
pub async fn get_image_list(
    app: AppHandle,
    controller: State<'_, LabellerController>,
) -> Result<ApiResult, String> {
    match controller.image_list().await {
        Ok(list) => {
            allow_images_folder(&app, &list.images_path);
            Ok(ApiResult::with_list(list))
        }
        Err(e) => Ok(ApiResult::error(e)),
    }
}

/// Displays an image and loads its saved labels into the checkboxes.
///
/// # Arguments
/// * `name` - File name of the image within the current folder
#[tauri::command]
pub async fn select_image(
    name: String,
    controller: State<'_, LabellerController>,
) -> Result<ApiResult, String> {
    match controller.select_image(&name).await {
        Ok(view) => Ok(ApiResult::with_image(view)),
        Err(e) => Ok(ApiResult::error(e)),
    }
}

#[tauri::command]
pub async fn next_image(controller: State<'_, LabellerController>) -> Result<ApiResult, String> {
    match controller.next_image().await {
        Ok(Some(view)) => Ok(ApiResult::with_image(view)),
        Ok(None) => Ok(ApiResult::success()),
        Err(e) => Ok(ApiResult::error(e)),
    }
}

#[tauri::command]
pub async fn previous_image(controller: State<'_, LabellerController>) -> Result<ApiResult, String> {
    match controller.previous_image().await {
        Ok(Some(view)) => Ok(ApiResult::with_image(view)),
        Ok(None) => Ok(ApiResult::success()),
        Err(e) => Ok(ApiResult::error(e)),
    }
}
