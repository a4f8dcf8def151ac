use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;

use crate::commands::DialogPicker;
use crate::controller::LabellerController;
use crate::models::ApiResult;

/// Asks for a destination, exports the current folder and reports the count
/// in an info dialog. Shared by the command and the File menu entry.
pub async fn run_export<R: Runtime>(app: &AppHandle<R>) -> ApiResult {
    let controller = app.state::<LabellerController>();
    let picker = DialogPicker::new(app, "Choose export folder");

    match controller.export(&picker).await {
        Ok(Some((destination, copied))) => {
            let destination = destination.to_string_lossy().into_owned();
            app.dialog()
                .message(format!("{} images exported to {}", copied, destination))
                .title("Export Labelled Images")
                .kind(MessageDialogKind::Info)
                .show(|_| {});
            ApiResult::with_export(copied, destination)
        }
        Ok(None) => ApiResult::cancelled(),
        Err(e) => {
            log::error!("Export failed: {}", e);
            ApiResult::error(e)
        }
    }
}

/// Exports labelled images of the current folder into per-label folders.
#[tauri::command]
pub async fn export_labelled_images(app: AppHandle) -> Result<ApiResult, String> {
    Ok(run_export(&app).await)
}

/// Opens an export destination in the system file manager.
///
/// # Arguments
/// * `path` - The folder returned by a previous export
#[tauri::command]
pub async fn reveal_export_folder(path: String, app: AppHandle) -> Result<ApiResult, String> {
    match app.opener().open_path(path, None::<&str>) {
        Ok(()) => Ok(ApiResult::success()),
        Err(e) => Ok(ApiResult::error(format!("Failed to open folder: {}", e))),
    }
}
