use std::path::PathBuf;

use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_dialog::DialogExt;

use crate::controller::FolderPicker;

pub mod export;
pub mod images;
pub mod labels;

pub use export::*;
pub use images::*;
pub use labels::*;

/// Native folder dialog used for both the images folder and export destination.
pub struct DialogPicker<R: Runtime> {
    app: AppHandle<R>,
    title: &'static str,
}

impl<R: Runtime> DialogPicker<R> {
    pub fn new(app: &AppHandle<R>, title: &'static str) -> Self {
        Self {
            app: app.clone(),
            title,
        }
    }
}

impl<R: Runtime> FolderPicker for DialogPicker<R> {
    fn pick_folder(&self) -> Option<PathBuf> {
        self.app
            .dialog()
            .file()
            .set_title(self.title)
            .blocking_pick_folder()
            .and_then(|path| path.into_path().ok())
    }
}

/// Lets the webview load images from `folder` through the asset protocol.
pub(crate) fn allow_images_folder<R: Runtime>(app: &AppHandle<R>, folder: &str) {
    if folder.is_empty() {
        return;
    }
    if let Err(e) = app.asset_protocol_scope().allow_directory(folder, false) {
        log::warn!("Failed to allow asset access to {}: {}", folder, e);
    }
}
