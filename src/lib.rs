pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod filesystem;
pub mod labels;
pub mod models;
pub mod store;

#[cfg(feature = "desktop")]
pub mod commands;
#[cfg(feature = "desktop")]
mod menu;

pub use controller::{FolderPicker, LabellerController, Settings};
pub use error::LabelError;
pub use labels::LabelAssignmentService;
pub use store::LabelStore;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::default_labels;

/// Opens the store described by `config`, seeds the vocabulary if it is
/// missing and builds the controller around it.
pub fn open_controller(config: &AppConfig) -> Result<LabellerController, LabelError> {
    config.ensure_directories()?;
    let store = Arc::new(LabelStore::open(&config.store_file)?);
    store.seed_labels(&default_labels())?;

    let labels = LabelAssignmentService::new(store)?;
    LabellerController::from_store(labels)
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            // Focus the main window when a second instance is launched
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.set_focus();
                let _ = window.unminimize();
            }
        }))
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let config = AppConfig::new_with_base(&app.path().app_data_dir()?);
            config.init_logging();
            log::info!("Using label store {}", config.store_file.display());

            let controller = open_controller(&config)?;
            app.manage(controller);
            menu::install(app)?;

            #[cfg(debug_assertions)]
            {
                if let Some(window) = app.get_webview_window("main") {
                    window.open_devtools();
                }
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::images::get_images_path,
            commands::images::select_images_path,
            commands::images::get_image_list,
            commands::images::select_image,
            commands::images::next_image,
            commands::images::previous_image,
            commands::labels::get_label_vocabulary,
            commands::labels::toggle_label,
            commands::labels::handle_label_key,
            commands::labels::set_label_checked,
            commands::labels::save_and_next,
            commands::export::export_labelled_images,
            commands::export::reveal_export_folder,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let tauri::RunEvent::Exit = event {
                if let Some(controller) = app.try_state::<LabellerController>() {
                    if let Err(e) = tauri::async_runtime::block_on(controller.flush()) {
                        log::error!("Failed to flush label store: {}", e);
                    }
                }
            }
        });
}
