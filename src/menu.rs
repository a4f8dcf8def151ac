use tauri::menu::{MenuBuilder, MenuItemBuilder, SubmenuBuilder};
use tauri::App;

use crate::commands::run_export;

/// Id of the File > Export entry.
pub const EXPORT_MENU_ID: &str = "export-labelled-images";

/// Installs the application menu: File > Export labelled images, Quit.
pub fn install(app: &App) -> tauri::Result<()> {
    let export = MenuItemBuilder::with_id(EXPORT_MENU_ID, "&Export labelled images")
        .accelerator("CmdOrCtrl+E")
        .build(app)?;

    let file_menu = SubmenuBuilder::new(app, "File")
        .item(&export)
        .separator()
        .quit()
        .build()?;

    let menu = MenuBuilder::new(app).item(&file_menu).build()?;
    app.handle().set_menu(menu)?;

    app.on_menu_event(|app, event| {
        if event.id().as_ref() == EXPORT_MENU_ID {
            let app = app.clone();
            tauri::async_runtime::spawn(async move {
                let result = run_export(&app).await;
                if let Some(e) = result.error {
                    log::error!("Export from menu failed: {}", e);
                }
            });
        }
    });

    Ok(())
}
