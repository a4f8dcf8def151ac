use std::fs;
use std::path::{Path, PathBuf};

use image_labeller_lib::config::AppConfig;
use image_labeller_lib::models::Badge;
use image_labeller_lib::open_controller;
use image_labeller_lib::store::{LabelStore, LABELS_KEY};
use tempfile::tempdir;

fn write_images(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

#[tokio::test]
async fn label_save_export_and_restart() {
    let data = tempdir().unwrap();
    let pictures = tempdir().unwrap();
    let export_dir = tempdir().unwrap();
    write_images(pictures.path(), &["x.jpg", "y.jpg", "z.png", "notes.txt"]);

    let config = AppConfig::new_with_base(data.path());
    let controller = open_controller(&config).unwrap();

    // Fresh store: nothing selected yet
    assert!(controller.startup().await.unwrap().empty);

    let picked = pictures.path().to_path_buf();
    let list = controller
        .select_folder(&move || Some(picked.clone()))
        .await
        .unwrap()
        .unwrap();
    let names: Vec<&str> = list.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["x.jpg", "y.jpg", "z.png"]);
    assert!(list.items.iter().all(|i| i.badge == Badge::Unlabelled));

    // Label x and y as Oreo (6) through the save-and-advance workflow
    controller.select_image("x.jpg").await.unwrap();
    controller.handle_key("6").await.unwrap();
    let outcome = controller.save_and_advance().await.unwrap();
    assert_eq!(outcome.next.as_ref().unwrap().name, "y.jpg");

    controller.handle_key("6").await.unwrap();
    let outcome = controller.save_and_advance().await.unwrap();
    assert_eq!(outcome.next.as_ref().unwrap().name, "z.png");
    let badges: Vec<String> = outcome.list.items.iter().map(|i| i.badge.to_string()).collect();
    assert_eq!(badges, vec!["1 label", "1 label", "Unlabelled"]);

    let destination = export_dir.path().to_path_buf();
    let pick_destination = move || -> Option<PathBuf> { Some(destination.clone()) };
    let (_, copied) = controller.export(&pick_destination).await.unwrap().unwrap();
    assert_eq!(copied, 2);
    assert!(export_dir.path().join("Oreo").join("x.jpg").is_file());
    assert!(export_dir.path().join("Oreo").join("y.jpg").is_file());

    let (_, copied) = controller.export(&pick_destination).await.unwrap().unwrap();
    assert_eq!(copied, 0);

    controller.flush().await.unwrap();
    drop(controller);

    // A restart picks up the folder and the saved labels
    let restarted = open_controller(&config).unwrap();
    let list = restarted.startup().await.unwrap();
    assert_eq!(list.images_path, pictures.path().to_str().unwrap());
    let view = restarted.select_image("y.jpg").await.unwrap();
    assert_eq!(view.checked_labels(), vec![6]);
}

#[tokio::test]
async fn folder_paths_differing_in_case_share_labels() {
    let data = tempdir().unwrap();
    let root = tempdir().unwrap();
    let upper = root.path().join("Pics");
    let lower = root.path().join("pics");
    // On a case-insensitive filesystem both spellings name one folder
    fs::create_dir_all(&upper).unwrap();
    fs::create_dir_all(&lower).unwrap();
    write_images(&upper, &["a.jpg"]);
    write_images(&lower, &["a.jpg"]);

    let config = AppConfig::new_with_base(data.path());
    let controller = open_controller(&config).unwrap();

    let picked = upper.clone();
    controller
        .select_folder(&move || Some(picked.clone()))
        .await
        .unwrap()
        .unwrap();
    controller.select_image("a.jpg").await.unwrap();
    controller.handle_key("2").await.unwrap();
    controller.save_and_advance().await.unwrap();

    let picked = lower.clone();
    let list = controller
        .select_folder(&move || Some(picked.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(list.images_path, lower.to_str().unwrap());
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].badge, Badge::Labels(1));

    let view = controller.select_image("a.jpg").await.unwrap();
    assert_eq!(view.checked_labels(), vec![2]);
}

#[tokio::test]
async fn startup_keeps_customized_vocabulary() {
    let data = tempdir().unwrap();
    let config = AppConfig::new_with_base(data.path());

    {
        let store = LabelStore::open(&config.store_file).unwrap();
        store
            .set_setting(
                LABELS_KEY,
                &vec![image_labeller_lib::models::Label::new("Tabby", 1)],
            )
            .unwrap();
    }

    let controller = open_controller(&config).unwrap();
    assert_eq!(controller.vocabulary().len(), 1);
    assert_eq!(controller.vocabulary()[0].name, "Tabby");
}
