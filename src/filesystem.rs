use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::LabelError;

/// Suffixes (lower-case, with the dot) listed as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".cr2"];

/// Whether `name` ends with a recognized image suffix, ignoring case.
///
/// This is a plain suffix match, so dotfiles such as `.JPG` count as images.
pub fn is_image_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Validates that `file_name` is a single path component on this platform.
///
/// Rejects empty names, "." and "..", and anything the platform would split
/// into several components. A backslash is therefore refused on Windows but
/// is an ordinary filename character on Unix.
///
/// # Arguments
/// * `file_name` - A bare filename as produced by [`list_images`]
pub fn validate_file_name(file_name: &str) -> Result<(), LabelError> {
    if file_name.is_empty() {
        return Err(LabelError::InvalidPath("File name is empty".to_string()));
    }

    if file_name == "." || file_name == ".." {
        return Err(LabelError::InvalidPath(format!(
            "File name '{}' is a traversal pattern",
            file_name
        )));
    }

    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == OsStr::new(file_name) => Ok(()),
        _ => Err(LabelError::InvalidPath(format!(
            "File name '{}' is not a single path component",
            file_name
        ))),
    }
}

/// Joins `file_name` onto `base_dir` after checking it cannot escape it.
///
/// Existing targets are canonicalized and must resolve inside the
/// canonicalized base, so a symlink pointing elsewhere is refused.
pub fn validate_path(base_dir: &Path, file_name: &str) -> Result<PathBuf, LabelError> {
    validate_file_name(file_name)?;

    let full_path = base_dir.join(file_name);
    if !full_path.exists() {
        return Ok(full_path);
    }

    let canonical_base = base_dir.canonicalize()?;
    let resolved = full_path.canonicalize()?;
    if !resolved.starts_with(&canonical_base) {
        return Err(LabelError::InvalidPath(format!(
            "'{}' resolves outside of {}",
            file_name,
            base_dir.display()
        )));
    }

    Ok(full_path)
}

/// Lists the image filenames of `folder`, sorted in ascending ordinal order.
///
/// An empty `folder` yields an empty list; a folder that cannot be read is
/// reported as [`LabelError::DirectoryUnreadable`]. Entries that are not
/// regular files, or whose names are not valid UTF-8, are skipped.
pub fn list_images(folder: &str) -> Result<Vec<String>, LabelError> {
    if folder.is_empty() {
        return Ok(Vec::new());
    }

    let dir_path = Path::new(folder);
    let read_dir = fs::read_dir(dir_path).map_err(|source| LabelError::DirectoryUnreadable {
        path: dir_path.to_path_buf(),
        source,
    })?;

    let mut images = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                log::debug!("Skipping non UTF-8 file name {:?}", raw);
                continue;
            }
        };

        if !is_image_file(&name) || !entry.path().is_file() {
            continue;
        }

        images.push(name);
    }

    images.sort();
    Ok(images)
}

/// Like [`list_images`], but an unreadable folder becomes an empty list.
pub fn list_images_or_empty(folder: &str) -> Vec<String> {
    match list_images(folder) {
        Ok(images) => images,
        Err(e) if e.is_empty_listing() => {
            log::warn!("Showing empty image list: {}", e);
            Vec::new()
        }
        Err(e) => {
            log::error!("Unexpected listing failure: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"img").unwrap();
    }

    #[test]
    fn test_is_image_file_case_insensitive() {
        assert!(is_image_file("a.jpg"));
        assert!(is_image_file("b.JPEG"));
        assert!(is_image_file("c.Png"));
        assert!(is_image_file("IMG_0001.CR2"));
        assert!(is_image_file(".JPG"));
        assert!(is_image_file(".png"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("archive.jpg.zip"));
        assert!(!is_image_file("jpg"));
        assert!(!is_image_file("photo.gif"));
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        for name in ["b.png", "a.JPG", "C.cr2", "readme.md", "d.jpeg", "e.gif"] {
            touch(dir, name);
        }
        fs::create_dir(dir.join("folder.jpg")).unwrap();

        let images = list_images(dir.to_str().unwrap()).unwrap();
        // Ordinal order puts upper-case before lower-case
        assert_eq!(images, vec!["C.cr2", "a.JPG", "b.png", "d.jpeg"]);
    }

    #[test]
    fn test_list_images_empty_path() {
        assert!(list_images("").unwrap().is_empty());
    }

    #[test]
    fn test_list_images_missing_folder() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = list_images(missing.to_str().unwrap()).unwrap_err();
        assert!(err.is_empty_listing());
        assert!(list_images_or_empty(missing.to_str().unwrap()).is_empty());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("cat.jpg").is_ok());
        assert!(validate_file_name("my..photo.jpg").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name(".hidden.jpg").is_ok());
        assert!(validate_file_name("a/b.jpg").is_err());
        assert!(validate_file_name("a/").is_err());
        assert!(validate_file_name("/a.jpg").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_is_a_filename_character_on_unix() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "a\\b.jpg");

        assert!(validate_file_name("a\\b.jpg").is_ok());
        let path = validate_path(temp_dir.path(), "a\\b.jpg").unwrap();
        assert!(path.is_file());
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_is_a_separator_on_windows() {
        assert!(validate_file_name("a\\b.jpg").is_err());
    }

    #[test]
    fn test_list_images_includes_dotfile_images() {
        let temp_dir = tempdir().unwrap();
        for name in [".JPG", ".png", ".txt", "photo.jpg"] {
            touch(temp_dir.path(), name);
        }

        let images = list_images(temp_dir.path().to_str().unwrap()).unwrap();
        assert_eq!(images, vec![".JPG", ".png", "photo.jpg"]);
    }

    #[test]
    fn test_validate_path_joins_name() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "cat.jpg");

        let path = validate_path(temp_dir.path(), "cat.jpg").unwrap();
        assert_eq!(path, temp_dir.path().join("cat.jpg"));

        let missing = validate_path(temp_dir.path(), "dog.jpg").unwrap();
        assert_eq!(missing, temp_dir.path().join("dog.jpg"));

        assert!(validate_path(temp_dir.path(), "../cat.jpg").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_path_rejects_escaping_symlink() {
        let base = tempdir().unwrap();
        let outside = tempdir().unwrap();
        touch(outside.path(), "secret.jpg");
        std::os::unix::fs::symlink(outside.path().join("secret.jpg"), base.path().join("link.jpg"))
            .unwrap();

        assert!(validate_path(base.path(), "link.jpg").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Every image copied into a folder is listed exactly once, in sorted position.
        #[test]
        fn prop_listed_once_in_sorted_position(
            stems in proptest::collection::btree_set("[A-Za-z0-9_-]{1,12}", 1..12),
            ext in prop_oneof![Just("jpg"), Just("JPEG"), Just("png"), Just("Cr2")],
        ) {
            let temp_dir = tempdir().unwrap();
            let names: Vec<String> = stems.iter().map(|s| format!("{}.{}", s, ext)).collect();
            for name in &names {
                touch(temp_dir.path(), name);
            }
            touch(temp_dir.path(), "ignored.txt");

            let images = list_images(temp_dir.path().to_str().unwrap()).unwrap();
            for name in &names {
                prop_assert_eq!(images.iter().filter(|i| *i == name).count(), 1);
            }
            let mut sorted = images.clone();
            sorted.sort();
            prop_assert_eq!(images, sorted);
        }
    }
}
