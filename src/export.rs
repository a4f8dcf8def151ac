use std::fs;
use std::path::Path;

use crate::error::LabelError;
use crate::filesystem::{validate_file_name, validate_path};
use crate::labels::LabelAssignmentService;

/// Copies labelled images into one subfolder per label.
pub struct ExportService<'a> {
    labels: &'a LabelAssignmentService,
}

impl<'a> ExportService<'a> {
    pub fn new(labels: &'a LabelAssignmentService) -> Self {
        Self { labels }
    }

    /// Exports the labelled images of `folder` into `destination`.
    ///
    /// Each image lands in `destination/<label name>/<file name>` once per
    /// label it carries. Missing sources and already existing targets are
    /// skipped, as are individual copy failures. Returns the number of files
    /// actually copied.
    pub fn export(&self, folder: &str, destination: &Path) -> Result<usize, LabelError> {
        let images = self.labels.get_all(folder)?;
        let source_dir = Path::new(folder);
        let mut copied = 0;

        for label in self.labels.vocabulary() {
            let label_images: Vec<_> = images
                .iter()
                .filter(|image| image.labels.contains(&label.index))
                .collect();

            if label_images.is_empty() {
                continue;
            }

            if let Err(e) = validate_file_name(&label.name) {
                log::warn!("Skipping label {}: {}", label.index, e);
                continue;
            }

            let label_dir = destination.join(&label.name);
            if let Err(e) = fs::create_dir_all(&label_dir) {
                log::warn!("Cannot create {}: {}", label_dir.display(), e);
                continue;
            }

            for image in label_images {
                let (source, target) = match (
                    validate_path(source_dir, &image.path),
                    validate_path(&label_dir, &image.path),
                ) {
                    (Ok(source), Ok(target)) => (source, target),
                    (Err(e), _) | (_, Err(e)) => {
                        log::warn!("Skipping {}: {}", image.path, e);
                        continue;
                    }
                };

                if !source.is_file() || target.exists() {
                    log::debug!("Skipping {} for label {}", image.path, label.name);
                    continue;
                }

                match fs::copy(&source, &target) {
                    Ok(_) => copied += 1,
                    Err(e) => log::warn!("Failed to copy {}: {}", source.display(), e),
                }
            }
        }

        log::info!(
            "Exported {} images from {} to {}",
            copied,
            folder,
            destination.display()
        );
        Ok(copied)
    }
}
