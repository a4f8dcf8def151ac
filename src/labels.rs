use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LabelError;
use crate::filesystem::validate_file_name;
use crate::models::{default_labels, Label, LabelledImage};
use crate::store::{folder_key, LabelStore};

/// LabelAssignmentService reads and upserts per-folder label assignments.
///
/// Each folder's collection lives in the [`LabelStore`] under its normalized
/// folder key. Writes are persisted before `set_labels` returns, and are
/// serialized per folder so two overlapping saves cannot lose an update.
pub struct LabelAssignmentService {
    store: Arc<LabelStore>,
    vocabulary: Vec<Label>,
    folder_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LabelAssignmentService {
    /// Uses the vocabulary stored in `store`, falling back to the default one.
    pub fn new(store: Arc<LabelStore>) -> Result<Self, LabelError> {
        let mut vocabulary = store.get_labels()?;
        if vocabulary.is_empty() {
            vocabulary = default_labels();
        }
        Ok(Self::with_vocabulary(store, vocabulary))
    }

    /// Builds the service around an explicit vocabulary.
    ///
    /// # Arguments
    /// * `store` - The shared label store
    /// * `vocabulary` - The labels that `set_labels` accepts, by index
    pub fn with_vocabulary(store: Arc<LabelStore>, vocabulary: Vec<Label>) -> Self {
        Self {
            store,
            vocabulary,
            folder_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The labels this service validates against, in display order.
    pub fn vocabulary(&self) -> &[Label] {
        &self.vocabulary
    }

    /// The underlying store, shared with the controller's settings.
    pub fn store(&self) -> &Arc<LabelStore> {
        &self.store
    }

    /// Every saved assignment for `folder`, in save order.
    pub fn get_all(&self, folder: &str) -> Result<Vec<LabelledImage>, LabelError> {
        self.store.get_labelled_images(folder)
    }

    /// The saved entry for `image`, `None` if it was never saved.
    pub fn find(&self, folder: &str, image: &str) -> Result<Option<LabelledImage>, LabelError> {
        Ok(self.get_all(folder)?.into_iter().find(|entry| entry.path == image))
    }

    /// Labels saved for `image`; empty when the image has no entry.
    pub fn get_labels(&self, folder: &str, image: &str) -> Result<Vec<u8>, LabelError> {
        Ok(self
            .find(folder, image)?
            .map(|entry| entry.labels)
            .unwrap_or_default())
    }

    /// Checks every index against the vocabulary and drops repeats.
    pub fn validate_labels(&self, labels: &[u8]) -> Result<Vec<u8>, LabelError> {
        let mut validated: Vec<u8> = Vec::with_capacity(labels.len());
        for &label in labels {
            if !self.vocabulary.iter().any(|l| l.index == label) {
                return Err(LabelError::Validation(format!(
                    "label {} is not one of the {} configured labels",
                    label,
                    self.vocabulary.len()
                )));
            }
            if !validated.contains(&label) {
                validated.push(label);
            }
        }
        Ok(validated)
    }

    /// Upserts the labels of `image` and returns the updated collection.
    ///
    /// An existing entry keeps its position; a new one is appended. An empty
    /// `labels` slice is stored as an explicit empty entry.
    ///
    /// # Arguments
    /// * `folder` - The images folder the image belongs to
    /// * `image` - Bare filename of the image
    /// * `labels` - Label indices; repeats are dropped
    ///
    /// # Returns
    /// The folder's collection after the save, or `Validation` if an index is
    /// not in the vocabulary (nothing is stored then)
    pub fn set_labels(
        &self,
        folder: &str,
        image: &str,
        labels: &[u8],
    ) -> Result<Vec<LabelledImage>, LabelError> {
        validate_file_name(image)?;
        let labels = self.validate_labels(labels)?;

        let lock = self.folder_lock(folder);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut images = self.get_all(folder)?;
        match images.iter_mut().find(|entry| entry.path == image) {
            Some(entry) => entry.labels = labels,
            None => images.push(LabelledImage {
                path: image.to_string(),
                labels,
            }),
        }

        self.store.set_labelled_images(folder, &images)?;
        log::debug!("Saved labels for {} in {}", image, folder_key(folder));
        Ok(images)
    }

    fn folder_lock(&self, folder: &str) -> Arc<Mutex<()>> {
        let mut locks = self.folder_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(folder_key(folder)).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::{tempdir, TempDir};

    fn service() -> (TempDir, LabelAssignmentService) {
        let temp_dir = tempdir().unwrap();
        let store = LabelStore::open(temp_dir.path().join("config.json")).unwrap();
        let service = LabelAssignmentService::new(Arc::new(store)).unwrap();
        (temp_dir, service)
    }

    #[test]
    fn test_get_labels_never_saved() {
        let (_dir, service) = service();
        assert!(service.get_all("/pics").unwrap().is_empty());
        assert!(service.get_labels("/pics", "a.jpg").unwrap().is_empty());
        assert!(service.find("/pics", "a.jpg").unwrap().is_none());
    }

    #[test]
    fn test_set_labels_appends_then_replaces_in_place() {
        let (_dir, service) = service();

        service.set_labels("/pics", "a.jpg", &[1]).unwrap();
        service.set_labels("/pics", "b.jpg", &[2, 3]).unwrap();
        let images = service.set_labels("/pics", "a.jpg", &[9, 4]).unwrap();

        assert_eq!(
            images,
            vec![
                LabelledImage {
                    path: "a.jpg".to_string(),
                    labels: vec![9, 4],
                },
                LabelledImage {
                    path: "b.jpg".to_string(),
                    labels: vec![2, 3],
                },
            ]
        );
        assert_eq!(service.get_all("/pics").unwrap(), images);
    }

    #[test]
    fn test_set_labels_empty_is_distinct_from_never_saved() {
        let (_dir, service) = service();

        service.set_labels("/pics", "a.jpg", &[]).unwrap();
        let entry = service.find("/pics", "a.jpg").unwrap();
        assert_eq!(
            entry,
            Some(LabelledImage {
                path: "a.jpg".to_string(),
                labels: vec![],
            })
        );
        assert!(service.find("/pics", "b.jpg").unwrap().is_none());
    }

    #[test]
    fn test_set_labels_deduplicates() {
        let (_dir, service) = service();
        let images = service.set_labels("/pics", "a.jpg", &[3, 1, 3, 1]).unwrap();
        assert_eq!(images[0].labels, vec![3, 1]);
    }

    #[test]
    fn test_set_labels_rejects_out_of_range() {
        let (_dir, service) = service();

        assert!(matches!(
            service.set_labels("/pics", "a.jpg", &[1, 10]),
            Err(LabelError::Validation(_))
        ));
        assert!(matches!(
            service.set_labels("/pics", "a.jpg", &[0]),
            Err(LabelError::Validation(_))
        ));
        // Nothing was stored
        assert!(service.find("/pics", "a.jpg").unwrap().is_none());
    }

    #[test]
    fn test_set_labels_rejects_bad_image_name() {
        let (_dir, service) = service();
        assert!(service.set_labels("/pics", "", &[1]).is_err());
        assert!(service.set_labels("/pics", "../a.jpg", &[1]).is_err());
    }

    #[test]
    fn test_folder_case_folding() {
        let (_dir, service) = service();

        service.set_labels("/Pics", "a.jpg", &[5]).unwrap();
        assert_eq!(service.get_labels("/pics", "a.jpg").unwrap(), vec![5]);
        assert!(service.get_labels("/other", "a.jpg").unwrap().is_empty());
    }

    #[test]
    fn test_stored_vocabulary_bounds_validation() {
        let temp_dir = tempdir().unwrap();
        let store = LabelStore::open(temp_dir.path().join("config.json")).unwrap();
        store
            .seed_labels(&[Label::new("Cat", 1), Label::new("Dog", 2)])
            .unwrap();

        let service = LabelAssignmentService::new(Arc::new(store)).unwrap();
        assert_eq!(service.vocabulary().len(), 2);
        assert!(service.set_labels("/pics", "a.jpg", &[2]).is_ok());
        assert!(service.set_labels("/pics", "a.jpg", &[3]).is_err());
    }

    #[test]
    fn test_concurrent_saves_keep_every_image() {
        let (_dir, service) = service();
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    service
                        .set_labels("/pics", &format!("img{}.jpg", i), &[1])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(service.get_all("/pics").unwrap().len(), 8);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        /// A save is immediately visible to reads, whatever was stored before.
        #[test]
        fn prop_write_then_read(
            image in "[a-z0-9]{1,10}\\.jpg",
            before in proptest::option::of(proptest::collection::vec(1u8..=9, 0..5)),
            labels in proptest::collection::btree_set(1u8..=9, 0..9),
        ) {
            let (_dir, service) = service();
            if let Some(before) = before {
                service.set_labels("/pics", &image, &before).unwrap();
            }
            let labels: Vec<u8> = labels.into_iter().collect();
            service.set_labels("/pics", &image, &labels).unwrap();
            prop_assert_eq!(service.get_labels("/pics", &image).unwrap(), labels);
        }

        /// Saving the same labels twice leaves one entry for the image.
        #[test]
        fn prop_repeated_save_is_idempotent(
            image in "[a-z0-9]{1,10}\\.png",
            labels in proptest::collection::vec(1u8..=9, 0..5),
        ) {
            let (_dir, service) = service();
            service.set_labels("/pics", &image, &labels).unwrap();
            let images = service.set_labels("/pics", &image, &labels).unwrap();
            prop_assert_eq!(images.iter().filter(|i| i.path == image).count(), 1);
            prop_assert_eq!(images.len(), 1);
        }
    }
}
