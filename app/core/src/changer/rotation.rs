//! Rotation over the collection.
//!
//! Each tick applies the next collection item in list order, wrapping at
//! the end. Failures are logged and skipped; a bad image never stops the
//! job, the next tick simply moves on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Rotation;
use crate::collection::CollectionHandle;
use crate::pipeline::{FetchEvent, ImageFetcher, WallpaperApplier};

/// Sequential rotation through the collection.
pub struct CollectionRotation {
    collection: CollectionHandle,
    fetcher: Arc<dyn ImageFetcher>,
    applier: Arc<dyn WallpaperApplier>,
    cursor: Arc<AtomicUsize>,
}

impl CollectionRotation {
    /// Creates a rotation that loads items through `fetcher` and applies
    /// them through `applier`.
    #[must_use]
    pub fn new(
        collection: CollectionHandle,
        fetcher: Arc<dyn ImageFetcher>,
        applier: Arc<dyn WallpaperApplier>,
    ) -> Self {
        Self {
            collection,
            fetcher,
            applier,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Rotation for CollectionRotation {
    fn advance(&self) {
        let collection = self.collection.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let applier = Arc::clone(&self.applier);
        let cursor = Arc::clone(&self.cursor);

        tokio::spawn(async move {
            let items = match collection.snapshot().await {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(error = %err, "rotation could not read the collection");
                    return;
                }
            };
            if items.is_empty() {
                // Nothing to rotate through; the next tick may find items.
                return;
            }

            let index = cursor.fetch_add(1, Ordering::SeqCst) % items.len();
            let item = &items[index];
            tracing::debug!(path = %item.source_path, "rotation applying next wallpaper");

            let mut events = fetcher.fetch(&item.source_path);
            while let Some(event) = events.recv().await {
                match event {
                    FetchEvent::Progress(_) => {}
                    FetchEvent::Ready(image) => {
                        if !applier.apply(&image) {
                            tracing::warn!(
                                path = %item.source_path,
                                "wallpaper api refused rotation image"
                            );
                        }
                        return;
                    }
                    FetchEvent::Failed(err) => {
                        tracing::warn!(error = %err, "rotation image load failed");
                        return;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::DynamicImage;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use super::*;
    use crate::collection::{
        self, CollectionItem, CollectionStore, OperationKind, StoreError,
    };

    struct InstantFetcher {
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl ImageFetcher for InstantFetcher {
        fn fetch(&self, url: &str) -> mpsc::Receiver<FetchEvent> {
            self.urls.lock().push(url.to_string());
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                let _ = tx
                    .send(FetchEvent::Ready(DynamicImage::ImageRgba8(
                        image::RgbaImage::new(1, 1),
                    )))
                    .await;
            });
            rx
        }
    }

    struct CountingApplier {
        applied: Arc<AtomicUsize>,
    }

    impl WallpaperApplier for CountingApplier {
        fn apply(&self, _image: &DynamicImage) -> bool {
            self.applied.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    struct MemoryStore;

    impl CollectionStore for MemoryStore {
        fn persist_order(&mut self, _items: &[CollectionItem]) -> Result<(), StoreError> {
            Ok(())
        }
        fn persist_batch_delete(&mut self, _ids: &[uuid::Uuid]) -> Result<(), StoreError> {
            Ok(())
        }
        fn persist_insert(&mut self, _items: &[CollectionItem]) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn rotation_over(paths: &[&str]) -> (CollectionRotation, Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
        let items = paths
            .iter()
            .map(|p| CollectionItem::new(*p, OperationKind::Downloaded))
            .collect();
        let collection = collection::spawn(MemoryStore, items);
        let urls = Arc::new(Mutex::new(Vec::new()));
        let applied = Arc::new(AtomicUsize::new(0));
        let rotation = CollectionRotation::new(
            collection,
            Arc::new(InstantFetcher { urls: Arc::clone(&urls) }),
            Arc::new(CountingApplier { applied: Arc::clone(&applied) }),
        );
        (rotation, urls, applied)
    }

    #[tokio::test]
    async fn test_advance_cycles_through_collection_in_order() {
        let (rotation, urls, applied) = rotation_over(&["/w/a.jpg", "/w/b.jpg"]);

        for _ in 0..3 {
            rotation.advance();
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        assert_eq!(applied.load(Ordering::SeqCst), 3);
        assert_eq!(urls.lock().as_slice(), ["/w/a.jpg", "/w/b.jpg", "/w/a.jpg"]);
    }

    #[tokio::test]
    async fn test_advance_on_empty_collection_does_nothing() {
        let (rotation, urls, applied) = rotation_over(&[]);

        rotation.advance();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(applied.load(Ordering::SeqCst), 0);
        assert!(urls.lock().is_empty());
    }
}
