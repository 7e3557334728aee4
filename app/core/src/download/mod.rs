//! Download dedup tracking.
//!
//! Downloads go through the OS download manager, which runs them outside
//! the process and reports completion asynchronously by an opaque id. The
//! tracker guarantees at most one outstanding download per distinct link
//! and correlates the completion signal back to the originating link.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

/// Opaque id minted by the external download manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalDownloadId(pub i64);

/// Errors from starting a download.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// A download for this link is already outstanding.
    #[error("a download for this link is already in progress")]
    AlreadyInFlight,
    /// The download manager refused the request.
    #[error("download manager refused the request: {0}")]
    Enqueue(String),
}

/// The OS download manager.
pub trait DownloadEnqueuer: Send + Sync {
    /// Hands `url` to the download manager, returning its id for the job.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Enqueue`] when the manager refuses.
    fn enqueue(&self, url: &str) -> Result<ExternalDownloadId, DownloadError>;
}

/// Tracks outstanding downloads by link.
pub struct DownloadTracker {
    enqueuer: Arc<dyn DownloadEnqueuer>,
    in_flight: DashMap<String, ExternalDownloadId>,
}

impl DownloadTracker {
    /// Creates a tracker over the given download manager.
    #[must_use]
    pub fn new(enqueuer: Arc<dyn DownloadEnqueuer>) -> Self {
        Self { enqueuer, in_flight: DashMap::new() }
    }

    /// Starts a download for `link` unless one is already outstanding.
    ///
    /// # Errors
    ///
    /// [`DownloadError::AlreadyInFlight`] for a duplicate link (the
    /// enqueuer is not consulted), or the enqueuer's own failure.
    pub fn begin(&self, link: &str) -> Result<ExternalDownloadId, DownloadError> {
        match self.in_flight.entry(link.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DownloadError::AlreadyInFlight),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let id = self.enqueuer.enqueue(link)?;
                entry.insert(id);
                tracing::debug!(link, id = id.0, "download enqueued");
                Ok(id)
            }
        }
    }

    /// Whether a download for `link` is outstanding.
    #[must_use]
    pub fn is_in_flight(&self, link: &str) -> bool { self.in_flight.contains_key(link) }

    /// Correlates a completion signal by id, draining the entry.
    ///
    /// Returns the link the id belonged to, or `None` for an unknown id
    /// (a completion for a download this process never started).
    pub fn complete(&self, id: ExternalDownloadId) -> Option<String> {
        let link = self
            .in_flight
            .iter()
            .find(|entry| *entry.value() == id)
            .map(|entry| entry.key().clone())?;
        self.in_flight.remove(&link);
        tracing::debug!(link = %link, id = id.0, "download completed");
        Some(link)
    }

    /// Number of outstanding downloads.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.in_flight.len() }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    use super::*;

    /// Mints sequential ids and counts calls.
    #[derive(Default)]
    struct FakeManager {
        next_id: AtomicI64,
        calls: AtomicUsize,
        refuse: std::sync::atomic::AtomicBool,
    }

    impl DownloadEnqueuer for FakeManager {
        fn enqueue(&self, _url: &str) -> Result<ExternalDownloadId, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.refuse.load(Ordering::SeqCst) {
                return Err(DownloadError::Enqueue("no space".to_string()));
            }
            Ok(ExternalDownloadId(self.next_id.fetch_add(1, Ordering::SeqCst)))
        }
    }

    #[test]
    fn test_begin_then_complete_round_trip() {
        let tracker = DownloadTracker::new(Arc::new(FakeManager::default()));

        let id = tracker.begin("https://img.example/a").unwrap();
        assert!(tracker.is_in_flight("https://img.example/a"));

        let link = tracker.complete(id).unwrap();
        assert_eq!(link, "https://img.example/a");
        assert!(!tracker.is_in_flight("https://img.example/a"));
    }

    #[test]
    fn test_duplicate_link_rejected_without_enqueue() {
        let manager = Arc::new(FakeManager::default());
        let tracker = DownloadTracker::new(Arc::clone(&manager) as Arc<dyn DownloadEnqueuer>);

        tracker.begin("https://img.example/a").unwrap();
        let err = tracker.begin("https://img.example/a").unwrap_err();
        assert_eq!(err, DownloadError::AlreadyInFlight);

        // The second request never reached the manager.
        assert_eq!(manager.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_links_run_concurrently() {
        let tracker = DownloadTracker::new(Arc::new(FakeManager::default()));

        let id_a = tracker.begin("https://img.example/a").unwrap();
        let id_b = tracker.begin("https://img.example/b").unwrap();
        assert_ne!(id_a, id_b);
        assert_eq!(tracker.outstanding(), 2);

        assert_eq!(tracker.complete(id_b).unwrap(), "https://img.example/b");
        assert!(tracker.is_in_flight("https://img.example/a"));
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let tracker = DownloadTracker::new(Arc::new(FakeManager::default()));
        assert!(tracker.complete(ExternalDownloadId(42)).is_none());
    }

    #[test]
    fn test_refused_enqueue_leaves_no_entry() {
        let manager = Arc::new(FakeManager::default());
        manager.refuse.store(true, Ordering::SeqCst);
        let tracker = DownloadTracker::new(Arc::clone(&manager) as Arc<dyn DownloadEnqueuer>);

        let err = tracker.begin("https://img.example/a").unwrap_err();
        assert!(matches!(err, DownloadError::Enqueue(_)));
        assert!(!tracker.is_in_flight("https://img.example/a"));

        // The link can be retried once the refusal clears.
        manager.refuse.store(false, Ordering::SeqCst);
        assert!(tracker.begin("https://img.example/a").is_ok());
    }
}
