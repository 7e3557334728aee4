//! Image fetch collaborator contract.
//!
//! The upstream fetch service streams decoded progress for one URL and
//! delivers the finalized image with the last event. Retry policy and
//! timeouts live upstream; they surface here as a plain failure event.

use image::DynamicImage;
use thiserror::Error;
use tokio::sync::mpsc;

/// A failed fetch, always treated as transient by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The network request failed.
    #[error("image download failed: {0}")]
    Network(String),
    /// The upstream service gave up waiting.
    #[error("image download timed out")]
    TimedOut,
}

/// One update from the fetch service.
#[derive(Debug)]
pub enum FetchEvent {
    /// Determinate download progress, 0..=100.
    Progress(u8),
    /// The finalized decoded image; always the last successful event.
    Ready(DynamicImage),
    /// The fetch failed; no further events follow.
    Failed(FetchError),
}

/// The upstream image fetch service.
///
/// `fetch` starts the download and returns the event stream for it. The
/// final event of a successful fetch is [`FetchEvent::Ready`] at 100%.
/// Dropping the receiver cancels the fetch; implementations must notice
/// the closed channel and stop work.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> mpsc::Receiver<FetchEvent>;
}
