//! Progress events and the milestone machine that produces them.
//!
//! A pipeline run emits: one `Started`, zero or more `Running` updates with
//! monotonically non-decreasing percent, exactly one `PreFinalizing` at the
//! fixed 99% threshold, and one terminal (`Completed` or `Failed`) — or no
//! terminal at all if the run was cancelled. The threshold is shared by
//! every action kind; new kinds must not invent their own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::action::RequestToken;

/// The percent at which the caller switches from a determinate progress
/// indicator to an indefinite one while finalization runs.
pub const PRE_FINALIZE_PERCENT: u8 = 99;

/// Classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network/fetch failure; re-invoking the same action may succeed.
    Transient,
    /// Local failure (transform, write, device API refusal); retrying
    /// without changing something will not help.
    Fatal,
    /// The commit was rejected because the image is already in the
    /// collection; distinct so the caller can phrase it precisely.
    AlreadyInCollection,
}

/// Phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Work has begun.
    Started,
    /// Determinate progress.
    Running,
    /// Finalization started; show an indefinite indicator.
    PreFinalizing,
    /// The run finished successfully.
    Completed,
    /// The run failed.
    Failed(FailureKind),
}

/// One progress update for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub token: RequestToken,
    /// Percent complete, non-decreasing within one run.
    pub percent: u8,
    /// Phase the run is in.
    pub phase: ProgressPhase,
}

// ============================================================================
// Progress Stream
// ============================================================================

/// Receiving side of a pipeline run.
///
/// Dropping the stream detaches the consumer: the run is cancelled
/// cooperatively and any event produced afterwards is discarded, so a torn
/// down UI never sees a late notification.
#[derive(Debug)]
pub struct ProgressStream {
    token: RequestToken,
    receiver: mpsc::Receiver<ProgressEvent>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressStream {
    pub(crate) fn new(
        token: RequestToken,
        receiver: mpsc::Receiver<ProgressEvent>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self { token, receiver, cancelled }
    }

    /// The token of the run this stream observes.
    #[must_use]
    pub const fn token(&self) -> RequestToken { self.token }

    /// Receives the next progress event; `None` once the run is over or
    /// cancelled.
    pub async fn recv(&mut self) -> Option<ProgressEvent> { self.receiver.recv().await }

    /// Cancels the run. No event is delivered after this returns.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.receiver.close();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::SeqCst) }
}

impl Drop for ProgressStream {
    fn drop(&mut self) { self.cancelled.store(true, Ordering::SeqCst); }
}

// ============================================================================
// Milestone Machine
// ============================================================================

/// Turns raw fetch percents into well-formed progress events.
///
/// Enforces the event rules: percent never decreases, `PreFinalizing` is
/// emitted exactly once at [`PRE_FINALIZE_PERCENT`], terminal events carry
/// the right percent.
#[derive(Debug)]
pub(crate) struct MilestoneTracker {
    token: RequestToken,
    last_percent: u8,
    pre_finalizing_emitted: bool,
}

impl MilestoneTracker {
    pub fn new(token: RequestToken) -> Self {
        Self {
            token,
            last_percent: 0,
            pre_finalizing_emitted: false,
        }
    }

    /// The `Started` event, percent zero.
    pub fn start(&self) -> ProgressEvent {
        ProgressEvent {
            token: self.token,
            percent: 0,
            phase: ProgressPhase::Started,
        }
    }

    /// Maps a raw fetch percent to the event to emit, if any.
    ///
    /// Percents at or above the threshold route to the one-time
    /// `PreFinalizing` event; stale (non-increasing) updates produce
    /// nothing.
    pub fn progress(&mut self, raw_percent: u8) -> Option<ProgressEvent> {
        let percent = raw_percent.min(100);
        if percent >= PRE_FINALIZE_PERCENT {
            return self.pre_finalize();
        }
        if percent <= self.last_percent {
            return None;
        }
        self.last_percent = percent;
        Some(ProgressEvent {
            token: self.token,
            percent,
            phase: ProgressPhase::Running,
        })
    }

    /// The one-time `PreFinalizing` event at the fixed threshold.
    pub fn pre_finalize(&mut self) -> Option<ProgressEvent> {
        if self.pre_finalizing_emitted {
            return None;
        }
        self.pre_finalizing_emitted = true;
        self.last_percent = PRE_FINALIZE_PERCENT;
        Some(ProgressEvent {
            token: self.token,
            percent: PRE_FINALIZE_PERCENT,
            phase: ProgressPhase::PreFinalizing,
        })
    }

    /// The `Completed` terminal at 100%.
    pub fn complete(&mut self) -> ProgressEvent {
        self.last_percent = 100;
        ProgressEvent {
            token: self.token,
            percent: 100,
            phase: ProgressPhase::Completed,
        }
    }

    /// A `Failed` terminal at the last observed percent.
    pub fn fail(&self, kind: FailureKind) -> ProgressEvent {
        ProgressEvent {
            token: self.token,
            percent: self.last_percent,
            phase: ProgressPhase::Failed(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn tracker() -> MilestoneTracker {
        MilestoneTracker::new(RequestToken::new(ActionKind::QuickSet))
    }

    #[test]
    fn test_started_is_zero_percent() {
        let t = tracker();
        let event = t.start();
        assert_eq!(event.percent, 0);
        assert_eq!(event.phase, ProgressPhase::Started);
    }

    #[test]
    fn test_running_percent_is_monotonic() {
        let mut t = tracker();
        assert_eq!(t.progress(10).unwrap().percent, 10);
        assert_eq!(t.progress(45).unwrap().percent, 45);
        // A misbehaving fetcher going backwards is swallowed.
        assert!(t.progress(30).is_none());
        assert_eq!(t.progress(46).unwrap().percent, 46);
    }

    #[test]
    fn test_pre_finalizing_emitted_once_at_threshold() {
        let mut t = tracker();
        let _ = t.progress(50);

        let event = t.progress(PRE_FINALIZE_PERCENT).unwrap();
        assert_eq!(event.phase, ProgressPhase::PreFinalizing);
        assert_eq!(event.percent, PRE_FINALIZE_PERCENT);

        // Neither a repeat nor a later percent re-emits it.
        assert!(t.progress(PRE_FINALIZE_PERCENT).is_none());
        assert!(t.progress(100).is_none());
        assert!(t.pre_finalize().is_none());
    }

    #[test]
    fn test_pre_finalize_forced_when_fetch_skips_ahead() {
        // Fetcher jumps from 95 straight to done; the explicit call still
        // produces the milestone exactly once.
        let mut t = tracker();
        let _ = t.progress(95);
        let event = t.pre_finalize().unwrap();
        assert_eq!(event.phase, ProgressPhase::PreFinalizing);
        assert!(t.pre_finalize().is_none());
    }

    #[test]
    fn test_completed_is_full_percent() {
        let mut t = tracker();
        let _ = t.progress(40);
        let event = t.complete();
        assert_eq!(event.percent, 100);
        assert_eq!(event.phase, ProgressPhase::Completed);
    }

    #[test]
    fn test_failed_carries_last_percent_and_kind() {
        let mut t = tracker();
        let _ = t.progress(37);
        let event = t.fail(FailureKind::Transient);
        assert_eq!(event.percent, 37);
        assert_eq!(event.phase, ProgressPhase::Failed(FailureKind::Transient));
    }
}
