//! Replay memory for actions interrupted by an external flow.
//!
//! When an action blocks on a permission prompt or the purchase flow, the
//! process is suspended while the external UI runs. The store remembers the
//! original request under its token so the dispatcher can replay it with
//! identical parameters once the flow reports back. Entries are read and
//! cleared exactly once, on success and failure alike.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{ActionRequest, RequestToken};

/// Process-wide memory of "what was being attempted", keyed by token.
#[derive(Debug, Default)]
pub struct PendingActionStore {
    inner: Mutex<HashMap<RequestToken, ActionRequest>>,
}

impl PendingActionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Records `request` under its token.
    ///
    /// A second record for the same token overwrites the first; at most one
    /// pending action exists per token.
    pub fn record(&self, request: ActionRequest) {
        tracing::debug!(action = request.kind().name(), "recording pending action");
        self.inner.lock().insert(request.token, request);
    }

    /// Returns and clears the pending action for `token`.
    ///
    /// Returns `None` if nothing was recorded for this token; callers treat
    /// that as a contract violation worth asserting on, not handling.
    #[must_use]
    pub fn consume(&self, token: RequestToken) -> Option<ActionRequest> {
        self.inner.lock().remove(&token)
    }

    /// Whether a pending action exists for `token`.
    #[must_use]
    pub fn has_pending(&self, token: RequestToken) -> bool {
        self.inner.lock().contains_key(&token)
    }

    /// Number of recorded entries, for diagnostics.
    #[must_use]
    pub fn len(&self) -> usize { self.inner.lock().len() }

    /// Whether the store is fully drained.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.inner.lock().is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ActionPayload, CommitMode, TransformKind};

    fn request(kind: ActionKind, url: &str) -> ActionRequest {
        ActionRequest::new(
            kind,
            ActionPayload {
                source_url: url.to_string(),
                transform: TransformKind::Plain,
                commit: CommitMode::SetWallpaper,
            },
        )
    }

    #[test]
    fn test_consume_returns_recorded_request_once() {
        let store = PendingActionStore::new();
        let req = request(ActionKind::QuickSet, "https://img.example/a");
        let token = req.token;

        store.record(req.clone());
        assert!(store.has_pending(token));

        let replayed = store.consume(token).unwrap();
        assert_eq!(replayed, req);

        // Cleared after the first consume.
        assert!(!store.has_pending(token));
        assert!(store.consume(token).is_none());
    }

    #[test]
    fn test_consume_unknown_token_is_none() {
        let store = PendingActionStore::new();
        let token = RequestToken::new(ActionKind::Download);
        assert!(store.consume(token).is_none());
    }

    #[test]
    fn test_record_same_token_overwrites() {
        let store = PendingActionStore::new();
        let first = request(ActionKind::Download, "https://img.example/a");
        let token = first.token;
        let second = ActionRequest {
            token,
            payload: ActionPayload {
                source_url: "https://img.example/b".to_string(),
                transform: TransformKind::Plain,
                commit: CommitMode::SetWallpaper,
            },
        };

        store.record(first);
        store.record(second.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.consume(token).unwrap(), second);
    }

    #[test]
    fn test_distinct_tokens_coexist() {
        let store = PendingActionStore::new();
        let a = request(ActionKind::QuickSet, "https://img.example/a");
        let b = request(ActionKind::Crystallize, "https://img.example/b");
        let (ta, tb) = (a.token, b.token);

        store.record(a);
        store.record(b);
        assert_eq!(store.len(), 2);

        assert_eq!(store.consume(ta).unwrap().kind(), ActionKind::QuickSet);
        assert_eq!(store.consume(tb).unwrap().kind(), ActionKind::Crystallize);
        assert!(store.is_empty());
    }
}
