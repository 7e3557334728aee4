//! Action model shared by the gate, the pending store and the pipeline.
//!
//! A user intent enters the engine as an [`ActionRequest`]: a tagged
//! [`RequestToken`] plus the parameters the pipeline needs to execute it.
//! Requests are created once per intent and never mutated; replaying after a
//! remedy re-submits the recorded request unchanged.

pub mod dispatcher;
pub mod gate;
pub mod pending;

pub use dispatcher::{ActionDispatcher, RemedyResolution, Submission};
pub use gate::{BlockReason, GateFlags, GateResult, Remedy, evaluate};
pub use pending::PendingActionStore;
use uuid::Uuid;

// ============================================================================
// Action Kinds
// ============================================================================

/// The user intents the engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Fetch the image and set it as the wallpaper directly.
    QuickSet,
    /// Hand the image link to the OS download manager.
    Download,
    /// Fetch, run the crystallize transform, and show/persist the result.
    Crystallize,
    /// Fetch, hand off to the external crop tool, finalize on its result.
    EditSet,
    /// Fetch and persist the image into the local collection.
    AddToCollection,
    /// Resolve a shareable link for the image.
    Share,
}

impl ActionKind {
    /// Returns a human-readable name for this action, for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QuickSet => "QuickSet",
            Self::Download => "Download",
            Self::Crystallize => "Crystallize",
            Self::EditSet => "EditSet",
            Self::AddToCollection => "AddToCollection",
            Self::Share => "Share",
        }
    }

    /// Whether this action is behind the premium purchase gate.
    #[must_use]
    pub const fn requires_premium(self) -> bool {
        match self {
            Self::Download | Self::Crystallize | Self::AddToCollection | Self::Share => true,
            Self::QuickSet | Self::EditSet => false,
        }
    }

    /// Whether this action needs the storage permission.
    ///
    /// Share only resolves a link and never touches storage.
    #[must_use]
    pub const fn requires_permission(self) -> bool { !matches!(self, Self::Share) }

    /// Whether this action depends on connectivity. All current actions
    /// fetch from the network first.
    #[must_use]
    pub const fn requires_connectivity(self) -> bool { true }
}

// ============================================================================
// Request Tokens
// ============================================================================

/// Tagged token identifying one logical user request.
///
/// The token carries its [`ActionKind`] so permission results, purchase
/// results and pipeline runs can never be confused across unrelated actions,
/// and a v7 nonce so two requests for the same kind stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    kind: ActionKind,
    nonce: Uuid,
}

impl RequestToken {
    /// Mints a fresh token for the given action kind.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, nonce: Uuid::now_v7() }
    }

    /// The action kind this token was minted for.
    #[must_use]
    pub const fn kind(self) -> ActionKind { self.kind }
}

// ============================================================================
// Payload
// ============================================================================

/// Which transform the pipeline applies between fetch and commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// No transform; the fetched image is committed as-is.
    Plain,
    /// The crystallize effect.
    Crystallize,
    /// Finalization of an externally cropped image.
    CropFinalize,
}

/// What the pipeline does with the transformed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Apply to the device wallpaper.
    SetWallpaper,
    /// Persist into the local collection.
    AddToCollection,
    /// Neither; the caller only wants the result surfaced.
    PreviewOnly,
}

/// Parameters of one action request, fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPayload {
    /// Where the source bytes come from.
    pub source_url: String,
    /// Transform to apply after the fetch.
    pub transform: TransformKind,
    /// Commit step after the transform.
    pub commit: CommitMode,
}

/// One user intent, consumed exactly once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// The tagged token identifying this request.
    pub token: RequestToken,
    /// Execution parameters.
    pub payload: ActionPayload,
}

impl ActionRequest {
    /// Builds a request with a fresh token for `kind`.
    #[must_use]
    pub fn new(kind: ActionKind, payload: ActionPayload) -> Self {
        Self { token: RequestToken::new(kind), payload }
    }

    /// The action kind, read off the token.
    #[must_use]
    pub const fn kind(&self) -> ActionKind { self.token.kind() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_requirement_table() {
        assert!(!ActionKind::QuickSet.requires_premium());
        assert!(ActionKind::QuickSet.requires_permission());
        assert!(ActionKind::QuickSet.requires_connectivity());

        assert!(ActionKind::Download.requires_premium());
        assert!(ActionKind::Download.requires_permission());

        assert!(ActionKind::Share.requires_premium());
        assert!(!ActionKind::Share.requires_permission());
        assert!(ActionKind::Share.requires_connectivity());

        assert!(!ActionKind::EditSet.requires_premium());
        assert!(ActionKind::AddToCollection.requires_premium());
    }

    #[test]
    fn test_tokens_for_same_kind_are_distinct() {
        let a = RequestToken::new(ActionKind::QuickSet);
        let b = RequestToken::new(ActionKind::QuickSet);
        assert_ne!(a, b);
        assert_eq!(a.kind(), b.kind());
    }

    #[test]
    fn test_request_carries_kind_through_token() {
        let request = ActionRequest::new(
            ActionKind::Crystallize,
            ActionPayload {
                source_url: "https://img.example/1/large".to_string(),
                transform: TransformKind::Crystallize,
                commit: CommitMode::PreviewOnly,
            },
        );
        assert_eq!(request.kind(), ActionKind::Crystallize);
    }
}
