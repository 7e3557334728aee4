//! Gate chain evaluation for user actions.
//!
//! Every "do something with this image" intent passes through
//! [`evaluate`] before any costly work starts. The evaluation is a pure
//! function of the flags supplied by the caller; nothing here is cached or
//! persisted, so a changed premium/permission/connectivity state is picked
//! up on the very next call.

use super::ActionKind;

/// Snapshot of the state the gate chain evaluates against.
///
/// Supplied fresh on every call; the gate holds no state of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateFlags {
    /// A run for the same logical target is already in flight.
    pub busy: bool,
    /// The premium purchase has been verified.
    pub is_premium: bool,
    /// The storage permission is granted.
    pub has_permission: bool,
    /// The network is reachable.
    pub has_connectivity: bool,
}

/// Why an action was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Busy,
    NotPremium,
    NoPermission,
    NoConnectivity,
}

impl BlockReason {
    /// The remedial flow the caller should show for this reason.
    #[must_use]
    pub const fn remedy(self) -> Remedy {
        match self {
            Self::Busy => Remedy::ShowBusyMessage,
            Self::NotPremium => Remedy::ShowPurchaseFlow,
            Self::NoPermission => Remedy::RequestPermission,
            Self::NoConnectivity => Remedy::ShowConnectivityError,
        }
    }
}

/// The remedial UI to request when an action is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    ShowBusyMessage,
    ShowPurchaseFlow,
    RequestPermission,
    ShowConnectivityError,
}

impl Remedy {
    /// Whether this remedy suspends the process behind an external flow
    /// whose outcome comes back later (and therefore warrants recording a
    /// pending action for replay).
    #[must_use]
    pub const fn is_replayable(self) -> bool {
        matches!(self, Self::ShowPurchaseFlow | Self::RequestPermission)
    }
}

/// Outcome of one gate chain evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// All applicable gates passed; start the work.
    Proceed,
    /// The first failing gate, with the remedial flow to request.
    Blocked { reason: BlockReason, remedy: Remedy },
}

impl GateResult {
    const fn blocked(reason: BlockReason) -> Self {
        Self::Blocked { reason, remedy: reason.remedy() }
    }
}

/// Evaluates the gate chain for `kind` against `flags`.
///
/// The order is fixed and short-circuiting: busy, then premium (only for
/// premium-gated kinds), then permission (only for permission-gated kinds),
/// then connectivity. Permission is deliberately checked before
/// connectivity: a permission failure raises a persistent system dialog
/// that should not be preceded by a transient network check.
#[must_use]
pub const fn evaluate(kind: ActionKind, flags: GateFlags) -> GateResult {
    if flags.busy {
        return GateResult::blocked(BlockReason::Busy);
    }
    if kind.requires_premium() && !flags.is_premium {
        return GateResult::blocked(BlockReason::NotPremium);
    }
    if kind.requires_permission() && !flags.has_permission {
        return GateResult::blocked(BlockReason::NoPermission);
    }
    if kind.requires_connectivity() && !flags.has_connectivity {
        return GateResult::blocked(BlockReason::NoConnectivity);
    }
    GateResult::Proceed
}
