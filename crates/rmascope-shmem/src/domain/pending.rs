//! Pending-Completion Slot
//!
//! A fire-and-forget put does not force a completion record of its
//! own; instead the obligation is parked here and discharged by the
//! next synchronization primitive. The slot retains the operation's
//! window and matching id alongside the flag -- a discharge must reuse
//! the id allocated at deferral time, never a fresh one.
//!
//! At most one obligation is outstanding at a time. Installing a new
//! obligation while the slot is occupied hands the previous one back
//! to the caller so its completion record is emitted first
//! ("emit-and-clear before re-setting"); a silent last-id-wins
//! overwrite would leave an unmatched start record in the trace.

use parking_lot::Mutex;
use rmascope_core::{MatchingId, WindowHandle};

/// One deferred remote-completion obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOp {
    /// Window the deferred operation was issued in
    pub window: WindowHandle,
    /// Matching id allocated when the operation was issued
    pub matching: MatchingId,
}

/// The process-wide deferred-completion slot.
#[derive(Debug, Default)]
pub struct PendingCompletion {
    slot: Mutex<Option<PendingOp>>,
}

impl PendingCompletion {
    /// Empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Whether an obligation is outstanding.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Install a new obligation, returning the displaced one, if any.
    ///
    /// The caller must emit the displaced obligation's completion
    /// record before recording anything about the new operation's
    /// completion.
    #[must_use]
    pub fn replace(&self, op: PendingOp) -> Option<PendingOp> {
        self.slot.lock().replace(op)
    }

    /// Take the outstanding obligation, leaving the slot empty.
    #[must_use]
    pub fn take(&self) -> Option<PendingOp> {
        self.slot.lock().take()
    }
}
