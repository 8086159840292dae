//! Measurement Event Records
//!
//! Every variant of [`EventRecord`] is **self-contained**: it carries
//! all identifiers the offline correlation pass needs (window, target,
//! matching id, byte extents) without requiring external state lookups.
//!
//! # Correlation protocol
//!
//! An asynchronous remote memory access produces a start record
//! (`RmaPut`/`RmaGet`/`RmaAtomic`) and exactly one completion record
//! (`RmaOpCompleteBlocking` when the transfer is known complete at call
//! return, `RmaOpCompleteRemote` when it was deferred to the next
//! synchronization point). Start and completion share one
//! [`MatchingId`]; ids are unique per (process, window) and strictly
//! increasing within a process lifetime.

use crate::domain::topology::PeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Opaque handle of a registered memory-access domain (an active-set
/// window). Allocated by the window registry, dense from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowHandle(pub u32);

impl WindowHandle {
    /// Wrap a raw handle value
    #[inline(always)]
    pub fn new(raw: u32) -> Self {
        WindowHandle(raw)
    }

    /// Raw handle value
    #[inline(always)]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win#{}", self.0)
    }
}

/// Correlation token pairing an RMA operation's start record with its
/// completion record.
///
/// Process-local, monotonically increasing, never reused within a
/// process lifetime. No cross-process uniqueness is provided. The
/// counter is not guarded against wraparound; at 64 bits this is out
/// of reach of realistic operation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MatchingId(pub u64);

impl fmt::Display for MatchingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Handle of an instrumented code region.
///
/// Region naming and source-location bookkeeping are a black-box
/// service; adapters receive pre-registered handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RegionHandle(pub u32);

/// A process-wide advisory lock object, identified by its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LockId(pub u64);

/// Lock acquisition mode recorded with lock events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    /// Single exclusive holder (the only mode SHMEM-style locks have)
    Exclusive,
    /// Multiple concurrent readers
    Shared,
}

/// Kind of an atomic remote operation.
///
/// Atomics always complete synchronously (the return value depends on
/// the remote result), so they always pair with an
/// `RmaOpCompleteBlocking` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomicKind {
    /// Unconditional swap
    Swap,
    /// Conditional swap; carries a compare value, so the read extent
    /// is twice the element width
    CompareAndSwap,
    /// Fetch old value, add operand
    FetchAndAdd,
    /// Fetch old value, add one
    FetchAndIncrement,
    /// Add operand, no fetch
    Add,
    /// Add one, no fetch
    Increment,
}

impl AtomicKind {
    /// Byte extents `(read, written)` for one element of `elem_size`
    /// bytes.
    ///
    /// Compare-carrying kinds read double width (operand plus compare
    /// value); pure increments transfer no operand at all.
    pub fn extents(self, elem_size: u64) -> (u64, u64) {
        match self {
            AtomicKind::Swap | AtomicKind::FetchAndAdd | AtomicKind::Add => {
                (elem_size, elem_size)
            }
            AtomicKind::CompareAndSwap => (2 * elem_size, elem_size),
            AtomicKind::FetchAndIncrement | AtomicKind::Increment => (0, elem_size),
        }
    }
}

/// Kind of a collective operation, recorded in its end record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectiveKind {
    /// Group-wide barrier
    Barrier,
    /// One root to all others
    Broadcast,
    /// Concatenation of per-PE contributions on all PEs
    Collect,
    /// Element-wise reduction on all PEs
    Reduce,
    /// Personalized exchange between every pair
    AllToAll,
}

/// Synchronization level asserted by a collective record.
///
/// Stored as a small flag set; collectives in this layer always assert
/// both process and memory ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SyncLevel(u8);

impl SyncLevel {
    /// No ordering asserted
    pub const NONE: SyncLevel = SyncLevel(0);
    /// Process arrival ordering
    pub const PROCESS: SyncLevel = SyncLevel(0b01);
    /// Remote memory ordering
    pub const MEMORY: SyncLevel = SyncLevel(0b10);
    /// Process and memory ordering both asserted (what collectives in
    /// this layer guarantee)
    pub const PROCESS_AND_MEMORY: SyncLevel = SyncLevel(0b11);

    /// Whether every flag in `other` is set in `self`
    #[inline(always)]
    pub fn contains(self, other: SyncLevel) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw flag bits
    #[inline(always)]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for SyncLevel {
    type Output = SyncLevel;

    #[inline(always)]
    fn bitor(self, rhs: SyncLevel) -> SyncLevel {
        SyncLevel(self.0 | rhs.0)
    }
}

/// Discriminant-only view of an [`EventRecord`], for counting and
/// filtering without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum EventKind {
    RegionEnter,
    RegionExit,
    RmaPut,
    RmaGet,
    RmaAtomic,
    RmaOpCompleteBlocking,
    RmaOpCompleteRemote,
    RmaWaitChange,
    CollectiveBegin,
    CollectiveEnd,
    LockAcquire,
    LockRelease,
    LockRequest,
    LockTry,
}

/// One measurement event, emitted in strict program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRecord {
    /// Entered an instrumented region
    RegionEnter {
        /// Region being entered
        region: RegionHandle,
    },

    /// Left an instrumented region
    RegionExit {
        /// Region being left
        region: RegionHandle,
    },

    /// One-sided write issued
    RmaPut {
        /// Window the transfer is tracked in
        window: WindowHandle,
        /// Target processing element
        target: PeId,
        /// Payload size in bytes
        bytes: u64,
        /// Correlation token for the completion record
        matching: MatchingId,
    },

    /// One-sided read issued
    RmaGet {
        /// Window the transfer is tracked in
        window: WindowHandle,
        /// Target processing element
        target: PeId,
        /// Payload size in bytes
        bytes: u64,
        /// Correlation token for the completion record
        matching: MatchingId,
    },

    /// Remote atomic issued
    RmaAtomic {
        /// Window the operation is tracked in
        window: WindowHandle,
        /// Target processing element
        target: PeId,
        /// Atomic operation kind
        kind: AtomicKind,
        /// Bytes transferred to the target (operand, plus compare
        /// value for conditional kinds)
        bytes_read: u64,
        /// Bytes written at the target
        bytes_written: u64,
        /// Correlation token for the completion record
        matching: MatchingId,
    },

    /// Operation completed synchronously, at call return
    RmaOpCompleteBlocking {
        /// Window of the completed operation
        window: WindowHandle,
        /// Matching id allocated at the operation's start
        matching: MatchingId,
    },

    /// Deferred completion, discharged at a synchronization point
    RmaOpCompleteRemote {
        /// Window of the completed operation
        window: WindowHandle,
        /// Matching id allocated at the operation's start, retained
        /// across the deferral
        matching: MatchingId,
    },

    /// Blocked waiting for a remote value change
    RmaWaitChange {
        /// Window being watched
        window: WindowHandle,
    },

    /// Collective operation started
    CollectiveBegin {
        /// Ordering asserted by this collective
        sync: SyncLevel,
    },

    /// Collective operation finished
    CollectiveEnd {
        /// Collective kind
        kind: CollectiveKind,
        /// Ordering asserted by this collective
        sync: SyncLevel,
        /// Window of the active set addressed
        window: WindowHandle,
        /// Designated root, or `None` for rootless collectives
        root: Option<PeId>,
        /// Bytes this PE contributed
        bytes_sent: u64,
        /// Bytes this PE received
        bytes_received: u64,
    },

    /// Advisory lock acquired (blocking acquisition returned)
    LockAcquire {
        /// Window the lock is scoped to
        window: WindowHandle,
        /// Lock object, identified by address
        lock: LockId,
        /// Acquisition mode
        mode: LockMode,
    },

    /// Advisory lock released
    LockRelease {
        /// Window the lock is scoped to
        window: WindowHandle,
        /// Lock object, identified by address
        lock: LockId,
    },

    /// Non-blocking lock attempt that succeeded
    LockRequest {
        /// Window the lock is scoped to
        window: WindowHandle,
        /// Lock object, identified by address
        lock: LockId,
        /// Acquisition mode
        mode: LockMode,
    },

    /// Non-blocking lock attempt that failed (lock was held)
    LockTry {
        /// Window the lock is scoped to
        window: WindowHandle,
        /// Lock object, identified by address
        lock: LockId,
        /// Acquisition mode
        mode: LockMode,
    },
}

impl EventRecord {
    /// Discriminant of this record
    pub fn kind(&self) -> EventKind {
        match self {
            EventRecord::RegionEnter { .. } => EventKind::RegionEnter,
            EventRecord::RegionExit { .. } => EventKind::RegionExit,
            EventRecord::RmaPut { .. } => EventKind::RmaPut,
            EventRecord::RmaGet { .. } => EventKind::RmaGet,
            EventRecord::RmaAtomic { .. } => EventKind::RmaAtomic,
            EventRecord::RmaOpCompleteBlocking { .. } => EventKind::RmaOpCompleteBlocking,
            EventRecord::RmaOpCompleteRemote { .. } => EventKind::RmaOpCompleteRemote,
            EventRecord::RmaWaitChange { .. } => EventKind::RmaWaitChange,
            EventRecord::CollectiveBegin { .. } => EventKind::CollectiveBegin,
            EventRecord::CollectiveEnd { .. } => EventKind::CollectiveEnd,
            EventRecord::LockAcquire { .. } => EventKind::LockAcquire,
            EventRecord::LockRelease { .. } => EventKind::LockRelease,
            EventRecord::LockRequest { .. } => EventKind::LockRequest,
            EventRecord::LockTry { .. } => EventKind::LockTry,
        }
    }

    /// Matching id carried by this record, if it is part of the
    /// start/completion correlation protocol.
    pub fn matching_id(&self) -> Option<MatchingId> {
        match self {
            EventRecord::RmaPut { matching, .. }
            | EventRecord::RmaGet { matching, .. }
            | EventRecord::RmaAtomic { matching, .. }
            | EventRecord::RmaOpCompleteBlocking { matching, .. }
            | EventRecord::RmaOpCompleteRemote { matching, .. } => Some(*matching),
            _ => None,
        }
    }

    /// Window referenced by this record, if any.
    pub fn window(&self) -> Option<WindowHandle> {
        match self {
            EventRecord::RmaPut { window, .. }
            | EventRecord::RmaGet { window, .. }
            | EventRecord::RmaAtomic { window, .. }
            | EventRecord::RmaOpCompleteBlocking { window, .. }
            | EventRecord::RmaOpCompleteRemote { window, .. }
            | EventRecord::RmaWaitChange { window, .. }
            | EventRecord::CollectiveEnd { window, .. }
            | EventRecord::LockAcquire { window, .. }
            | EventRecord::LockRelease { window, .. }
            | EventRecord::LockRequest { window, .. }
            | EventRecord::LockTry { window, .. } => Some(*window),
            _ => None,
        }
    }

    /// Whether this is a start record owing a completion
    #[inline]
    pub fn is_rma_start(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::RmaPut | EventKind::RmaGet | EventKind::RmaAtomic
        )
    }

    /// Whether this is a completion record
    #[inline]
    pub fn is_rma_completion(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::RmaOpCompleteBlocking | EventKind::RmaOpCompleteRemote
        )
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRecord::RegionEnter { region } => write!(f, "Enter(r{})", region.0),
            EventRecord::RegionExit { region } => write!(f, "Exit(r{})", region.0),
            EventRecord::RmaPut { window, target, bytes, matching } => {
                write!(f, "Put({window} -> {target}, {bytes}B, {matching})")
            }
            EventRecord::RmaGet { window, target, bytes, matching } => {
                write!(f, "Get({window} <- {target}, {bytes}B, {matching})")
            }
            EventRecord::RmaAtomic { window, target, kind, matching, .. } => {
                write!(f, "Atomic({window} @ {target}, {kind:?}, {matching})")
            }
            EventRecord::RmaOpCompleteBlocking { window, matching } => {
                write!(f, "CompleteBlocking({window}, {matching})")
            }
            EventRecord::RmaOpCompleteRemote { window, matching } => {
                write!(f, "CompleteRemote({window}, {matching})")
            }
            EventRecord::RmaWaitChange { window } => write!(f, "WaitChange({window})"),
            EventRecord::CollectiveBegin { .. } => write!(f, "CollectiveBegin"),
            EventRecord::CollectiveEnd { kind, window, bytes_sent, bytes_received, .. } => {
                write!(f, "CollectiveEnd({kind:?}, {window}, tx {bytes_sent}B, rx {bytes_received}B)")
            }
            EventRecord::LockAcquire { lock, .. } => write!(f, "LockAcquire(0x{:x})", lock.0),
            EventRecord::LockRelease { lock, .. } => write!(f, "LockRelease(0x{:x})", lock.0),
            EventRecord::LockRequest { lock, .. } => write!(f, "LockRequest(0x{:x})", lock.0),
            EventRecord::LockTry { lock, .. } => write!(f, "LockTry(0x{:x})", lock.0),
        }
    }
}
