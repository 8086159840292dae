//! rmascope measurement core
//!
//! # Overview
//!
//! `rmascope-core` defines the measurement event model shared by every
//! rmascope instrumentation adapter: typed event records for regions,
//! one-sided remote memory accesses, collectives, and locks, plus the
//! recorder that stores them in strict program order.
//!
//! The crate deliberately knows nothing about any particular
//! communication library. Adapters (see `rmascope-shmem`) translate
//! observed calls into [`EventRecord`]s; offline analysis pairs RMA
//! start and completion records through their [`MatchingId`]s.
//!
//! # Guarantees
//!
//! - **Program order**: records are stored in exactly the order they
//!   are handed to the recorder; no batching, no reordering.
//! - **Self-contained records**: each record carries everything the
//!   correlation pass needs, no external state lookups.
//! - **Infrastructure failures are fatal**: a recorder that cannot
//!   store a record would silently corrupt every later correlation, so
//!   exhaustion aborts the process instead of surfacing an error to the
//!   instrumented application.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;

pub use domain::event::{
    AtomicKind, CollectiveKind, EventKind, EventRecord, LockId, LockMode, MatchingId,
    RegionHandle, SyncLevel, WindowHandle,
};
pub use domain::recorder::{EventRecorder, HeapBackend, RecorderBackend, RecorderConfig};
pub use domain::topology::{PeId, Topology};
pub use error::{fatal, RecorderError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defined() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_core_types_exported() {
        let _pe = PeId::new(0);
        let _win = WindowHandle::new(1);
        let _id = MatchingId(0);
        let _kind = AtomicKind::Swap;
    }
}
