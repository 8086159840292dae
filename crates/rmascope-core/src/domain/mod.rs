//! Domain Layer - measurement event model
//!
//! Three modules, leaves first:
//!
//! - [`topology`]: who am I, how many of us are there
//! - [`event`]: the typed records an adapter emits
//! - [`recorder`]: strict program-order storage for those records
//!
//! Everything here is pure domain logic; storage backends are the only
//! seam (see [`recorder::RecorderBackend`]).

pub mod event;
pub mod recorder;
pub mod topology;

pub use event::{
    AtomicKind, CollectiveKind, EventKind, EventRecord, LockId, LockMode, MatchingId,
    RegionHandle, SyncLevel, WindowHandle,
};
pub use recorder::{EventRecorder, HeapBackend, RecorderBackend, RecorderConfig};
pub use topology::{PeId, Topology};
