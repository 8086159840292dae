//! rmascope SHMEM adapter
//!
//! # Overview
//!
//! `rmascope-shmem` observes the call/return boundary of a SHMEM-style
//! PGAS runtime and emits measurement event records (see
//! `rmascope-core`) without altering observable program behavior --
//! even though the measurement layer may itself re-enter the very APIs
//! it instruments.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │                                                             │
//! │  Registry Module               Primitives                   │
//! │  ├─ WindowRegistry             ├─ MatchingIdAllocator       │
//! │  ├─ TeamRegistry               ├─ ReentrancyState           │
//! │  └─ ActiveSet                  └─ PendingCompletion         │
//! │                                                             │
//! │              PeContext + bracketing protocols               │
//! │              (RMA / collective / lock / wait)               │
//! └─────────────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Adapters: PgasRuntime seam + thin per-API wrappers         │
//! └─────────────────────────────────────────────────────────────┘
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Infrastructure: SimPgas loopback runtime (tests, demo)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - Window resolution is memoized: one definition per distinct active
//!   set, for the process lifetime.
//! - Matching ids are strictly increasing and never reused.
//! - At most one deferred completion obligation is outstanding at a
//!   time; re-deferring first discharges the previous obligation.
//! - Nesting depth is balanced around every instrumented call.
//! - Events are emitted in strict program order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod infrastructure;

pub use adapters::runtime::PgasRuntime;
pub use adapters::wrappers::Instrumented;
pub use domain::bracket::{CompletionMode, LockProbe, RmaDirection, RmaProfile};
pub use domain::collective::CollectivePayload;
pub use domain::context::PeContext;
pub use domain::registry::{ActiveSet, TeamId, TeamRegistry, WindowDefinition, WindowRegistry};
pub use infrastructure::sim::{SimPe, SimWorld};
