//! Adapters - connecting the bracketing protocols to a runtime
//!
//! - [`runtime`]: the [`runtime::PgasRuntime`] seam, the ordinary
//!   call/return contract this layer consumes from the real
//!   communication library
//! - [`regions`]: the fixed catalog of instrumented-region handles
//! - [`wrappers`]: the thin per-API adapters, one-call-in/one-call-out

pub mod regions;
pub mod runtime;
pub mod wrappers;

pub use regions::ApiRegion;
pub use runtime::PgasRuntime;
pub use wrappers::Instrumented;
