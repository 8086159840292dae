//! Active-Set and Team Registries
//!
//! Two independent keying schemes resolve to window handles:
//!
//! - [`WindowRegistry`] keys on an [`ActiveSet`] descriptor
//!   `(pe_start, log_pe_stride, pe_size)`;
//! - [`TeamRegistry`] keys on an opaque runtime-issued [`TeamId`].
//!
//! The original system never reconciles the two schemes; they are kept
//! separate here on purpose, sharing only the underlying definition
//! table so every window handle lives in one id space.

mod active_set;
mod teams;
mod windows;

pub use active_set::ActiveSet;
pub use teams::{TeamId, TeamRegistry};
pub use windows::{WindowDefinition, WindowRegistry};
