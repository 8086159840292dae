//! Infrastructure - runtime backends
//!
//! [`sim`] hosts the in-process loopback runtime the integration
//! tests and the demo CLI drive; a binding against a real SHMEM
//! library would live beside it.

pub mod sim;

pub use sim::{SimPe, SimWorld};
