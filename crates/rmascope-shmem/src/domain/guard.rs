//! Reentrancy Guard
//!
//! The measurement layer wraps a library that may internally call the
//! same primitives it exports (a broadcast implemented with puts, a
//! lock built on atomics). Two pieces of state keep those internal
//! calls from producing spurious application-level events:
//!
//! - a **nesting depth**, incremented on entry to any instrumented
//!   call and decremented on exit, regardless of whether events are
//!   emitted;
//! - an **event-generation toggle**, switched off for the duration of
//!   each wrapped call and restored afterward, independent of the
//!   depth.
//!
//! Both are atomically guarded so the same context stays correct when
//! a processing element's runtime is itself multi-threaded.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Process-wide reentrancy state for one processing element.
#[derive(Debug)]
pub struct ReentrancyState {
    depth: AtomicU32,
    events_enabled: AtomicBool,
}

impl ReentrancyState {
    /// Fresh state: depth zero, events disabled.
    ///
    /// Event generation is switched on only after the communication
    /// domain finishes initializing (see `PeContext::initialize`), so
    /// wrapped calls issued during library startup stay silent.
    pub const fn new() -> Self {
        Self {
            depth: AtomicU32::new(0),
            events_enabled: AtomicBool::new(false),
        }
    }

    /// Current nesting depth.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Whether event generation is currently enabled.
    #[inline]
    pub fn events_enabled(&self) -> bool {
        self.events_enabled.load(Ordering::Relaxed)
    }

    /// Toggle event generation.
    #[inline]
    pub fn set_events(&self, enabled: bool) {
        self.events_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Enter an instrumented call. Balanced by dropping the returned
    /// scope, including on unwind up to a fatal-termination point.
    #[inline]
    pub fn measurement_scope(&self) -> MeasurementScope<'_> {
        self.depth.fetch_add(1, Ordering::Relaxed);
        MeasurementScope { state: self }
    }
}

impl Default for ReentrancyState {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard balancing the nesting depth.
pub struct MeasurementScope<'a> {
    state: &'a ReentrancyState,
}

impl Drop for MeasurementScope<'_> {
    #[inline]
    fn drop(&mut self) {
        let prev = self.state.depth.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "unbalanced measurement scope");
    }
}
