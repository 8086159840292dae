//! Matching-Id Allocator
//!
//! Produces the correlation tokens that pair an RMA operation's start
//! record with its completion record. Process-local; uniqueness is
//! scoped to (process, window), no cross-process coordination.

use rmascope_core::MatchingId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic matching-id source.
///
/// Ids are strictly increasing and never reused within a process
/// lifetime. The counter is deliberately not guarded against
/// wraparound: 2^64 operations are out of reach of any realistic run,
/// and the observed original behaves the same way.
#[derive(Debug, Default)]
pub struct MatchingIdAllocator {
    next: AtomicU64,
}

impl MatchingIdAllocator {
    /// Allocator starting at id 0.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Return the current id and advance the counter.
    #[inline]
    pub fn next(&self) -> MatchingId {
        MatchingId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Reset to zero. Called once at communication-domain setup.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}
