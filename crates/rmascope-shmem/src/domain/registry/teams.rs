//! Team Registry
//!
//! Team-scoped operations are parameterized by an opaque handle issued
//! by the runtime rather than a start/stride/size descriptor. The two
//! addressing schemes are never reconciled by the observed system, so
//! they stay independent here: this registry keys on the raw team
//! handle and treats it as an already-resolved window, borrowing only
//! the shared definition table so every window lives in one id space.

use super::windows::WindowRegistry;
use dashmap::DashMap;
use rmascope_core::WindowHandle;
use std::fmt;

/// Opaque team handle as issued by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TeamId(pub u64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team 0x{:x}", self.0)
    }
}

/// Registry of windows for team-scoped collectives.
#[derive(Debug, Default)]
pub struct TeamRegistry {
    cache: DashMap<TeamId, WindowHandle>,
}

impl TeamRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Resolve a team handle, registering a window for it on first
    /// observation.
    pub fn resolve(&self, team: TeamId, windows: &WindowRegistry) -> WindowHandle {
        if let Some(handle) = self.cache.get(&team) {
            return *handle;
        }
        // Insert-once via the entry API: a racing thread either finds
        // the finished entry or waits on this shard.
        *self
            .cache
            .entry(team)
            .or_insert_with(|| windows.define_external(format!("{team}")))
    }

    /// Drop a freed team's cache entry. Its window definition stays in
    /// the table; handles are never reused.
    pub fn forget(&self, team: TeamId) {
        self.cache.remove(&team);
    }

    /// Number of live team mappings.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no team is currently mapped.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
