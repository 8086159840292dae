//! Active-Set Window Registry
//!
//! Maps an [`ActiveSet`] descriptor to a durable [`WindowHandle`],
//! creating and recording a new window definition on first
//! observation. Definitions live for the process lifetime (the
//! communication domains they describe outlive the operations
//! addressing them) and are invalidated en masse at teardown.
//!
//! # Concurrency
//!
//! The cache is insert-once, read-many. Lookups go through a lock-free
//! read path; insertion is serialized by the definition-table mutex,
//! with a re-check under the lock so a racing thread can never observe
//! (or double-create) a half-registered entry.
//!
//! # Failure
//!
//! Resolution never fails in the steady state. Exhausting the
//! definition id space aborts the process: a silently dropped window
//! handle would corrupt every subsequent event referencing it.

use super::active_set::ActiveSet;
use dashmap::DashMap;
use parking_lot::Mutex;
use rmascope_core::{error::fatal, Topology, WindowHandle};
use std::sync::atomic::{AtomicBool, Ordering};

const WIN_WORLD_NAME: &str = "All PEs";
const WIN_SELF_NAME: &str = "Self PE";

/// Errors of the definition service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The window definition id space is exhausted.
    #[error("window definition id space exhausted")]
    DefinitionsExhausted,
}

/// One recorded window definition, in creation order.
#[derive(Debug, Clone)]
pub struct WindowDefinition {
    /// The handle events refer to
    pub handle: WindowHandle,
    /// Human-readable label recorded with the definition
    pub label: String,
    /// Descriptor the definition was keyed on; `None` for windows
    /// registered through the team scheme
    pub active_set: Option<ActiveSet>,
}

/// The process-local active-set window registry.
pub struct WindowRegistry {
    topology: Topology,
    world: WindowHandle,
    self_window: WindowHandle,
    /// Read-mostly descriptor cache; entries are immutable once
    /// inserted
    cache: DashMap<ActiveSet, WindowHandle>,
    /// Creation-ordered definition table; also the single-mutator
    /// lock for the insertion path
    definitions: Mutex<Vec<WindowDefinition>>,
    active: AtomicBool,
}

impl WindowRegistry {
    /// Set up the registry for one communication domain.
    ///
    /// Creates the universal ("world") window once, and -- on
    /// multi-element runs -- the "self" window for this element. On a
    /// singleton run the self window aliases the world window.
    pub fn new(topology: Topology) -> Self {
        let mut definitions = Vec::new();

        let world = Self::define_locked(
            &mut definitions,
            WIN_WORLD_NAME.to_string(),
            Some(ActiveSet::world(topology.num_pes)),
        );

        let self_window = if topology.is_singleton() {
            world
        } else {
            Self::define_locked(
                &mut definitions,
                WIN_SELF_NAME.to_string(),
                Some(ActiveSet::new(topology.my_pe.raw(), 0, 1)),
            )
        };

        Self {
            topology,
            world,
            self_window,
            cache: DashMap::new(),
            definitions: Mutex::new(definitions),
            active: AtomicBool::new(true),
        }
    }

    /// The universal window: the default addressing domain for
    /// elemental and block put/get operations.
    #[inline(always)]
    pub fn world(&self) -> WindowHandle {
        self.world
    }

    /// The self window (aliases the world window on singleton runs).
    #[inline(always)]
    pub fn self_window(&self) -> WindowHandle {
        self.self_window
    }

    /// Resolve a descriptor to its window handle, registering a new
    /// window on first observation.
    ///
    /// The world set and all self-like sets short-circuit to their
    /// pre-created windows; everything else goes through the memoizing
    /// cache. O(1) amortized.
    pub fn resolve(&self, set: ActiveSet) -> WindowHandle {
        debug_assert!(self.is_active(), "window resolution after teardown");

        if set.is_world(self.topology.num_pes) {
            return self.world;
        }
        if set.is_self_like(self.topology.my_pe) {
            return self.self_window;
        }

        if let Some(handle) = self.cache.get(&set) {
            return *handle;
        }

        let mut definitions = self.definitions.lock();
        // Re-check under the lock: another thread may have won the
        // insertion race while we waited.
        if let Some(handle) = self.cache.get(&set) {
            return *handle;
        }

        let handle = Self::define_locked(&mut definitions, format!("Active set {set}"), Some(set));
        self.cache.insert(set, handle);
        tracing::debug!(target: "rmascope", %set, %handle, "registered PE group");
        handle
    }

    /// Register a window that is keyed elsewhere (the team scheme),
    /// recording only its label in the shared definition table.
    pub(crate) fn define_external(&self, label: String) -> WindowHandle {
        debug_assert!(self.is_active(), "window definition after teardown");
        let mut definitions = self.definitions.lock();
        Self::define_locked(&mut definitions, label, None)
    }

    fn define_locked(
        definitions: &mut Vec<WindowDefinition>,
        label: String,
        active_set: Option<ActiveSet>,
    ) -> WindowHandle {
        let Ok(raw) = u32::try_from(definitions.len()) else {
            fatal("window definition", &RegistryError::DefinitionsExhausted);
        };
        let handle = WindowHandle::new(raw);
        definitions.push(WindowDefinition {
            handle,
            label,
            active_set,
        });
        handle
    }

    /// Stable, creation-ordered snapshot of every definition observed
    /// so far -- the local side of the program-exit unification pass
    /// that assigns one global numbering across all processes.
    pub fn definitions(&self) -> Vec<WindowDefinition> {
        self.definitions.lock().clone()
    }

    /// Number of definitions created so far.
    pub fn definition_count(&self) -> usize {
        self.definitions.lock().len()
    }

    /// Whether the registry has not been torn down yet.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Invalidate all handles at program teardown. The definition
    /// table stays readable for the unification pass; resolution is
    /// over.
    pub fn teardown(&self) {
        self.active.store(false, Ordering::Relaxed);
        tracing::debug!(
            target: "rmascope",
            definitions = self.definition_count(),
            "window registry torn down"
        );
    }
}
