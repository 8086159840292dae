//! Per-PE Measurement Context
//!
//! All process-wide mutable measurement state lives in one explicit
//! [`PeContext`] -- reentrancy state, the pending-completion slot, the
//! matching-id counter, both registries, and the recorder. Nothing is
//! a global, so one test process can host several simulated elements
//! side by side.

use crate::domain::guard::ReentrancyState;
use crate::domain::matching::MatchingIdAllocator;
use crate::domain::pending::{PendingCompletion, PendingOp};
use crate::domain::registry::{ActiveSet, TeamId, TeamRegistry, WindowDefinition, WindowRegistry};
use parking_lot::Mutex;
use rmascope_core::{
    error::fatal, EventKind, EventRecord, EventRecorder, HeapBackend, MatchingId, RecorderConfig,
    Topology, WindowHandle,
};

/// The measurement context of one processing element.
pub struct PeContext {
    topology: Topology,
    windows: WindowRegistry,
    teams: TeamRegistry,
    matching: MatchingIdAllocator,
    guard: ReentrancyState,
    pending: PendingCompletion,
    recorder: Mutex<EventRecorder<HeapBackend>>,
}

impl PeContext {
    /// Set up the context for one communication domain.
    ///
    /// Mirrors domain initialization order: world/self windows are
    /// defined, the matching-id counter starts at zero, and only then
    /// is event generation switched on.
    pub fn initialize(topology: Topology) -> Self {
        Self::with_config(topology, RecorderConfig::default())
    }

    /// Like [`PeContext::initialize`] with an explicit recorder
    /// configuration.
    pub fn with_config(topology: Topology, config: RecorderConfig) -> Self {
        let ctx = Self {
            topology,
            windows: WindowRegistry::new(topology),
            teams: TeamRegistry::new(),
            matching: MatchingIdAllocator::new(),
            guard: ReentrancyState::new(),
            pending: PendingCompletion::new(),
            recorder: Mutex::new(EventRecorder::with_capacity(config.max_records)),
        };
        ctx.matching.reset();
        ctx.guard.set_events(true);
        tracing::debug!(
            target: "rmascope",
            my_pe = ctx.topology.my_pe.raw(),
            num_pes = ctx.topology.num_pes,
            "measurement context initialized"
        );
        ctx
    }

    /// Fixed process topology.
    #[inline(always)]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// The reentrancy state.
    #[inline(always)]
    pub fn guard(&self) -> &ReentrancyState {
        &self.guard
    }

    /// The window registry.
    #[inline(always)]
    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    /// Resolve an active-set descriptor (see
    /// [`WindowRegistry::resolve`]).
    #[inline]
    pub fn resolve(&self, set: ActiveSet) -> WindowHandle {
        self.windows.resolve(set)
    }

    /// Resolve an opaque team handle through the team registry.
    #[inline]
    pub fn resolve_team(&self, team: TeamId) -> WindowHandle {
        self.teams.resolve(team, &self.windows)
    }

    /// Drop a freed team's mapping.
    #[inline]
    pub fn forget_team(&self, team: TeamId) {
        self.teams.forget(team);
    }

    /// Allocate a fresh matching id.
    #[inline]
    pub fn allocate_matching_id(&self) -> MatchingId {
        self.matching.next()
    }

    /// Whether a deferred completion obligation is outstanding.
    #[inline]
    pub fn has_pending_completion(&self) -> bool {
        self.pending.is_pending()
    }

    /// Park a completion obligation for the next synchronization
    /// point.
    ///
    /// If an obligation is already outstanding, its completion record
    /// is emitted (with the id retained at its own deferral) before
    /// the new obligation is installed -- never overwritten.
    pub fn defer_completion(&self, window: WindowHandle, matching: MatchingId) {
        if let Some(prev) = self.pending.replace(PendingOp { window, matching }) {
            self.emit(EventRecord::RmaOpCompleteRemote {
                window: prev.window,
                matching: prev.matching,
            });
        }
    }

    /// Discharge the outstanding obligation, if any, emitting its
    /// deferred completion record and clearing the slot.
    pub fn discharge_pending(&self) {
        if let Some(prev) = self.pending.take() {
            self.emit(EventRecord::RmaOpCompleteRemote {
                window: prev.window,
                matching: prev.matching,
            });
        }
    }

    /// Append one record in program order.
    ///
    /// Storage failure is a measurement-infrastructure failure and
    /// terminates the process (§ error policy); the instrumented
    /// application never observes it.
    pub fn emit(&self, record: EventRecord) {
        if let Err(err) = self.recorder.lock().record(record) {
            fatal("event recording", &err);
        }
    }

    /// Tear down at program exit: event generation off, all window
    /// handles invalidated. The definition table and the recorded
    /// trace stay readable for the unification and analysis passes.
    pub fn teardown(&self) {
        self.guard.set_events(false);
        self.windows.teardown();
    }

    /// Creation-ordered window definitions for the external
    /// unification pass.
    pub fn window_definitions(&self) -> Vec<WindowDefinition> {
        self.windows.definitions()
    }

    /// Snapshot of the recorded trace, in program order.
    pub fn trace(&self) -> Vec<EventRecord> {
        self.recorder.lock().records().to_vec()
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> usize {
        self.recorder.lock().count()
    }

    /// Number of recorded events of one kind.
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.recorder.lock().count_kind(kind)
    }
}
