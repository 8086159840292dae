//! Operation Bracketing Protocols
//!
//! One generic bracketing function per protocol shape, parameterized
//! by operation metadata and a closure invoking the real call. Thin
//! per-API adapters (see `adapters::wrappers`) supply the metadata;
//! the hundreds of near-identical per-spelling code blocks of a
//! classic wrapper generator collapse into this one dispatcher.
//!
//! Every shape follows the same skeleton:
//!
//! 1. enter measurement (nesting depth++, always balanced)
//! 2. if event generation is on: switch it off for the duration of the
//!    wrapped call and emit the entry-side records
//! 3. invoke the real operation, preserving its return value
//! 4. emit the exit-side records, switch event generation back on
//! 5. leave measurement (depth--)
//!
//! Step 2's toggle is what keeps the underlying library's own internal
//! use of the same primitives from generating nested spurious events.

use crate::domain::collective::CollectivePayload;
use crate::domain::context::PeContext;
use crate::domain::registry::{ActiveSet, TeamId};
use rmascope_core::{
    AtomicKind, CollectiveKind, EventRecord, LockId, LockMode, PeId, RegionHandle, SyncLevel,
};

/// Transfer direction of a point-to-point RMA operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmaDirection {
    /// One-sided write toward the target
    Put,
    /// One-sided read from the target
    Get,
}

/// How an RMA operation's completion record is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// The transfer is known complete when the call returns; the
    /// completion record is emitted immediately.
    Blocking,
    /// Fire-and-forget: completion is deferred to the next
    /// synchronization point via the pending-completion slot.
    Deferred,
}

/// Metadata of one point-to-point RMA operation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmaProfile {
    /// Transfer direction
    pub direction: RmaDirection,
    /// Completion behavior
    pub completion: CompletionMode,
}

impl RmaProfile {
    /// Blocking put (elemental, block, strided): complete at return.
    pub const PUT: RmaProfile = RmaProfile {
        direction: RmaDirection::Put,
        completion: CompletionMode::Blocking,
    };
    /// Fire-and-forget put: completion deferred to the next sync.
    pub const PUT_NBI: RmaProfile = RmaProfile {
        direction: RmaDirection::Put,
        completion: CompletionMode::Deferred,
    };
    /// Get: the value is in hand at return, always blocking.
    pub const GET: RmaProfile = RmaProfile {
        direction: RmaDirection::Get,
        completion: CompletionMode::Blocking,
    };
}

/// Outcome of a non-blocking lock attempt, as observed from the real
/// call's return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockProbe {
    /// The lock was free and is now held by this PE
    Acquired,
    /// The lock was held by someone else
    Contended,
}

/// Sync level asserted by every collective in this layer: process
/// arrival and remote memory ordering.
const COLLECTIVE_SYNC: SyncLevel = SyncLevel::PROCESS_AND_MEMORY;

impl PeContext {
    /// Bracket a point-to-point put/get.
    ///
    /// Elemental, block, and strided shapes all address the universal
    /// window; only the byte count differs, and the adapter computes
    /// it. State machine per operation:
    /// `Idle -> Issuing -> Completed-Immediate | Completed-Deferred`.
    pub fn instrumented_rma<T>(
        &self,
        region: RegionHandle,
        profile: RmaProfile,
        target: PeId,
        bytes: u64,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        let mut issued = None;
        if event_gen_active {
            self.guard().set_events(false);

            self.emit(EventRecord::RegionEnter { region });
            let window = self.windows().world();
            let matching = self.allocate_matching_id();
            self.emit(match profile.direction {
                RmaDirection::Put => EventRecord::RmaPut {
                    window,
                    target,
                    bytes,
                    matching,
                },
                RmaDirection::Get => EventRecord::RmaGet {
                    window,
                    target,
                    bytes,
                    matching,
                },
            });
            issued = Some((window, matching));
        }

        let ret = op();

        if let Some((window, matching)) = issued {
            match profile.completion {
                CompletionMode::Blocking => {
                    self.emit(EventRecord::RmaOpCompleteBlocking { window, matching });
                }
                CompletionMode::Deferred => {
                    self.defer_completion(window, matching);
                }
            }
            self.emit(EventRecord::RegionExit { region });

            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a remote atomic.
    ///
    /// Atomics always complete synchronously -- the return value
    /// depends on the remote result -- so this is always the
    /// immediate-completion branch, with read and write extents
    /// recorded distinctly (compare-carrying kinds read double width).
    pub fn instrumented_atomic<T>(
        &self,
        region: RegionHandle,
        kind: AtomicKind,
        elem_size: u64,
        target: PeId,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        let mut issued = None;
        if event_gen_active {
            self.guard().set_events(false);

            self.emit(EventRecord::RegionEnter { region });
            let window = self.windows().world();
            let matching = self.allocate_matching_id();
            let (bytes_read, bytes_written) = kind.extents(elem_size);
            self.emit(EventRecord::RmaAtomic {
                window,
                target,
                kind,
                bytes_read,
                bytes_written,
                matching,
            });
            issued = Some((window, matching));
        }

        let ret = op();

        if let Some((window, matching)) = issued {
            self.emit(EventRecord::RmaOpCompleteBlocking { window, matching });
            self.emit(EventRecord::RegionExit { region });

            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a collective addressed by an active-set descriptor.
    ///
    /// A pending completion obligation is discharged before the
    /// collective's begin record, so the deferred put's completion
    /// precedes the synchronization that guarantees it.
    pub fn instrumented_collective<T>(
        &self,
        region: RegionHandle,
        kind: CollectiveKind,
        set: ActiveSet,
        root: Option<PeId>,
        payload: CollectivePayload,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);

            self.emit(EventRecord::RegionEnter { region });
            self.discharge_pending();
            self.emit(EventRecord::CollectiveBegin {
                sync: COLLECTIVE_SYNC,
            });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::CollectiveEnd {
                kind,
                sync: COLLECTIVE_SYNC,
                window: self.resolve(set),
                root,
                bytes_sent: payload.bytes_sent,
                bytes_received: payload.bytes_received,
            });
            self.emit(EventRecord::RegionExit { region });

            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a team-scoped collective.
    ///
    /// Same begin/end protocol, but the window comes from the team
    /// registry; there is no descriptor to resolve.
    pub fn instrumented_team_collective<T>(
        &self,
        region: RegionHandle,
        kind: CollectiveKind,
        team: TeamId,
        root: Option<PeId>,
        payload: CollectivePayload,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);

            self.emit(EventRecord::RegionEnter { region });
            self.discharge_pending();
            self.emit(EventRecord::CollectiveBegin {
                sync: COLLECTIVE_SYNC,
            });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::CollectiveEnd {
                kind,
                sync: COLLECTIVE_SYNC,
                window: self.resolve_team(team),
                root,
                bytes_sent: payload.bytes_sent,
                bytes_received: payload.bytes_received,
            });
            self.emit(EventRecord::RegionExit { region });

            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a blocking lock acquisition. The acquire record is
    /// emitted after the real call returns -- that is the moment the
    /// lock is actually held.
    pub fn instrumented_set_lock<T>(
        &self,
        region: RegionHandle,
        lock: LockId,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);
            self.emit(EventRecord::RegionEnter { region });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::LockAcquire {
                window: self.windows().world(),
                lock,
                mode: LockMode::Exclusive,
            });
            self.emit(EventRecord::RegionExit { region });
            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a lock release.
    pub fn instrumented_clear_lock<T>(
        &self,
        region: RegionHandle,
        lock: LockId,
        op: impl FnOnce() -> T,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);
            self.emit(EventRecord::RegionEnter { region });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::LockRelease {
                window: self.windows().world(),
                lock,
            });
            self.emit(EventRecord::RegionExit { region });
            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a non-blocking lock attempt.
    ///
    /// `classify` maps the real call's return value to a [`LockProbe`]
    /// without consuming it: a successful attempt records an
    /// acquisition (`LockRequest`), a failed one records the attempt
    /// (`LockTry`) so post-hoc analysis can tell them apart. The real
    /// return value reaches the caller unmodified either way.
    pub fn instrumented_test_lock<T>(
        &self,
        region: RegionHandle,
        lock: LockId,
        op: impl FnOnce() -> T,
        classify: impl FnOnce(&T) -> LockProbe,
    ) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);
            self.emit(EventRecord::RegionEnter { region });
        }

        let ret = op();

        if event_gen_active {
            let window = self.windows().world();
            match classify(&ret) {
                LockProbe::Acquired => self.emit(EventRecord::LockRequest {
                    window,
                    lock,
                    mode: LockMode::Exclusive,
                }),
                LockProbe::Contended => self.emit(EventRecord::LockTry {
                    window,
                    lock,
                    mode: LockMode::Exclusive,
                }),
            }
            self.emit(EventRecord::RegionExit { region });
            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a point-to-point wait for a remote value change.
    pub fn instrumented_wait<T>(&self, region: RegionHandle, op: impl FnOnce() -> T) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);
            self.emit(EventRecord::RegionEnter { region });
            self.emit(EventRecord::RmaWaitChange {
                window: self.windows().world(),
            });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::RegionExit { region });
            self.guard().set_events(true);
        }

        ret
    }

    /// Bracket a call that only needs region enter/exit records
    /// (memory-ordering ops, team management, queries).
    pub fn instrumented_region<T>(&self, region: RegionHandle, op: impl FnOnce() -> T) -> T {
        let _scope = self.guard().measurement_scope();
        let event_gen_active = self.guard().events_enabled();

        if event_gen_active {
            self.guard().set_events(false);
            self.emit(EventRecord::RegionEnter { region });
        }

        let ret = op();

        if event_gen_active {
            self.emit(EventRecord::RegionExit { region });
            self.guard().set_events(true);
        }

        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmascope_core::{EventKind, Topology};

    const REGION: RegionHandle = RegionHandle(1);

    fn ctx() -> PeContext {
        PeContext::initialize(Topology::new(0, 4))
    }

    #[test]
    fn test_blocking_put_completes_immediately() {
        let ctx = ctx();
        ctx.instrumented_rma(REGION, RmaProfile::PUT, PeId::new(1), 8, || ());

        let trace = ctx.trace();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace[0].kind(), EventKind::RegionEnter);
        assert_eq!(trace[1].kind(), EventKind::RmaPut);
        assert_eq!(trace[2].kind(), EventKind::RmaOpCompleteBlocking);
        assert_eq!(trace[3].kind(), EventKind::RegionExit);
        assert_eq!(trace[1].matching_id(), trace[2].matching_id());
        assert!(!ctx.has_pending_completion());
    }

    #[test]
    fn test_deferred_put_owes_completion() {
        let ctx = ctx();
        ctx.instrumented_rma(REGION, RmaProfile::PUT_NBI, PeId::new(1), 8, || ());

        let trace = ctx.trace();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[1].kind(), EventKind::RmaPut);
        assert_eq!(trace[2].kind(), EventKind::RegionExit);
        assert!(ctx.has_pending_completion());
    }

    #[test]
    fn test_get_records_direction() {
        let ctx = ctx();
        let value = ctx.instrumented_rma(REGION, RmaProfile::GET, PeId::new(2), 16, || 42u64);
        assert_eq!(value, 42);
        assert_eq!(ctx.count_kind(EventKind::RmaGet), 1);
        assert_eq!(ctx.count_kind(EventKind::RmaOpCompleteBlocking), 1);
    }

    #[test]
    fn test_atomic_extents_recorded() {
        let ctx = ctx();
        ctx.instrumented_atomic(REGION, AtomicKind::CompareAndSwap, 8, PeId::new(1), || 0u64);

        let trace = ctx.trace();
        match trace[1] {
            EventRecord::RmaAtomic {
                kind,
                bytes_read,
                bytes_written,
                ..
            } => {
                assert_eq!(kind, AtomicKind::CompareAndSwap);
                assert_eq!(bytes_read, 16);
                assert_eq!(bytes_written, 8);
            }
            ref other => panic!("expected atomic record, got {other}"),
        }
        assert_eq!(trace[2].kind(), EventKind::RmaOpCompleteBlocking);
    }

    #[test]
    fn test_collective_discharges_pending_before_begin() {
        let ctx = ctx();
        ctx.instrumented_rma(REGION, RmaProfile::PUT_NBI, PeId::new(1), 8, || ());
        let put_id = ctx.trace()[1].matching_id().unwrap();

        ctx.instrumented_collective(
            RegionHandle(2),
            CollectiveKind::Broadcast,
            ActiveSet::world(4),
            Some(PeId::new(0)),
            CollectivePayload::broadcast(8, 4, 4),
            || (),
        );

        let trace = ctx.trace();
        let discharge = trace
            .iter()
            .position(|r| r.kind() == EventKind::RmaOpCompleteRemote)
            .unwrap();
        let begin = trace
            .iter()
            .position(|r| r.kind() == EventKind::CollectiveBegin)
            .unwrap();
        assert!(discharge < begin);
        // Discharged with the put's original id, not a fresh one.
        assert_eq!(trace[discharge].matching_id(), Some(put_id));
        assert!(!ctx.has_pending_completion());
    }

    #[test]
    fn test_collective_end_payload() {
        let ctx = ctx();
        ctx.instrumented_collective(
            REGION,
            CollectiveKind::Reduce,
            ActiveSet::new(0, 0, 4),
            None,
            CollectivePayload::reduce(8, 10, 4),
            || (),
        );

        let trace = ctx.trace();
        match trace[2] {
            EventRecord::CollectiveEnd {
                kind,
                window,
                root,
                bytes_sent,
                bytes_received,
                sync,
            } => {
                assert_eq!(kind, CollectiveKind::Reduce);
                assert_eq!(window, ctx.windows().world());
                assert_eq!(root, None);
                assert_eq!(bytes_sent, 240);
                assert_eq!(bytes_received, 240);
                assert!(sync.contains(SyncLevel::PROCESS));
                assert!(sync.contains(SyncLevel::MEMORY));
            }
            ref other => panic!("expected collective end, got {other}"),
        }
    }

    #[test]
    fn test_team_collective_uses_team_window() {
        let ctx = ctx();
        let team = TeamId(0xfeed);
        ctx.instrumented_team_collective(
            REGION,
            CollectiveKind::Barrier,
            team,
            None,
            CollectivePayload::barrier(),
            || (),
        );

        let expected = ctx.resolve_team(team);
        let trace = ctx.trace();
        match trace[2] {
            EventRecord::CollectiveEnd { window, .. } => assert_eq!(window, expected),
            ref other => panic!("expected collective end, got {other}"),
        }
    }

    #[test]
    fn test_lock_protocol_records() {
        let ctx = ctx();
        let lock = LockId(0x1000);

        ctx.instrumented_set_lock(REGION, lock, || ());
        ctx.instrumented_clear_lock(REGION, lock, || ());
        assert_eq!(ctx.count_kind(EventKind::LockAcquire), 1);
        assert_eq!(ctx.count_kind(EventKind::LockRelease), 1);

        // Non-blocking attempt: success records a request, failure a try.
        let ret = ctx.instrumented_test_lock(
            REGION,
            lock,
            || 0i32,
            |r| if *r == 0 { LockProbe::Acquired } else { LockProbe::Contended },
        );
        assert_eq!(ret, 0);
        let ret = ctx.instrumented_test_lock(
            REGION,
            lock,
            || 1i32,
            |r| if *r == 0 { LockProbe::Acquired } else { LockProbe::Contended },
        );
        assert_eq!(ret, 1);
        assert_eq!(ctx.count_kind(EventKind::LockRequest), 1);
        assert_eq!(ctx.count_kind(EventKind::LockTry), 1);
    }

    #[test]
    fn test_wait_records_watch() {
        let ctx = ctx();
        ctx.instrumented_wait(REGION, || ());
        let trace = ctx.trace();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[1].kind(), EventKind::RmaWaitChange);
    }

    #[test]
    fn test_nested_call_stays_silent() {
        let ctx = ctx();
        // An instrumented call made while events are off (e.g. the
        // library's own internals) must leave no trace of its own.
        ctx.instrumented_rma(REGION, RmaProfile::PUT, PeId::new(1), 8, || {
            ctx.instrumented_rma(RegionHandle(9), RmaProfile::GET, PeId::new(2), 4, || ())
        });

        let trace = ctx.trace();
        assert_eq!(trace.len(), 4);
        assert!(trace.iter().all(|r| r.kind() != EventKind::RmaGet));
        assert_eq!(ctx.guard().depth(), 0);
        assert!(ctx.guard().events_enabled());
    }

    #[test]
    fn test_depth_balanced_around_every_shape() {
        let ctx = ctx();
        ctx.instrumented_region(REGION, || ());
        ctx.instrumented_wait(REGION, || ());
        ctx.instrumented_set_lock(REGION, LockId(1), || ());
        ctx.instrumented_collective(
            REGION,
            CollectiveKind::Barrier,
            ActiveSet::world(4),
            None,
            CollectivePayload::barrier(),
            || (),
        );
        assert_eq!(ctx.guard().depth(), 0);
    }

    #[test]
    fn test_disabled_events_still_call_through() {
        let ctx = ctx();
        ctx.guard().set_events(false);
        let value = ctx.instrumented_rma(REGION, RmaProfile::PUT, PeId::new(1), 8, || 7u32);
        assert_eq!(value, 7);
        assert_eq!(ctx.event_count(), 0);
    }
}
