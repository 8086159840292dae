//! Per-API Wrapper Adapters
//!
//! [`Instrumented`] fronts a [`PgasRuntime`] with the bracketing
//! protocols of the domain layer. Each method is a thin adapter:
//! pick the region handle and operation metadata, hand the real call
//! to the matching bracketing function, pass the return value through
//! unmodified. No wrapper contains control flow of its own; the
//! protocol lives in one place.

use crate::adapters::regions::ApiRegion;
use crate::adapters::runtime::PgasRuntime;
use crate::domain::bracket::{LockProbe, RmaProfile};
use crate::domain::collective::CollectivePayload;
use crate::domain::context::PeContext;
use crate::domain::registry::{ActiveSet, TeamId};
use rmascope_core::{AtomicKind, CollectiveKind, LockId, PeId, RecorderConfig, Topology};

const U64_BYTES: u64 = std::mem::size_of::<u64>() as u64;

/// An instrumented view of one PE's communication runtime.
pub struct Instrumented<R: PgasRuntime> {
    runtime: R,
    ctx: PeContext,
}

impl<R: PgasRuntime> Instrumented<R> {
    /// Wrap a runtime, initializing the measurement context from its
    /// topology. Event generation turns on once setup is complete,
    /// mirroring the init-wrapper lifecycle of the observed system.
    pub fn new(runtime: R) -> Self {
        Self::with_config(runtime, RecorderConfig::default())
    }

    /// Like [`Instrumented::new`] with an explicit recorder
    /// configuration.
    pub fn with_config(runtime: R, config: RecorderConfig) -> Self {
        let topology = Topology::new(runtime.my_pe(), runtime.num_pes());
        Self {
            runtime,
            ctx: PeContext::with_config(topology, config),
        }
    }

    /// The measurement context (trace access, registries).
    #[inline(always)]
    pub fn context(&self) -> &PeContext {
        &self.ctx
    }

    /// The wrapped runtime.
    #[inline(always)]
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn world_set(&self) -> ActiveSet {
        ActiveSet::world(self.ctx.topology().num_pes)
    }

    // ------------------------------------------------------------------
    // Data transfer
    // ------------------------------------------------------------------

    /// Elemental put of one u64.
    pub fn put_u64(&self, dest: usize, value: u64, pe: u32) {
        self.ctx.instrumented_rma(
            ApiRegion::PutU64.handle(),
            RmaProfile::PUT,
            PeId::new(pe),
            U64_BYTES,
            || self.runtime.put(dest, &value.to_le_bytes(), pe),
        )
    }

    /// Block put.
    pub fn putmem(&self, dest: usize, src: &[u8], pe: u32) {
        self.ctx.instrumented_rma(
            ApiRegion::PutMem.handle(),
            RmaProfile::PUT,
            PeId::new(pe),
            src.len() as u64,
            || self.runtime.put(dest, src, pe),
        )
    }

    /// Fire-and-forget put; its completion record is deferred to the
    /// next synchronization point.
    pub fn putmem_nbi(&self, dest: usize, src: &[u8], pe: u32) {
        self.ctx.instrumented_rma(
            ApiRegion::PutMemNbi.handle(),
            RmaProfile::PUT_NBI,
            PeId::new(pe),
            src.len() as u64,
            || self.runtime.put_nbi(dest, src, pe),
        )
    }

    /// Elemental get of one u64.
    pub fn get_u64(&self, src: usize, pe: u32) -> u64 {
        self.ctx.instrumented_rma(
            ApiRegion::GetU64.handle(),
            RmaProfile::GET,
            PeId::new(pe),
            U64_BYTES,
            || {
                let bytes = self.runtime.get(src, U64_BYTES as usize, pe);
                let mut word = [0u8; 8];
                word.copy_from_slice(&bytes);
                u64::from_le_bytes(word)
            },
        )
    }

    /// Block get.
    pub fn getmem(&self, src: usize, len: usize, pe: u32) -> Vec<u8> {
        self.ctx.instrumented_rma(
            ApiRegion::GetMem.handle(),
            RmaProfile::GET,
            PeId::new(pe),
            len as u64,
            || self.runtime.get(src, len, pe),
        )
    }

    // ------------------------------------------------------------------
    // Atomics
    // ------------------------------------------------------------------

    /// Atomic swap.
    pub fn swap(&self, addr: usize, value: u64, pe: u32) -> u64 {
        self.ctx.instrumented_atomic(
            ApiRegion::Swap.handle(),
            AtomicKind::Swap,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.swap(addr, value, pe),
        )
    }

    /// Atomic compare-and-swap.
    pub fn compare_swap(&self, addr: usize, cond: u64, value: u64, pe: u32) -> u64 {
        self.ctx.instrumented_atomic(
            ApiRegion::CompareSwap.handle(),
            AtomicKind::CompareAndSwap,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.compare_swap(addr, cond, value, pe),
        )
    }

    /// Atomic fetch-and-add.
    pub fn fetch_add(&self, addr: usize, value: u64, pe: u32) -> u64 {
        self.ctx.instrumented_atomic(
            ApiRegion::FetchAdd.handle(),
            AtomicKind::FetchAndAdd,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.fetch_add(addr, value, pe),
        )
    }

    /// Atomic fetch-and-increment.
    pub fn fetch_inc(&self, addr: usize, pe: u32) -> u64 {
        self.ctx.instrumented_atomic(
            ApiRegion::FetchInc.handle(),
            AtomicKind::FetchAndIncrement,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.fetch_inc(addr, pe),
        )
    }

    /// Atomic add, no fetch.
    pub fn add(&self, addr: usize, value: u64, pe: u32) {
        self.ctx.instrumented_atomic(
            ApiRegion::Add.handle(),
            AtomicKind::Add,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.add(addr, value, pe),
        )
    }

    /// Atomic increment, no fetch.
    pub fn inc(&self, addr: usize, pe: u32) {
        self.ctx.instrumented_atomic(
            ApiRegion::Inc.handle(),
            AtomicKind::Increment,
            U64_BYTES,
            PeId::new(pe),
            || self.runtime.inc(addr, pe),
        )
    }

    // ------------------------------------------------------------------
    // Collectives
    // ------------------------------------------------------------------

    /// Barrier over all PEs.
    pub fn barrier_all(&self) {
        self.ctx.instrumented_collective(
            ApiRegion::BarrierAll.handle(),
            CollectiveKind::Barrier,
            self.world_set(),
            None,
            CollectivePayload::barrier(),
            || self.runtime.barrier_all(),
        )
    }

    /// Barrier over an active set.
    pub fn barrier(&self, set: ActiveSet) {
        self.ctx.instrumented_collective(
            ApiRegion::Barrier.handle(),
            CollectiveKind::Barrier,
            set,
            None,
            CollectivePayload::barrier(),
            || self.runtime.barrier(set),
        )
    }

    /// Broadcast `count` u64 elements from `root` across `set`.
    pub fn broadcast_u64(&self, dest: usize, src: usize, count: usize, root: u32, set: ActiveSet) {
        self.ctx.instrumented_collective(
            ApiRegion::Broadcast.handle(),
            CollectiveKind::Broadcast,
            set,
            Some(PeId::new(root)),
            CollectivePayload::broadcast(U64_BYTES, count as u64, set.pe_size as u64),
            || {
                self.runtime
                    .broadcast(dest, src, count * U64_BYTES as usize, root, set)
            },
        )
    }

    /// Concatenating collect of `nbytes` per PE across `set`.
    pub fn collect(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet) {
        self.ctx.instrumented_collective(
            ApiRegion::Collect.handle(),
            CollectiveKind::Collect,
            set,
            None,
            CollectivePayload::collect(nbytes as u64, set.pe_size as u64),
            || self.runtime.collect(dest, src, nbytes, set),
        )
    }

    /// Element-wise u64 sum reduction across `set`.
    pub fn reduce_sum_u64(&self, dest: usize, src: usize, count: usize, set: ActiveSet) {
        self.ctx.instrumented_collective(
            ApiRegion::ReduceSum.handle(),
            CollectiveKind::Reduce,
            set,
            None,
            CollectivePayload::reduce(U64_BYTES, count as u64, set.pe_size as u64),
            || self.runtime.reduce_sum(dest, src, count, set),
        )
    }

    /// Personalized all-to-all exchange of `nbytes` per pair.
    pub fn alltoall(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet) {
        self.ctx.instrumented_collective(
            ApiRegion::AllToAll.handle(),
            CollectiveKind::AllToAll,
            set,
            None,
            CollectivePayload::all_to_all(nbytes as u64, set.pe_size as u64),
            || self.runtime.alltoall(dest, src, nbytes, set),
        )
    }

    // ------------------------------------------------------------------
    // Locks
    // ------------------------------------------------------------------

    /// Blocking lock acquisition.
    pub fn set_lock(&self, lock: usize) {
        self.ctx
            .instrumented_set_lock(ApiRegion::SetLock.handle(), LockId(lock as u64), || {
                self.runtime.set_lock(lock)
            })
    }

    /// Lock release.
    pub fn clear_lock(&self, lock: usize) {
        self.ctx
            .instrumented_clear_lock(ApiRegion::ClearLock.handle(), LockId(lock as u64), || {
                self.runtime.clear_lock(lock)
            })
    }

    /// Non-blocking lock attempt; zero means acquired. The runtime's
    /// return value is passed through unmodified.
    pub fn test_lock(&self, lock: usize) -> i32 {
        self.ctx.instrumented_test_lock(
            ApiRegion::TestLock.handle(),
            LockId(lock as u64),
            || self.runtime.test_lock(lock),
            |ret| {
                if *ret == 0 {
                    LockProbe::Acquired
                } else {
                    LockProbe::Contended
                }
            },
        )
    }

    // ------------------------------------------------------------------
    // Point-to-point synchronization and ordering
    // ------------------------------------------------------------------

    /// Block until the local word at `addr` no longer equals
    /// `current`.
    pub fn wait_until_change(&self, addr: usize, current: u64) {
        self.ctx.instrumented_wait(ApiRegion::WaitUntil.handle(), || {
            self.runtime.wait_until_change(addr, current)
        })
    }

    /// Put-ordering fence.
    pub fn fence(&self) {
        self.ctx
            .instrumented_region(ApiRegion::Fence.handle(), || self.runtime.fence())
    }

    /// Put-completion quiet.
    pub fn quiet(&self) {
        self.ctx
            .instrumented_region(ApiRegion::Quiet.handle(), || self.runtime.quiet())
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Create a team from an active set.
    pub fn team_split_strided(&self, set: ActiveSet) -> TeamId {
        let raw = self
            .ctx
            .instrumented_region(ApiRegion::TeamSplit.handle(), || {
                self.runtime.team_split_strided(set)
            });
        TeamId(raw)
    }

    /// Destroy a team and drop its window mapping.
    pub fn team_free(&self, team: TeamId) {
        self.ctx
            .instrumented_region(ApiRegion::TeamFree.handle(), || {
                self.runtime.team_free(team.0)
            });
        self.ctx.forget_team(team);
    }

    /// Barrier over a team (team-scoped collective bracketing).
    pub fn team_barrier(&self, team: TeamId) {
        self.ctx.instrumented_team_collective(
            ApiRegion::TeamBarrier.handle(),
            CollectiveKind::Barrier,
            team,
            None,
            CollectivePayload::barrier(),
            || self.runtime.team_barrier(team.0),
        )
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Finalize measurement: a last barrier over all PEs (discharging
    /// any pending completion), then teardown -- event generation off,
    /// window handles invalidated. The trace and the definition table
    /// stay readable through [`Instrumented::context`].
    pub fn finalize(&self) {
        self.ctx.instrumented_collective(
            ApiRegion::Finalize.handle(),
            CollectiveKind::Barrier,
            self.world_set(),
            None,
            CollectivePayload::barrier(),
            || self.runtime.barrier_all(),
        );
        self.ctx.teardown();
    }
}
