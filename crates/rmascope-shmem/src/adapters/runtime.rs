//! The PGAS Runtime Seam
//!
//! The instrumentation layer consumes nothing from the communication
//! library beyond its ordinary call/return contract, captured here as
//! a trait. Addresses are byte offsets into the symmetric heap (the
//! same offset is valid on every PE); atomics operate on 8-byte
//! words.

use crate::domain::registry::ActiveSet;

/// One processing element's view of the communication runtime.
pub trait PgasRuntime {
    /// This element's id
    fn my_pe(&self) -> u32;
    /// Number of participating elements
    fn num_pes(&self) -> u32;

    /// Blocking block put: complete (at the target) on return
    fn put(&self, dest: usize, src: &[u8], pe: u32);
    /// Fire-and-forget put: delivery guaranteed only by the next
    /// synchronization
    fn put_nbi(&self, dest: usize, src: &[u8], pe: u32);
    /// Block get: data is in hand on return
    fn get(&self, src: usize, len: usize, pe: u32) -> Vec<u8>;

    /// Atomic swap, returning the old value
    fn swap(&self, addr: usize, value: u64, pe: u32) -> u64;
    /// Atomic compare-and-swap, returning the old value
    fn compare_swap(&self, addr: usize, cond: u64, value: u64, pe: u32) -> u64;
    /// Atomic fetch-and-add, returning the old value
    fn fetch_add(&self, addr: usize, value: u64, pe: u32) -> u64;
    /// Atomic fetch-and-increment, returning the old value
    fn fetch_inc(&self, addr: usize, pe: u32) -> u64;
    /// Atomic add, no fetch
    fn add(&self, addr: usize, value: u64, pe: u32);
    /// Atomic increment, no fetch
    fn inc(&self, addr: usize, pe: u32);

    /// Barrier over all elements
    fn barrier_all(&self);
    /// Barrier over an active set
    fn barrier(&self, set: ActiveSet);
    /// Broadcast `nbytes` from `root`'s `src` to every other member's
    /// `dest`
    fn broadcast(&self, dest: usize, src: usize, nbytes: usize, root: u32, set: ActiveSet);
    /// Concatenate each member's `nbytes` contribution into every
    /// member's `dest`, in set order
    fn collect(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet);
    /// Element-wise u64 sum reduction across the set
    fn reduce_sum(&self, dest: usize, src: usize, count: usize, set: ActiveSet);
    /// Personalized exchange of `nbytes` blocks between every pair
    fn alltoall(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet);

    /// Blocking acquisition of the advisory lock at `lock`
    fn set_lock(&self, lock: usize);
    /// Release of the advisory lock at `lock`
    fn clear_lock(&self, lock: usize);
    /// Non-blocking attempt; zero means the lock was free and is now
    /// held
    fn test_lock(&self, lock: usize) -> i32;

    /// Block until the local word at `addr` no longer equals `current`
    fn wait_until_change(&self, addr: usize, current: u64);
    /// Order puts to each PE
    fn fence(&self);
    /// Complete all outstanding puts
    fn quiet(&self);

    /// Create a team from an active set, returning an opaque handle
    fn team_split_strided(&self, set: ActiveSet) -> u64;
    /// Destroy a team
    fn team_free(&self, team: u64);
    /// Barrier over a team
    fn team_barrier(&self, team: u64);
}
