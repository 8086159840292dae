//! Simulated Loopback Runtime
//!
//! [`SimWorld`] hosts N processing elements in one process: a
//! symmetric heap per PE, a shared advisory-lock table, and loopback
//! collectives. [`SimPe`] is one element's handle, implementing
//! [`PgasRuntime`].
//!
//! # Loopback semantics
//!
//! Data moves immediately: a put lands in the target heap before the
//! call returns, and a collective performs its whole data movement on
//! the first member's call. That is sufficient for a single-threaded
//! test harness driving each PE's calls in turn; rendezvous semantics
//! are the real library's business, not this stand-in's.

use crate::adapters::runtime::PgasRuntime;
use crate::domain::registry::ActiveSet;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A simulated communication domain of N processing elements.
pub struct SimWorld {
    num_pes: u32,
    heaps: Vec<Mutex<Vec<u8>>>,
    /// lock address -> holder PE
    locks: DashMap<usize, u32>,
    /// opaque team handle -> member set
    teams: DashMap<u64, ActiveSet>,
    next_team: AtomicU64,
    barriers: AtomicU64,
}

impl SimWorld {
    /// Create a domain of `num_pes` elements with `heap_bytes` of
    /// symmetric heap each.
    pub fn new(num_pes: u32, heap_bytes: usize) -> Arc<Self> {
        assert!(num_pes > 0, "simulated world needs at least one PE");
        Arc::new(Self {
            num_pes,
            heaps: (0..num_pes).map(|_| Mutex::new(vec![0; heap_bytes])).collect(),
            locks: DashMap::new(),
            teams: DashMap::new(),
            next_team: AtomicU64::new(1),
            barriers: AtomicU64::new(0),
        })
    }

    /// Handle for one element of this domain.
    pub fn pe(self: &Arc<Self>, pe: u32) -> SimPe {
        assert!(pe < self.num_pes, "PE {pe} out of range");
        SimPe {
            world: Arc::clone(self),
            me: pe,
        }
    }

    /// Number of barrier episodes observed (diagnostic).
    pub fn barrier_count(&self) -> u64 {
        self.barriers.load(Ordering::Relaxed)
    }

    /// Read one u64 word from a PE's heap (test inspection).
    pub fn read_u64(&self, pe: u32, addr: usize) -> u64 {
        let heap = self.heaps[pe as usize].lock();
        let mut word = [0u8; 8];
        word.copy_from_slice(&heap[addr..addr + 8]);
        u64::from_le_bytes(word)
    }

    /// Write one u64 word into a PE's heap (test setup).
    pub fn write_u64(&self, pe: u32, addr: usize, value: u64) {
        let mut heap = self.heaps[pe as usize].lock();
        heap[addr..addr + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn copy_into(&self, pe: u32, dest: usize, src: &[u8]) {
        let mut heap = self.heaps[pe as usize].lock();
        heap[dest..dest + src.len()].copy_from_slice(src);
    }

    fn copy_from(&self, pe: u32, src: usize, len: usize) -> Vec<u8> {
        let heap = self.heaps[pe as usize].lock();
        heap[src..src + len].to_vec()
    }

    fn update_u64(&self, pe: u32, addr: usize, f: impl FnOnce(u64) -> u64) -> u64 {
        let mut heap = self.heaps[pe as usize].lock();
        let mut word = [0u8; 8];
        word.copy_from_slice(&heap[addr..addr + 8]);
        let old = u64::from_le_bytes(word);
        heap[addr..addr + 8].copy_from_slice(&f(old).to_le_bytes());
        old
    }
}

/// One processing element's handle on a [`SimWorld`].
pub struct SimPe {
    world: Arc<SimWorld>,
    me: u32,
}

impl SimPe {
    /// The domain this element belongs to.
    pub fn world(&self) -> &Arc<SimWorld> {
        &self.world
    }
}

impl PgasRuntime for SimPe {
    fn my_pe(&self) -> u32 {
        self.me
    }

    fn num_pes(&self) -> u32 {
        self.world.num_pes
    }

    fn put(&self, dest: usize, src: &[u8], pe: u32) {
        self.world.copy_into(pe, dest, src);
    }

    fn put_nbi(&self, dest: usize, src: &[u8], pe: u32) {
        // Loopback delivers immediately; deferral is the measurement
        // layer's concern.
        self.world.copy_into(pe, dest, src);
    }

    fn get(&self, src: usize, len: usize, pe: u32) -> Vec<u8> {
        self.world.copy_from(pe, src, len)
    }

    fn swap(&self, addr: usize, value: u64, pe: u32) -> u64 {
        self.world.update_u64(pe, addr, |_| value)
    }

    fn compare_swap(&self, addr: usize, cond: u64, value: u64, pe: u32) -> u64 {
        self.world
            .update_u64(pe, addr, |old| if old == cond { value } else { old })
    }

    fn fetch_add(&self, addr: usize, value: u64, pe: u32) -> u64 {
        self.world.update_u64(pe, addr, |old| old.wrapping_add(value))
    }

    fn fetch_inc(&self, addr: usize, pe: u32) -> u64 {
        self.world.update_u64(pe, addr, |old| old.wrapping_add(1))
    }

    fn add(&self, addr: usize, value: u64, pe: u32) {
        self.world.update_u64(pe, addr, |old| old.wrapping_add(value));
    }

    fn inc(&self, addr: usize, pe: u32) {
        self.world.update_u64(pe, addr, |old| old.wrapping_add(1));
    }

    fn barrier_all(&self) {
        self.world.barriers.fetch_add(1, Ordering::Relaxed);
    }

    fn barrier(&self, _set: ActiveSet) {
        self.world.barriers.fetch_add(1, Ordering::Relaxed);
    }

    fn broadcast(&self, dest: usize, src: usize, nbytes: usize, root: u32, set: ActiveSet) {
        let data = self.world.copy_from(root, src, nbytes);
        for member in set.members() {
            if member.raw() != root {
                self.world.copy_into(member.raw(), dest, &data);
            }
        }
    }

    fn collect(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet) {
        let mut gathered = Vec::with_capacity(nbytes * set.pe_size as usize);
        for member in set.members() {
            gathered.extend_from_slice(&self.world.copy_from(member.raw(), src, nbytes));
        }
        for member in set.members() {
            self.world.copy_into(member.raw(), dest, &gathered);
        }
    }

    fn reduce_sum(&self, dest: usize, src: usize, count: usize, set: ActiveSet) {
        let mut sums = vec![0u64; count];
        for member in set.members() {
            for (i, sum) in sums.iter_mut().enumerate() {
                *sum = sum.wrapping_add(self.world.read_u64(member.raw(), src + i * 8));
            }
        }
        for member in set.members() {
            for (i, sum) in sums.iter().enumerate() {
                self.world.write_u64(member.raw(), dest + i * 8, *sum);
            }
        }
    }

    fn alltoall(&self, dest: usize, src: usize, nbytes: usize, set: ActiveSet) {
        let members: Vec<u32> = set.members().map(|pe| pe.raw()).collect();
        for (si, sender) in members.iter().enumerate() {
            for (ri, receiver) in members.iter().enumerate() {
                let block = self.world.copy_from(*sender, src + ri * nbytes, nbytes);
                self.world.copy_into(*receiver, dest + si * nbytes, &block);
            }
        }
    }

    fn set_lock(&self, lock: usize) {
        while self.test_lock(lock) != 0 {
            std::thread::yield_now();
        }
    }

    fn clear_lock(&self, lock: usize) {
        self.world
            .locks
            .remove_if(&lock, |_, holder| *holder == self.me);
    }

    fn test_lock(&self, lock: usize) -> i32 {
        // A held lock is held, no matter by whom: re-probing your own
        // lock is a failed attempt, as with a real advisory lock.
        match self.world.locks.entry(lock) {
            dashmap::mapref::entry::Entry::Occupied(_) => 1,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(self.me);
                0
            }
        }
    }

    fn wait_until_change(&self, addr: usize, current: u64) {
        while self.world.read_u64(self.me, addr) == current {
            std::thread::yield_now();
        }
    }

    fn fence(&self) {}

    fn quiet(&self) {}

    fn team_split_strided(&self, set: ActiveSet) -> u64 {
        let team = self.world.next_team.fetch_add(1, Ordering::Relaxed);
        self.world.teams.insert(team, set);
        team
    }

    fn team_free(&self, team: u64) {
        self.world.teams.remove(&team);
    }

    fn team_barrier(&self, _team: u64) {
        self.world.barriers.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_lands_in_target_heap() {
        let world = SimWorld::new(2, 64);
        let pe0 = world.pe(0);
        pe0.put(0, &42u64.to_le_bytes(), 1);
        assert_eq!(world.read_u64(1, 0), 42);
        assert_eq!(world.read_u64(0, 0), 0);
    }

    #[test]
    fn test_atomics_on_remote_heap() {
        let world = SimWorld::new(2, 64);
        let pe0 = world.pe(0);

        assert_eq!(pe0.fetch_add(8, 5, 1), 0);
        assert_eq!(pe0.fetch_add(8, 5, 1), 5);
        assert_eq!(pe0.swap(8, 100, 1), 10);
        assert_eq!(pe0.compare_swap(8, 100, 7, 1), 100);
        assert_eq!(world.read_u64(1, 8), 7);
        // Failed compare leaves the value alone.
        assert_eq!(pe0.compare_swap(8, 100, 9, 1), 7);
        assert_eq!(world.read_u64(1, 8), 7);
    }

    #[test]
    fn test_broadcast_reaches_non_root_members() {
        let world = SimWorld::new(4, 64);
        world.write_u64(0, 0, 77);
        let pe0 = world.pe(0);
        pe0.broadcast(8, 0, 8, 0, ActiveSet::world(4));

        for pe in 1..4 {
            assert_eq!(world.read_u64(pe, 8), 77);
        }
        // The root's dest is untouched.
        assert_eq!(world.read_u64(0, 8), 0);
    }

    #[test]
    fn test_reduce_sums_across_members() {
        let world = SimWorld::new(3, 64);
        for pe in 0..3 {
            world.write_u64(pe, 0, (pe + 1) as u64);
        }
        world.pe(0).reduce_sum(8, 0, 1, ActiveSet::world(3));
        for pe in 0..3 {
            assert_eq!(world.read_u64(pe, 8), 6);
        }
    }

    #[test]
    fn test_lock_contention_between_pes() {
        let world = SimWorld::new(2, 64);
        let pe0 = world.pe(0);
        let pe1 = world.pe(1);

        assert_eq!(pe0.test_lock(0x10), 0);
        assert_eq!(pe1.test_lock(0x10), 1);
        // Re-probing your own lock also fails.
        assert_eq!(pe0.test_lock(0x10), 1);
        pe0.clear_lock(0x10);
        assert_eq!(pe1.test_lock(0x10), 0);
        // Only the holder can release.
        pe0.clear_lock(0x10);
        assert_eq!(pe0.test_lock(0x10), 1);
    }
}
