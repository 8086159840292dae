//! Registry integration tests
//!
//! Checks the active-set window registry through full instrumented
//! sessions: memoized resolution, world/self special-casing, the team
//! scheme's independence, and lock-protocol records over the shared
//! lock table.

use once_cell::sync::Lazy;
use rmascope_core::{EventKind, EventRecord, Topology};
use rmascope_shmem::{ActiveSet, Instrumented, PeContext, SimWorld};

/// Subset collectives exercised by several tests: (descriptor, root).
static SUBSETS: Lazy<Vec<(ActiveSet, u32)>> = Lazy::new(|| {
    vec![
        (ActiveSet::new(0, 0, 2), 0),
        (ActiveSet::new(0, 1, 2), 0),
        (ActiveSet::new(1, 0, 3), 1),
    ]
});

#[test]
fn test_four_pe_active_set_requested_twice_creates_once() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));
    let set = ActiveSet::new(0, 1, 4);

    shmem.barrier(set);
    shmem.barrier(set);

    let ctx = shmem.context();
    let windows: Vec<_> = ctx
        .trace()
        .iter()
        .filter(|r| r.kind() == EventKind::CollectiveEnd)
        .map(|r| r.window().unwrap())
        .collect();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0], windows[1]);

    // Exactly one group creation beyond the pre-created world + self.
    assert_eq!(ctx.window_definitions().len(), 3);
}

#[test]
fn test_world_barrier_uses_precreated_window() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));

    shmem.barrier_all();
    shmem.barrier(ActiveSet::world(4));

    let ctx = shmem.context();
    for record in ctx.trace() {
        if let EventRecord::CollectiveEnd { window, .. } = record {
            assert_eq!(window, ctx.windows().world());
        }
    }
    assert_eq!(ctx.window_definitions().len(), 2);
}

#[test]
fn test_subset_collectives_each_register_one_window() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));

    for (set, root) in SUBSETS.iter() {
        shmem.broadcast_u64(64, 0, 2, *root, *set);
        shmem.broadcast_u64(64, 0, 2, *root, *set);
    }

    // world + self + one per distinct subset.
    assert_eq!(
        shmem.context().window_definitions().len(),
        2 + SUBSETS.len()
    );
}

#[test]
fn test_team_windows_independent_of_descriptor_windows() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));
    let set = ActiveSet::new(0, 0, 2);

    let team = shmem.team_split_strided(set);
    shmem.team_barrier(team);
    shmem.barrier(set);

    let ctx = shmem.context();
    let ends: Vec<_> = ctx
        .trace()
        .iter()
        .filter(|r| r.kind() == EventKind::CollectiveEnd)
        .map(|r| r.window().unwrap())
        .collect();
    // Same member set, two addressing schemes, two windows.
    assert_eq!(ends.len(), 2);
    assert_ne!(ends[0], ends[1]);

    shmem.team_free(team);
    // The freed team's window definition is retained for unification.
    assert_eq!(ctx.window_definitions().len(), 4);
}

#[test]
fn test_definitions_expose_stable_labels() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));

    shmem.barrier(ActiveSet::new(0, 1, 2));
    let defs = shmem.context().window_definitions();

    assert_eq!(defs[0].label, "All PEs");
    assert_eq!(defs[1].label, "Self PE");
    assert_eq!(defs[2].label, "Active set 0:1:2");
    assert!(defs
        .iter()
        .zip(defs.iter().skip(1))
        .all(|(a, b)| a.handle.raw() < b.handle.raw()));
}

#[test]
fn test_test_lock_never_doubles_acquisition_without_release() {
    let world = SimWorld::new(2, 256);
    let shmem0 = Instrumented::new(world.pe(0));
    let shmem1 = Instrumented::new(world.pe(1));
    let lock = 0x40;

    // PE0 wins the probe; PE1's probe is contended.
    assert_eq!(shmem0.test_lock(lock), 0);
    assert_eq!(shmem1.test_lock(lock), 1);

    assert_eq!(shmem0.context().count_kind(EventKind::LockRequest), 1);
    assert_eq!(shmem1.context().count_kind(EventKind::LockRequest), 0);
    assert_eq!(shmem1.context().count_kind(EventKind::LockTry), 1);

    // After release, PE1's probe succeeds; between the two successful
    // probes of PE0+PE1 there is exactly one release.
    shmem0.clear_lock(lock);
    assert_eq!(shmem1.test_lock(lock), 0);
    assert_eq!(shmem1.context().count_kind(EventKind::LockRequest), 1);
    assert_eq!(shmem0.context().count_kind(EventKind::LockRelease), 1);
}

#[test]
fn test_repeated_probe_of_own_lock_records_one_acquisition() {
    let world = SimWorld::new(2, 256);
    let shmem = Instrumented::new(world.pe(0));
    let lock = 0x80;

    assert_eq!(shmem.test_lock(lock), 0);
    assert_ne!(shmem.test_lock(lock), 0);

    // Back-to-back probes from one flow never record two acquisitions
    // without an intervening release.
    let ctx = shmem.context();
    assert_eq!(ctx.count_kind(EventKind::LockRequest), 1);
    assert_eq!(ctx.count_kind(EventKind::LockTry), 1);
    assert_eq!(ctx.count_kind(EventKind::LockRelease), 0);
}

#[test]
fn test_simulated_elements_keep_separate_contexts() {
    // Two elements in one test process, each with its own context: no
    // shared globals anywhere in the layer.
    let world = SimWorld::new(2, 256);
    let shmem0 = Instrumented::new(world.pe(0));
    let shmem1 = Instrumented::new(world.pe(1));

    shmem0.put_u64(0, 5, 1);
    assert_eq!(shmem0.context().event_count(), 4);
    assert_eq!(shmem1.context().event_count(), 0);
    assert_eq!(world.read_u64(1, 0), 5);

    // Self-like descriptors resolve per element.
    let self0 = shmem0.context().resolve(ActiveSet::new(0, 0, 1));
    let self1 = shmem1.context().resolve(ActiveSet::new(1, 0, 1));
    assert_eq!(self0, shmem0.context().windows().self_window());
    assert_eq!(self1, shmem1.context().windows().self_window());
}

#[test]
fn test_bare_context_matches_facade_resolution() {
    // The registry behaves identically without the wrapper facade.
    let ctx = PeContext::initialize(Topology::new(0, 4));
    let set = ActiveSet::new(0, 1, 2);
    let direct = ctx.resolve(set);

    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));
    shmem.barrier(set);
    let via_facade = shmem
        .context()
        .trace()
        .iter()
        .find_map(|r| match r {
            EventRecord::CollectiveEnd { window, .. } => Some(*window),
            _ => None,
        })
        .unwrap();

    // Same creation order, same handle value.
    assert_eq!(direct.raw(), via_facade.raw());
}

#[test]
fn test_team_barrier_discharges_pending_put() {
    let world = SimWorld::new(4, 256);
    let shmem = Instrumented::new(world.pe(0));

    let team = shmem.team_split_strided(ActiveSet::new(0, 0, 2));
    shmem.putmem_nbi(0, &[1; 8], 1);
    shmem.team_barrier(team);

    let trace = shmem.context().trace();
    let discharge = trace
        .iter()
        .position(|r| r.kind() == EventKind::RmaOpCompleteRemote)
        .expect("team collective must discharge the pending put");
    let begin = trace
        .iter()
        .rposition(|r| r.kind() == EventKind::CollectiveBegin)
        .unwrap();
    assert!(discharge < begin);
    assert!(!shmem.context().has_pending_completion());
}
