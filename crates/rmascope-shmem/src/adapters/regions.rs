//! Instrumented-Region Catalog
//!
//! Region naming and source-location bookkeeping are an external
//! service; the wrappers only need a stable handle per instrumented
//! API entry point. The catalog is the fixed enumeration of those
//! entry points, with the discriminant doubling as the handle value.

use rmascope_core::RegionHandle;

/// Instrumented API entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum ApiRegion {
    PutU64,
    PutMem,
    PutMemNbi,
    GetU64,
    GetMem,
    Swap,
    CompareSwap,
    FetchAdd,
    FetchInc,
    Add,
    Inc,
    BarrierAll,
    Barrier,
    Broadcast,
    Collect,
    ReduceSum,
    AllToAll,
    SetLock,
    ClearLock,
    TestLock,
    WaitUntil,
    Fence,
    Quiet,
    TeamSplit,
    TeamFree,
    TeamBarrier,
    Finalize,
}

impl ApiRegion {
    /// The region handle events are recorded under.
    #[inline(always)]
    pub fn handle(self) -> RegionHandle {
        RegionHandle(self as u32)
    }

    /// Wrapped API name, for trace rendering.
    pub fn name(self) -> &'static str {
        match self {
            ApiRegion::PutU64 => "put_u64",
            ApiRegion::PutMem => "putmem",
            ApiRegion::PutMemNbi => "putmem_nbi",
            ApiRegion::GetU64 => "get_u64",
            ApiRegion::GetMem => "getmem",
            ApiRegion::Swap => "atomic_swap",
            ApiRegion::CompareSwap => "atomic_compare_swap",
            ApiRegion::FetchAdd => "atomic_fetch_add",
            ApiRegion::FetchInc => "atomic_fetch_inc",
            ApiRegion::Add => "atomic_add",
            ApiRegion::Inc => "atomic_inc",
            ApiRegion::BarrierAll => "barrier_all",
            ApiRegion::Barrier => "barrier",
            ApiRegion::Broadcast => "broadcast",
            ApiRegion::Collect => "collect",
            ApiRegion::ReduceSum => "reduce_sum",
            ApiRegion::AllToAll => "alltoall",
            ApiRegion::SetLock => "set_lock",
            ApiRegion::ClearLock => "clear_lock",
            ApiRegion::TestLock => "test_lock",
            ApiRegion::WaitUntil => "wait_until",
            ApiRegion::Fence => "fence",
            ApiRegion::Quiet => "quiet",
            ApiRegion::TeamSplit => "team_split_strided",
            ApiRegion::TeamFree => "team_free",
            ApiRegion::TeamBarrier => "team_barrier",
            ApiRegion::Finalize => "finalize",
        }
    }

    /// Look a region handle back up, for trace rendering.
    pub fn from_handle(handle: RegionHandle) -> Option<ApiRegion> {
        ALL.get(handle.0 as usize).copied()
    }
}

const ALL: &[ApiRegion] = &[
    ApiRegion::PutU64,
    ApiRegion::PutMem,
    ApiRegion::PutMemNbi,
    ApiRegion::GetU64,
    ApiRegion::GetMem,
    ApiRegion::Swap,
    ApiRegion::CompareSwap,
    ApiRegion::FetchAdd,
    ApiRegion::FetchInc,
    ApiRegion::Add,
    ApiRegion::Inc,
    ApiRegion::BarrierAll,
    ApiRegion::Barrier,
    ApiRegion::Broadcast,
    ApiRegion::Collect,
    ApiRegion::ReduceSum,
    ApiRegion::AllToAll,
    ApiRegion::SetLock,
    ApiRegion::ClearLock,
    ApiRegion::TestLock,
    ApiRegion::WaitUntil,
    ApiRegion::Fence,
    ApiRegion::Quiet,
    ApiRegion::TeamSplit,
    ApiRegion::TeamFree,
    ApiRegion::TeamBarrier,
    ApiRegion::Finalize,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_round_trip() {
        for (i, region) in ALL.iter().enumerate() {
            assert_eq!(region.handle(), RegionHandle(i as u32));
            assert_eq!(ApiRegion::from_handle(region.handle()), Some(*region));
        }
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&str> = ALL.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }
}
