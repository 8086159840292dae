//! Process topology
//!
//! The instrumentation layer consumes exactly one query from the
//! runtime it observes: how many processing elements participate, and
//! which one is this process. Both are fixed for the process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A processing element id (a "PE" in SHMEM terms, a rank elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PeId(pub u32);

impl PeId {
    /// Create a new PE id
    #[inline(always)]
    pub fn new(id: u32) -> Self {
        PeId(id)
    }

    /// Raw id value
    #[inline(always)]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PE{}", self.0)
    }
}

/// Fixed process topology, captured once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// This process's own id
    pub my_pe: PeId,
    /// Total number of participating processing elements
    pub num_pes: u32,
}

impl Topology {
    /// Capture a topology.
    ///
    /// # Panics
    ///
    /// Panics if `my_pe` is outside `[0, num_pes)` or `num_pes` is
    /// zero; a measurement layer addressing nonexistent elements can
    /// only produce garbage records.
    pub fn new(my_pe: u32, num_pes: u32) -> Self {
        assert!(num_pes > 0, "topology must have at least one PE");
        assert!(my_pe < num_pes, "own PE id {my_pe} out of range 0..{num_pes}");
        Self {
            my_pe: PeId::new(my_pe),
            num_pes,
        }
    }

    /// Whether this is a single-element run (self and world coincide).
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.num_pes == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_bounds() {
        let topo = Topology::new(2, 4);
        assert_eq!(topo.my_pe, PeId::new(2));
        assert_eq!(topo.num_pes, 4);
        assert!(!topo.is_singleton());
        assert!(Topology::new(0, 1).is_singleton());
    }

    #[test]
    #[should_panic]
    fn test_topology_rejects_out_of_range_pe() {
        let _ = Topology::new(4, 4);
    }

    #[test]
    fn test_pe_display() {
        assert_eq!(PeId::new(7).to_string(), "PE7");
    }
}
