//! Active-Set Descriptor
//!
//! A described subset of processing elements participating in a
//! collective or owning a one-sided memory domain: lowest PE id, log2
//! of the stride between consecutive ids, and member count. Immutable;
//! used only as a cache key (structural equality).

use rmascope_core::PeId;
use std::fmt;

/// Descriptor of an active set of processing elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSet {
    /// Lowest PE id in the set
    pub pe_start: u32,
    /// Log (base 2) of the stride between consecutive PE ids;
    /// 0 means contiguous
    pub log_pe_stride: u32,
    /// Number of PEs in the set
    pub pe_size: u32,
}

impl ActiveSet {
    /// Describe an active set.
    pub const fn new(pe_start: u32, log_pe_stride: u32, pe_size: u32) -> Self {
        Self {
            pe_start,
            log_pe_stride,
            pe_size,
        }
    }

    /// The set of all `num_pes` elements, contiguous from zero.
    pub const fn world(num_pes: u32) -> Self {
        Self::new(0, 0, num_pes)
    }

    /// Whether this set is exactly the world set for `num_pes`.
    #[inline]
    pub fn is_world(&self, num_pes: u32) -> bool {
        self.pe_start == 0 && self.log_pe_stride == 0 && self.pe_size == num_pes
    }

    /// Whether this is a self-like set for `me`: the element alone,
    /// regardless of stride (a one-element set has no meaningful
    /// stride, so all spellings map to one group).
    #[inline]
    pub fn is_self_like(&self, me: PeId) -> bool {
        self.pe_start == me.raw() && self.pe_size == 1
    }

    /// Member ids, in set order.
    pub fn members(&self) -> impl Iterator<Item = PeId> + '_ {
        let stride = 1u32 << self.log_pe_stride;
        (0..self.pe_size).map(move |i| PeId::new(self.pe_start + i * stride))
    }
}

impl fmt::Display for ActiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.pe_start, self.log_pe_stride, self.pe_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_detection() {
        assert!(ActiveSet::world(4).is_world(4));
        assert!(!ActiveSet::world(4).is_world(8));
        assert!(!ActiveSet::new(1, 0, 4).is_world(4));
    }

    #[test]
    fn test_self_like_ignores_stride() {
        let me = PeId::new(2);
        assert!(ActiveSet::new(2, 0, 1).is_self_like(me));
        assert!(ActiveSet::new(2, 3, 1).is_self_like(me));
        assert!(!ActiveSet::new(2, 0, 2).is_self_like(me));
        assert!(!ActiveSet::new(1, 0, 1).is_self_like(me));
    }

    #[test]
    fn test_strided_members() {
        let set = ActiveSet::new(1, 1, 3);
        let members: Vec<u32> = set.members().map(PeId::raw).collect();
        assert_eq!(members, vec![1, 3, 5]);
    }
}
