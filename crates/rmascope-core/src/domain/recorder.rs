//! Event Recorder
//!
//! Stores [`EventRecord`]s in strict program order behind a pluggable
//! storage backend. The recorder itself is not thread-safe; one
//! recorder belongs to one processing element, and the owning context
//! serializes access.
//!
//! # Invariants
//!
//! - `count` only grows, and only after a successful store
//! - records in `[0, count)` are exactly the records handed to
//!   [`EventRecorder::record`], in that order

use crate::domain::event::{EventKind, EventRecord};
use crate::error::RecorderError;

/// Storage seam for the recorder.
///
/// Backends own capacity policy; the recorder owns ordering.
pub trait RecorderBackend {
    /// Store a record at `index`.
    ///
    /// `index` is always the current record count, i.e. stores arrive
    /// densely from zero.
    fn store(&mut self, index: usize, record: EventRecord) -> Result<(), RecorderError>;

    /// Record previously stored at `index`, if in range.
    fn get(&self, index: usize) -> Option<&EventRecord>;

    /// All records in `[0, count)` as a slice.
    fn records(&self, count: usize) -> &[EventRecord];
}

/// Heap-backed storage, growing on demand up to a fixed cap.
pub struct HeapBackend {
    records: Vec<EventRecord>,
    capacity: usize,
}

impl HeapBackend {
    /// Create a backend that refuses to grow past `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }
}

impl RecorderBackend for HeapBackend {
    fn store(&mut self, index: usize, record: EventRecord) -> Result<(), RecorderError> {
        if index >= self.capacity {
            return Err(RecorderError::BufferExhausted {
                capacity: self.capacity,
                kind: record.kind(),
            });
        }
        debug_assert_eq!(index, self.records.len(), "stores must be dense");
        self.records.push(record);
        Ok(())
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index)
    }

    #[inline]
    fn records(&self, count: usize) -> &[EventRecord] {
        &self.records[..count.min(self.records.len())]
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Copy)]
pub struct RecorderConfig {
    /// Maximum number of records to keep; exceeding this is the fatal
    /// buffer-exhaustion failure of the measurement layer
    pub max_records: usize,
}

/// Default record capacity (per processing element)
pub const DEFAULT_MAX_RECORDS: usize = 1 << 20;

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

/// Strict program-order event recorder, generic over storage.
pub struct EventRecorder<B: RecorderBackend> {
    backend: B,
    count: usize,
    config: RecorderConfig,
}

impl EventRecorder<HeapBackend> {
    /// Heap-backed recorder with the given capacity.
    pub fn with_capacity(max_records: usize) -> Self {
        Self::new(HeapBackend::new(max_records), RecorderConfig { max_records })
    }
}

impl<B: RecorderBackend> EventRecorder<B> {
    /// Create a recorder over an explicit backend.
    pub fn new(backend: B, config: RecorderConfig) -> Self {
        Self {
            backend,
            count: 0,
            config,
        }
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// `BufferExhausted` when the configured capacity is reached. On
    /// the instrumentation path this escalates to process termination;
    /// it is a `Result` here so tests can observe the policy.
    pub fn record(&mut self, record: EventRecord) -> Result<(), RecorderError> {
        if self.count >= self.config.max_records {
            return Err(RecorderError::BufferExhausted {
                capacity: self.config.max_records,
                kind: record.kind(),
            });
        }
        self.backend.store(self.count, record)?;
        self.count += 1;
        Ok(())
    }

    /// Record at `index`, if recorded.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        if index < self.count {
            self.backend.get(index)
        } else {
            None
        }
    }

    /// All records, in program order.
    #[inline]
    pub fn records(&self) -> &[EventRecord] {
        self.backend.records(self.count)
    }

    /// Number of recorded events.
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Count of records of one kind.
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.records().iter().filter(|r| r.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{MatchingId, RegionHandle, WindowHandle};

    fn enter(r: u32) -> EventRecord {
        EventRecord::RegionEnter {
            region: RegionHandle(r),
        }
    }

    #[test]
    fn test_records_kept_in_program_order() {
        let mut rec = EventRecorder::with_capacity(16);
        for r in 0..5 {
            rec.record(enter(r)).unwrap();
        }
        assert_eq!(rec.count(), 5);
        for (i, record) in rec.records().iter().enumerate() {
            assert_eq!(*record, enter(i as u32));
        }
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut rec = EventRecorder::with_capacity(2);
        rec.record(enter(0)).unwrap();
        rec.record(enter(1)).unwrap();
        let err = rec.record(enter(2)).unwrap_err();
        assert_eq!(
            err,
            RecorderError::BufferExhausted {
                capacity: 2,
                kind: EventKind::RegionEnter
            }
        );
        // A failed store must not advance the count.
        assert_eq!(rec.count(), 2);
    }

    #[test]
    fn test_kind_counting() {
        let mut rec = EventRecorder::with_capacity(16);
        rec.record(enter(0)).unwrap();
        rec.record(EventRecord::RmaOpCompleteBlocking {
            window: WindowHandle::new(0),
            matching: MatchingId(0),
        })
        .unwrap();
        rec.record(enter(1)).unwrap();
        assert_eq!(rec.count_kind(EventKind::RegionEnter), 2);
        assert_eq!(rec.count_kind(EventKind::RmaOpCompleteBlocking), 1);
        assert_eq!(rec.count_kind(EventKind::RmaPut), 0);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut rec = EventRecorder::with_capacity(4);
        rec.record(enter(0)).unwrap();
        assert!(rec.get(0).is_some());
        assert!(rec.get(1).is_none());
    }
}
