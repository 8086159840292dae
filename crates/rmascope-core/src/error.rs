//! Error taxonomy and escalation policy
//!
//! Errors inside the measurement layer are infrastructure errors, not
//! application errors: the instrumented program must never observe a
//! changed return value because measurement ran out of a resource.
//! Recoverable `Result`s exist only inside the library; at the
//! outermost instrumentation boundary everything escalates through
//! [`fatal`].

use crate::domain::event::EventKind;

/// Errors raised by the event recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecorderError {
    /// The record buffer reached its configured capacity.
    ///
    /// A dropped record would leave a dangling start or completion in
    /// the trace, so callers on the instrumentation path must treat
    /// this as fatal.
    #[error("event buffer exhausted at {capacity} records (while storing {kind:?})")]
    BufferExhausted {
        /// Configured capacity that was hit
        capacity: usize,
        /// Kind of the record that could not be stored
        kind: EventKind,
    },
}

/// Escalate an infrastructure failure.
///
/// Logs the failure and terminates the process. Instrumentation
/// failures are never returned to the instrumented application (a
/// missing window handle or dropped record corrupts every subsequent
/// correlated record), so there is no recovery path.
pub fn fatal(context: &str, error: &dyn std::error::Error) -> ! {
    tracing::error!(target: "rmascope", %error, "fatal measurement failure: {context}");
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_error_display() {
        let err = RecorderError::BufferExhausted {
            capacity: 16,
            kind: EventKind::RmaPut,
        };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("RmaPut"));
    }
}
