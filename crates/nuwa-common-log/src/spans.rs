//! Span and timing helpers.

use std::time::{Duration, Instant};
use tracing::{debug_span, info_span, Span};

/// Span for one API request.
pub fn request_span(method: &str, endpoint: &str) -> Span {
    info_span!("request", method = %method, endpoint = %endpoint, attempt = tracing::field::Empty)
}

/// Span for a remote translation call.
pub fn translation_span(target: &str) -> Span {
    debug_span!("translation", target = %target)
}

/// Timing utility for operations.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Complete the timer, log the duration and return it.
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}
