use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ports::TimeSource;

// ============================================================================
// SystemTimeSource - Production Time Source
// ============================================================================

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ============================================================================
// ControllableTimeSource - Test Time Source
// ============================================================================

/// Clock that only moves when told to.
///
/// Clones share the same offset, so a test can keep one handle and pass
/// another to the session under test.
#[derive(Debug, Clone)]
pub struct ControllableTimeSource {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ControllableTimeSource {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock forward by `by`, saturating at `u64::MAX` milliseconds.
    pub fn advance(&self, by: Duration) {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .offset_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |offset| {
                Some(offset.saturating_add(by_ms))
            });
    }
}

impl Default for ControllableTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}
