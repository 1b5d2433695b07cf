//! Scan signal debouncing
//!
//! Barcode scanner hardware can fire several detection events for one
//! physical scan. The debouncer suppresses any signal arriving inside a
//! fixed window after the previously accepted signal, regardless of the
//! code value, so only the first signal reaches identity resolution.

use chrono::{DateTime, Duration, Utc};

/// Suppression window between accepted scan signals.
pub const DEBOUNCE_WINDOW_MS: i64 = 500;

/// Debounce state for one operator session.
///
/// A single `last_accepted_at` slot with a pure decision function. The
/// slot only advances when a signal is accepted, so a burst of rapid
/// signals collapses to the first one.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    window: Duration,
    last_accepted_at: Option<DateTime<Utc>>,
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted_at: None,
        }
    }

    /// Observe a scan signal timestamp. Returns `true` when the signal is
    /// accepted and should be forwarded, `false` when it is suppressed.
    ///
    /// A timestamp earlier than the last accepted one (clock skew,
    /// out-of-order delivery) counts as inside the window.
    pub fn observe(&mut self, at: DateTime<Utc>) -> bool {
        match self.last_accepted_at {
            Some(last) if at.signed_duration_since(last) < self.window => false,
            _ => {
                self.last_accepted_at = Some(at);
                true
            }
        }
    }

    pub fn last_accepted_at(&self) -> Option<DateTime<Utc>> {
        self.last_accepted_at
    }
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEBOUNCE_WINDOW_MS))
    }
}
