//! Scan session gating
//!
//! Holds one debouncer per authenticated operator session. Each client
//! session is a single logical thread of control, so one slot per
//! operator is sufficient.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::debounce::ScanDebouncer;

/// Per-operator debouncers for all live sessions.
#[derive(Clone, Default)]
pub struct ScanGate {
    sessions: Arc<Mutex<HashMap<Uuid, ScanDebouncer>>>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one signal through the operator's debouncer. Returns `true`
    /// when the signal should be forwarded to identity resolution.
    pub fn admit(&self, operator_id: Uuid, at: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.lock().expect("scan gate lock poisoned");
        sessions.entry(operator_id).or_default().observe(at)
    }
}
