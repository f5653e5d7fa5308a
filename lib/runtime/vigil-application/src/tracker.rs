use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use vigil_domain::Violation;

/// Owns the active-violation set and the capped history.
///
/// The monitoring loop is the only writer; validator calls and status
/// queries read concurrently. The active set is handed off as an
/// `Arc<Vec<_>>` snapshot so readers never observe a partial update.
pub struct ViolationTracker {
    active: RwLock<Arc<Vec<Violation>>>,
    history: Mutex<VecDeque<Violation>>,
    cap: usize,
}

impl ViolationTracker {
    pub fn new(cap: usize) -> Self {
        Self {
            active: RwLock::new(Arc::new(Vec::new())),
            history: Mutex::new(VecDeque::new()),
            cap: cap.max(1),
        }
    }

    /// Swap in this tick's findings, replacing the previous active set.
    /// Every new violation is also appended to history; the oldest entries
    /// are evicted once the cap is exceeded.
    pub fn replace_active(&self, violations: Vec<Violation>) {
        let mut history = self.history.lock().expect("violation history lock poisoned");
        for violation in &violations {
            history.push_back(violation.clone());
        }
        while history.len() > self.cap {
            history.pop_front();
        }
        drop(history);

        let snapshot = Arc::new(violations);
        *self.active.write().expect("active violations lock poisoned") = snapshot;
    }

    /// Snapshot of the most recent tick's findings.
    pub fn active(&self) -> Arc<Vec<Violation>> {
        self.active
            .read()
            .expect("active violations lock poisoned")
            .clone()
    }

    pub fn history(&self) -> Vec<Violation> {
        self.history
            .lock()
            .expect("violation history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .expect("violation history lock poisoned")
            .len()
    }
}
