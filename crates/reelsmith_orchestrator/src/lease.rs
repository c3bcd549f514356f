//! In-process segment leases.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Set of segments some worker in this process is currently generating.
///
/// Together with the run's own job table this keeps a single writer per
/// segment: the run refuses a second active job, and the lease refuses a
/// second worker before it ever touches the run.
#[derive(Debug, Clone, Default)]
pub struct SegmentLeases {
    held: Arc<Mutex<HashSet<String>>>,
}

impl SegmentLeases {
    /// Creates an empty lease set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lease for `key`, or returns `None` if it is already held.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<SegmentLease> {
        let key = key.into();
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(key.clone()) {
            return None;
        }
        Some(SegmentLease {
            key,
            held: self.held.clone(),
        })
    }

    /// Whether `key` is currently leased.
    pub fn is_held(&self, key: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    /// Number of leases held.
    pub fn len(&self) -> usize {
        self.held.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no lease is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive claim on one segment; released on drop.
#[derive(Debug)]
pub struct SegmentLease {
    key: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl SegmentLease {
    /// Leased key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for SegmentLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}
