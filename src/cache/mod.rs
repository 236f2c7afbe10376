//! Persistence gateway for the current license record.
//!
//! Stores must survive `load()` before any `save()` (returning `None`) and
//! must not hand back records whose last remote confirmation is older than
//! the staleness window.

pub mod file;
pub mod format;

use crate::clock::Clock;
use crate::policy::freshness::is_stale;
use crate::protocol::models::LicenseRecord;
use crate::TierlockError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Durable storage for the current license record.
pub trait LicenseStore: Send + Sync {
    /// Persist the record, replacing any previous one.
    fn save(&self, record: &LicenseRecord) -> Result<(), TierlockError>;

    /// Load the stored record. `Ok(None)` when nothing usable is stored.
    fn load(&self) -> Result<Option<LicenseRecord>, TierlockError>;

    /// Remove the stored record.
    fn clear(&self) -> Result<(), TierlockError>;
}

/// In-memory store with the same staleness contract as the file store.
pub struct MemoryStore {
    record: Mutex<Option<LicenseRecord>>,
    clock: Arc<dyn Clock>,
    staleness_window: Duration,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(clock: Arc<dyn Clock>, staleness_window: Duration) -> Self {
        Self {
            record: Mutex::new(None),
            clock,
            staleness_window,
        }
    }

    /// Whatever is held, ignoring staleness.
    pub fn peek(&self) -> Option<LicenseRecord> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl LicenseStore for MemoryStore {
    fn save(&self, record: &LicenseRecord) -> Result<(), TierlockError> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<LicenseRecord>, TierlockError> {
        let now = self.clock.now_utc();
        Ok(self
            .peek()
            .filter(|record| !is_stale(record, now, self.staleness_window)))
    }

    fn clear(&self) -> Result<(), TierlockError> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
