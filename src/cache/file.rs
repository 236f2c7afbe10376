//! Encrypted file store with atomic writes.
//!
//! Stores the sealed license record at `dirs::data_dir()/<namespace>/license.json`.
//! Uses temp file + rename for atomic writes.

use crate::cache::format::StoredEnvelope;
use crate::cache::LicenseStore;
use crate::clock::Clock;
use crate::crypto::machine_key::MachineKey;
use crate::policy::freshness::is_stale;
use crate::protocol::models::LicenseRecord;
use crate::TierlockError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const RECORD_FILE: &str = "license.json";
const TEMP_FILE: &str = "license.json.tmp";

/// File-backed, machine-bound encrypted license store.
pub struct EncryptedFileStore {
    /// Directory holding the record.
    dir: PathBuf,
    key: MachineKey,
    clock: Arc<dyn Clock>,
    staleness_window: Duration,
}

impl EncryptedFileStore {
    /// Create a store under `dirs::data_dir()/<namespace>/`, keyed to this machine.
    pub fn new(
        namespace: &str,
        clock: Arc<dyn Clock>,
        staleness_window: Duration,
    ) -> Result<Self, TierlockError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| TierlockError::StoreIO("Could not find data directory".to_string()))?;

        Self::with_path(
            base_dir.join(namespace),
            MachineKey::derive(namespace),
            clock,
            staleness_window,
        )
    }

    /// Create a store in a specific directory with an explicit key.
    pub fn with_path(
        dir: PathBuf,
        key: MachineKey,
        clock: Arc<dyn Clock>,
        staleness_window: Duration,
    ) -> Result<Self, TierlockError> {
        fs::create_dir_all(&dir)
            .map_err(|e| TierlockError::StoreIO(format!("Failed to create store dir: {}", e)))?;

        Ok(Self {
            dir,
            key,
            clock,
            staleness_window,
        })
    }

    /// Path of the record file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(RECORD_FILE)
    }

    fn read_envelope(&self, path: &Path) -> Result<StoredEnvelope, TierlockError> {
        let json = fs::read_to_string(path)
            .map_err(|e| TierlockError::StoreIO(format!("Failed to read store file: {}", e)))?;
        StoredEnvelope::from_json(&json)
    }
}

impl LicenseStore for EncryptedFileStore {
    fn save(&self, record: &LicenseRecord) -> Result<(), TierlockError> {
        let target_path = self.path();
        let temp_path = self.dir.join(TEMP_FILE);

        let json = StoredEnvelope::seal(record, &self.key, self.clock.now_utc())?.to_json()?;

        fs::write(&temp_path, &json)
            .map_err(|e| TierlockError::StoreIO(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| TierlockError::StoreIO(format!("Failed to rename store file: {}", e)))?;

        Ok(())
    }

    fn load(&self) -> Result<Option<LicenseRecord>, TierlockError> {
        let path = self.path();

        if !path.exists() {
            return Ok(None);
        }

        let record = self.read_envelope(&path)?.open(&self.key)?;

        if is_stale(&record, self.clock.now_utc(), self.staleness_window) {
            debug!(
                last_validated_at = %record.last_validated_at,
                "ignoring stale stored license"
            );
            return Ok(None);
        }

        Ok(Some(record))
    }

    fn clear(&self) -> Result<(), TierlockError> {
        for path in [self.path(), self.dir.join(TEMP_FILE)] {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| TierlockError::StoreIO(format!("Failed to delete store file: {}", e)))?;
            }
        }
        Ok(())
    }
}
