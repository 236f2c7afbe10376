//! Encrypted on-disk record format.
//!
//! The license record is serialized to JSON and sealed with
//! ChaCha20-Poly1305 under the machine-bound key. The envelope keeps the
//! nonce, the ciphertext (with tag) and when it was written.

use crate::crypto::machine_key::MachineKey;
use crate::protocol::models::LicenseRecord;
use crate::TierlockError;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Associated data binding the ciphertext to this format.
const AAD: &[u8] = b"tierlock-license-record-v1";

/// Sealed license record as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEnvelope {
    /// Format version.
    pub version: u8,

    /// When the envelope was written.
    pub saved_at: DateTime<Utc>,

    /// Base64 nonce.
    pub nonce: String,

    /// Base64 ciphertext including the authentication tag.
    pub ciphertext: String,
}

impl StoredEnvelope {
    /// Encrypt a record.
    pub fn seal(
        record: &LicenseRecord,
        key: &MachineKey,
        now: DateTime<Utc>,
    ) -> Result<Self, TierlockError> {
        let plaintext = serde_json::to_vec(record)
            .map_err(|e| TierlockError::Crypto(format!("Failed to serialize record: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: AAD,
                },
            )
            .map_err(|e| TierlockError::Crypto(format!("Encryption failed: {}", e)))?;

        Ok(Self {
            version: ENVELOPE_VERSION,
            saved_at: now,
            nonce: STANDARD.encode(nonce_bytes),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Decrypt the record. Any failure means the file is corrupt or was
    /// written on another machine.
    pub fn open(&self, key: &MachineKey) -> Result<LicenseRecord, TierlockError> {
        if self.version != ENVELOPE_VERSION {
            return Err(TierlockError::StoreCorrupt(format!(
                "unsupported envelope version {}",
                self.version
            )));
        }

        let nonce_bytes = STANDARD
            .decode(&self.nonce)
            .map_err(|e| TierlockError::StoreCorrupt(format!("invalid nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(TierlockError::StoreCorrupt("invalid nonce length".to_string()));
        }
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| TierlockError::StoreCorrupt(format!("invalid ciphertext: {}", e)))?;

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &ciphertext,
                    aad: AAD,
                },
            )
            .map_err(|_| {
                TierlockError::StoreCorrupt("decryption failed (wrong key or tampered data)".to_string())
            })?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| TierlockError::StoreCorrupt(format!("invalid record: {}", e)))
    }

    /// Serialize the envelope to JSON.
    pub fn to_json(&self) -> Result<String, TierlockError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TierlockError::StoreIO(format!("Failed to serialize envelope: {}", e)))
    }

    /// Deserialize an envelope from JSON.
    pub fn from_json(json: &str) -> Result<Self, TierlockError> {
        serde_json::from_str(json)
            .map_err(|e| TierlockError::StoreCorrupt(format!("Failed to deserialize envelope: {}", e)))
    }
}
