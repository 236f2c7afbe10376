//! Machine-bound identifiers and key material.
//!
//! Both the default client id and the at-rest encryption key are derived
//! from stable characteristics of the local machine, so a copied store file
//! does not decrypt elsewhere.

use sha2::{Digest, Sha256};
use std::env;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the store encryption key (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

const STORE_KEY_DOMAIN: &str = "tierlock/store-key/v1";
const CLIENT_ID_DOMAIN: &str = "tierlock/client-id/v1";

/// Encryption key for the license store, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MachineKey {
    bytes: [u8; KEY_SIZE],
}

impl MachineKey {
    /// Derive the store key for `namespace` on this machine.
    pub fn derive(namespace: &str) -> Self {
        Self::from_components(&machine_components(), namespace)
    }

    /// Derive a key from explicit machine components.
    pub fn from_components(components: &[String], namespace: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(STORE_KEY_DOMAIN.as_bytes());
        hasher.update([0u8]);
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(components.join("|").as_bytes());
        Self {
            bytes: hasher.finalize().into(),
        }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for MachineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Stable installation identifier for this machine (32 hex characters).
pub fn machine_fingerprint() -> String {
    fingerprint_from_components(&machine_components())
}

fn fingerprint_from_components(components: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CLIENT_ID_DOMAIN.as_bytes());
    hasher.update([0u8]);
    hasher.update(components.join("|").as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// Collects the machine characteristics keys are bound to.
fn machine_components() -> Vec<String> {
    let mut ids = vec![env::consts::OS.to_string(), env::consts::ARCH.to_string()];

    ids.push(
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string()),
    );

    if let Some(machine_id) = machine_id() {
        ids.push(machine_id);
    }

    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        ids.push(user);
    }

    ids
}

fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
