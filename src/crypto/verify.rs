//! Ed25519 verification of license authority responses.
//!
//! The authority signs the raw response body and sends the signature as
//! `License-Signature: algorithm="ed25519", signature="<base64>"`.

use crate::TierlockError;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::RwLock;

/// Name of the response header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "License-Signature";

/// Parse a `License-Signature` header and return the base64 signature.
///
/// Format: `algorithm="ed25519", signature="<base64>"` (extra keys ignored).
pub fn parse_signature_header(header: &str) -> Result<String, TierlockError> {
    let mut parts: HashMap<String, String> = HashMap::new();

    for part in header.split(',') {
        if let Some((key, value)) = part.trim().split_once('=') {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            parts.insert(key.trim().to_lowercase(), value.to_string());
        }
    }

    match parts.get("algorithm").map(String::as_str) {
        Some("ed25519") => {}
        Some(other) => {
            return Err(TierlockError::ProtocolError(format!(
                "Unsupported signature algorithm: {} (expected ed25519)",
                other
            )))
        }
        None => {
            return Err(TierlockError::ProtocolError(
                "Missing algorithm in signature header".to_string(),
            ))
        }
    }

    parts.remove("signature").ok_or_else(|| {
        TierlockError::ProtocolError("Missing signature in signature header".to_string())
    })
}

/// Cache for decoded verifying keys.
static KEY_CACHE: OnceCell<RwLock<HashMap<String, VerifyingKey>>> = OnceCell::new();

/// Decode a hex-encoded Ed25519 public key.
///
/// The key is cached after first decode.
pub fn decode_public_key(hex_key: &str) -> Result<VerifyingKey, TierlockError> {
    let cache = KEY_CACHE.get_or_init(|| RwLock::new(HashMap::new()));
    if let Ok(guard) = cache.read() {
        if let Some(key) = guard.get(hex_key) {
            return Ok(*key);
        }
    }

    let bytes = hex::decode(hex_key)
        .map_err(|e| TierlockError::ConfigError(format!("Invalid public key hex: {}", e)))?;

    let key_array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| TierlockError::ConfigError("Public key must be 32 bytes".to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&key_array)
        .map_err(|e| TierlockError::ConfigError(format!("Invalid Ed25519 public key: {}", e)))?;

    if let Ok(mut guard) = cache.write() {
        guard.insert(hex_key.to_string(), verifying_key);
    }

    Ok(verifying_key)
}

/// Verify an Ed25519 signature over a message.
pub fn verify_ed25519(
    signature_b64: &str,
    message: &[u8],
    verifying_key: &VerifyingKey,
) -> Result<(), TierlockError> {
    let sig_bytes = STANDARD
        .decode(signature_b64)
        .map_err(|_| TierlockError::SignatureInvalid)?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| TierlockError::SignatureInvalid)?;

    verifying_key
        .verify(message, &Signature::from_bytes(&sig_array))
        .map_err(|_| TierlockError::SignatureInvalid)
}

/// Check a response body against its signature header (fail-closed).
pub fn verify_body_signature(
    header: Option<&str>,
    body: &[u8],
    public_key_hex: &str,
) -> Result<(), TierlockError> {
    let header = header.ok_or(TierlockError::SignatureMissing)?;
    let signature = parse_signature_header(header)?;
    let key = decode_public_key(public_key_hex)?;
    verify_ed25519(&signature, body, &key)
}
