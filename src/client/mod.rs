//! Remote license authority.

pub mod http;

use crate::protocol::models::CheckResponse;
use crate::TierlockError;

/// The server that confirms licenses. Consulted, never trusted blindly.
///
/// Implementations block for at most their request timeout. Any failure to
/// get a usable answer (transport, non-2xx, malformed body, bad signature)
/// is reported as an error; the manager treats those as network failures.
pub trait LicenseAuthority: Send + Sync {
    /// Ask the authority about a license.
    fn check(&self, client_id: &str, token: &str) -> Result<CheckResponse, TierlockError>;
}
