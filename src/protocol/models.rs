//! License record, plan tiers and the license check wire format.

use crate::TierlockError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Plan tier. The derived ordering is the tier ordering:
/// `Demo < Full < Premium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Local trial tier.
    Demo,
    /// Standard paid tier.
    Full,
    /// Highest tier.
    Premium,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Plan::Demo => "demo",
            Plan::Full => "full",
            Plan::Premium => "premium",
        };
        f.write_str(name)
    }
}

/// Server-declared license status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// License is in good standing.
    Active,
    /// License was revoked by the vendor.
    Blocked,
    /// License ran out.
    Expired,
    /// License is temporarily suspended (e.g. payment issue).
    Suspended,
}

/// The license currently held by this installation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Opaque installation identifier.
    pub client_id: String,

    /// Bearer credential. Never logged.
    pub token: String,

    /// Plan tier of the license.
    pub plan: Plan,

    /// Last known status.
    pub status: LicenseStatus,

    /// Instant after which the license is invalid.
    pub expires_at: DateTime<Utc>,

    /// Module identifiers explicitly granted.
    #[serde(default)]
    pub active_modules: BTreeSet<String>,

    /// Last successful confirmation by the license authority.
    pub last_validated_at: DateTime<Utc>,
}

impl LicenseRecord {
    /// Build a locally issued demo license. It carries no token and is
    /// never sent to the authority.
    pub fn demo(client_id: impl Into<String>, now: DateTime<Utc>, period: chrono::Duration) -> Self {
        Self {
            client_id: client_id.into(),
            token: String::new(),
            plan: Plan::Demo,
            status: LicenseStatus::Active,
            expires_at: now + period,
            active_modules: BTreeSet::new(),
            last_validated_at: now,
        }
    }

    /// Whether this record was bootstrapped locally in demo mode.
    pub fn is_demo(&self) -> bool {
        self.token.is_empty() && self.plan == Plan::Demo
    }
}

impl fmt::Debug for LicenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseRecord")
            .field("client_id", &self.client_id)
            .field("token", &"[REDACTED]")
            .field("plan", &self.plan)
            .field("status", &self.status)
            .field("expires_at", &self.expires_at)
            .field("active_modules", &self.active_modules)
            .field("last_validated_at", &self.last_validated_at)
            .finish()
    }
}

/// Body of `POST /license/check`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest<'a> {
    /// Installation identifier.
    pub client_id: &'a str,
    /// License token.
    pub token: &'a str,
}

/// Response of `POST /license/check`.
///
/// Only `valid` is mandatory: a rejection may omit the remaining fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Authority verdict.
    pub valid: bool,
    /// Plan tier.
    #[serde(default)]
    pub plan: Option<Plan>,
    /// Declared status.
    #[serde(default)]
    pub status: Option<LicenseStatus>,
    /// Expiry instant.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicitly granted modules.
    #[serde(default)]
    pub active_modules: Option<BTreeSet<String>>,
}

impl CheckResponse {
    /// Turn an authority answer into the record to commit.
    ///
    /// A positive answer must be complete. A negative answer keeps what we
    /// knew from `previous` and is forced into a non-active status, so that
    /// the record persisted afterwards never reads as active.
    pub fn into_record(
        self,
        client_id: &str,
        token: &str,
        previous: Option<&LicenseRecord>,
        now: DateTime<Utc>,
    ) -> Result<LicenseRecord, TierlockError> {
        if self.valid {
            let plan = self.plan.ok_or_else(|| missing_field("plan"))?;
            let status = self.status.ok_or_else(|| missing_field("status"))?;
            let expires_at = self.expires_at.ok_or_else(|| missing_field("expiresAt"))?;
            return Ok(LicenseRecord {
                client_id: client_id.to_string(),
                token: token.to_string(),
                plan,
                status,
                expires_at,
                active_modules: self.active_modules.unwrap_or_default(),
                last_validated_at: now,
            });
        }

        let expires_at = self
            .expires_at
            .or_else(|| previous.map(|p| p.expires_at))
            .unwrap_or(now);
        let status = match self.status {
            Some(LicenseStatus::Active) | None if expires_at < now => LicenseStatus::Expired,
            Some(LicenseStatus::Active) | None => LicenseStatus::Blocked,
            Some(other) => other,
        };

        Ok(LicenseRecord {
            client_id: client_id.to_string(),
            token: token.to_string(),
            plan: self
                .plan
                .or_else(|| previous.map(|p| p.plan))
                .unwrap_or(Plan::Demo),
            status,
            expires_at,
            active_modules: BTreeSet::new(),
            last_validated_at: now,
        })
    }
}

fn missing_field(name: &str) -> TierlockError {
    TierlockError::ProtocolError(format!("valid response is missing `{}`", name))
}

/// Parse raw JSON body into a check response.
pub fn parse_check_response(body: &[u8]) -> Result<CheckResponse, TierlockError> {
    serde_json::from_slice(body)
        .map_err(|e| TierlockError::ProtocolError(format!("Failed to parse check response: {}", e)))
}
