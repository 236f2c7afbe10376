//! License validation: decide whether a record grants access right now
//! and which remedial action the host application should take.

use crate::protocol::models::{LicenseRecord, LicenseStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// What the host application should do with a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Nothing to show.
    None,
    /// Non-blocking notice.
    Warn,
    /// Deny all module access and surface a remedial message.
    Block,
}

/// Why a license or module decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Reason {
    /// No license present locally or resolvable remotely.
    NoLicense,
    /// Past `expires_at`, or declared expired.
    Expired,
    /// Blocked or suspended by the vendor.
    Blocked,
    /// Valid, but inside the warning window.
    ExpiringSoon,
    /// Authority unreachable; operating on cached trust.
    NetworkFailure,
    /// Cached record too old to be trusted without the authority.
    StaleCache,
    /// Stored record could not be decrypted or parsed.
    CorruptPersistence,
    /// Module needs a higher plan tier.
    InsufficientPlan,
    /// Module is not in the license's explicit grant list.
    NotGranted,
    /// Module id is not in the catalog.
    UnknownModule,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of validating a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Whether the license currently grants access.
    pub valid: bool,
    /// Action for the host application.
    pub action: Action,
    /// Human readable message, with remaining-time context when warning.
    pub message: String,
    /// Classification, `None` for a silent pass.
    pub reason: Option<Reason>,
}

impl Verdict {
    /// A blocking verdict.
    pub fn block(reason: Reason, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            action: Action::Block,
            message: message.into(),
            reason: Some(reason),
        }
    }

    /// A passing verdict that rests on cached trust because the authority
    /// could not be reached.
    pub fn offline() -> Self {
        Self {
            valid: true,
            action: Action::None,
            message: "License server unreachable, using the cached license".to_string(),
            reason: Some(Reason::NetworkFailure),
        }
    }

    fn pass() -> Self {
        Self {
            valid: true,
            action: Action::None,
            message: "License is valid".to_string(),
            reason: None,
        }
    }
}

/// Validate a license record at `now`.
///
/// Pure: no I/O and no hidden state, the same inputs always give the same
/// verdict. Blocked/suspended status wins over expiry, expiry wins over the
/// warning window.
pub fn validate(
    license: Option<&LicenseRecord>,
    now: DateTime<Utc>,
    warning_window: Duration,
) -> Verdict {
    let Some(license) = license else {
        return Verdict::block(
            Reason::NoLicense,
            "No license found. Activate a license key or start a demo.",
        );
    };

    match license.status {
        LicenseStatus::Blocked => {
            return Verdict::block(Reason::Blocked, "License has been blocked. Contact support.");
        }
        LicenseStatus::Suspended => {
            return Verdict::block(Reason::Blocked, "License is suspended. Contact support.");
        }
        LicenseStatus::Expired => {
            return Verdict::block(Reason::Expired, "License has expired. Renew to continue.");
        }
        LicenseStatus::Active => {}
    }

    if now > license.expires_at {
        return Verdict::block(Reason::Expired, "License has expired. Renew to continue.");
    }

    let remaining = license.expires_at - now;
    let window = chrono::Duration::from_std(warning_window).unwrap_or(chrono::Duration::MAX);
    if remaining <= window {
        return Verdict {
            valid: true,
            action: Action::Warn,
            message: format!("License expires in {}", describe_remaining(remaining)),
            reason: Some(Reason::ExpiringSoon),
        };
    }

    Verdict::pass()
}

/// Render a remaining duration the way users read it ("3 days", "5 hours").
pub fn describe_remaining(remaining: chrono::Duration) -> String {
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    if remaining.num_days() >= 1 {
        plural(remaining.num_days(), "day")
    } else if remaining.num_hours() >= 1 {
        plural(remaining.num_hours(), "hour")
    } else if remaining.num_minutes() >= 1 {
        plural(remaining.num_minutes(), "minute")
    } else {
        "less than a minute".to_string()
    }
}
