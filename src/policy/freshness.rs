//! Cached-trust freshness: how long a license confirmed by the authority
//! may be honored without talking to it again.

use crate::policy::validate::{validate, Reason, Verdict};
use crate::protocol::models::LicenseRecord;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Maximum future tolerance for `last_validated_at` (60 seconds).
pub const MAX_FUTURE_TOLERANCE_SECONDS: i64 = 60;

/// Whether a record's last remote confirmation is too old, or lies in the
/// future beyond tolerance (clock rolled back).
pub fn is_stale(record: &LicenseRecord, now: DateTime<Utc>, staleness_window: Duration) -> bool {
    let age_seconds = (now - record.last_validated_at).num_seconds();
    let window_seconds = i64::try_from(staleness_window.as_secs()).unwrap_or(i64::MAX);

    age_seconds > window_seconds || age_seconds < -MAX_FUTURE_TOLERANCE_SECONDS
}

/// Staleness check as a verdict. `None` when the record is fresh.
pub fn check_staleness(
    record: &LicenseRecord,
    now: DateTime<Utc>,
    staleness_window: Duration,
) -> Option<Verdict> {
    is_stale(record, now, staleness_window).then(|| {
        Verdict::block(
            Reason::StaleCache,
            "License could not be confirmed for too long. Check your connection and refresh.",
        )
    })
}

/// Full local evaluation: the validator first, then cached-trust staleness.
///
/// A stale record is treated as expired even if `expires_at` looks fine.
pub fn evaluate(
    license: Option<&LicenseRecord>,
    now: DateTime<Utc>,
    warning_window: Duration,
    staleness_window: Duration,
) -> Verdict {
    let verdict = validate(license, now, warning_window);
    if !verdict.valid {
        return verdict;
    }
    match license.and_then(|l| check_staleness(l, now, staleness_window)) {
        Some(stale) => stale,
        None => verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::validate::Action;
    use crate::protocol::models::{LicenseStatus, Plan};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn validated_ago(age: chrono::Duration) -> LicenseRecord {
        LicenseRecord {
            client_id: "client-1".into(),
            token: "tok".into(),
            plan: Plan::Full,
            status: LicenseStatus::Active,
            expires_at: now() + chrono::Duration::days(90),
            active_modules: BTreeSet::new(),
            last_validated_at: now() - age,
        }
    }

    #[test]
    fn fresh_record_is_not_stale() {
        assert!(!is_stale(&validated_ago(chrono::Duration::hours(1)), now(), WEEK));
    }

    #[test]
    fn staleness_boundary() {
        assert!(!is_stale(&validated_ago(chrono::Duration::days(7)), now(), WEEK));
        assert!(is_stale(
            &validated_ago(chrono::Duration::days(7) + chrono::Duration::seconds(1)),
            now(),
            WEEK
        ));
    }

    #[test]
    fn future_validation_beyond_tolerance_is_stale() {
        assert!(!is_stale(&validated_ago(chrono::Duration::seconds(-45)), now(), WEEK));
        assert!(is_stale(&validated_ago(chrono::Duration::seconds(-120)), now(), WEEK));
    }

    #[test]
    fn evaluate_flags_stale_as_block() {
        let record = validated_ago(chrono::Duration::days(8));
        let verdict = evaluate(Some(&record), now(), WEEK, WEEK);
        assert!(!verdict.valid);
        assert_eq!(verdict.action, Action::Block);
        assert_eq!(verdict.reason, Some(Reason::StaleCache));
    }

    #[test]
    fn evaluate_keeps_validator_reason_first() {
        let mut record = validated_ago(chrono::Duration::days(8));
        record.status = LicenseStatus::Blocked;
        let verdict = evaluate(Some(&record), now(), WEEK, WEEK);
        assert_eq!(verdict.reason, Some(Reason::Blocked));
    }

    #[test]
    fn evaluate_passes_fresh_record() {
        let record = validated_ago(chrono::Duration::hours(2));
        assert!(evaluate(Some(&record), now(), WEEK, WEEK).valid);
    }
}
