//! End-to-end license lifecycle scenarios.

mod common;

use chrono::Duration;
use common::{clock_at, confirmed, fixture, record};
use std::sync::Arc;
use tempfile::TempDir;
use tierlock::crypto::machine_key::MachineKey;
use tierlock::policy::validate::validate;
use tierlock::{
    Action, CheckOutcome, CheckResponse, Clock, EncryptedFileStore, GatingPolicy, LicenseManager,
    LicenseStatus, LicenseStore, LoopState, ModuleStatus, Monitor, Plan, Reason, TierlockConfig,
    TierlockError,
};

const START: &str = "2025-06-02T09:30:00Z";

fn file_store(dir: &TempDir, clock: Arc<dyn Clock>) -> EncryptedFileStore {
    let key = MachineKey::from_components(&["linux".into(), "x86_64".into(), "ws-7".into()], "scenarios");
    EncryptedFileStore::with_path(
        dir.path().join("scenario-app"),
        key,
        clock,
        std::time::Duration::from_secs(7 * 24 * 60 * 60),
    )
    .unwrap()
}

#[test]
fn scenario_a_saved_license_loads_and_validates() {
    let dir = TempDir::new().unwrap();
    let clock = clock_at(START);
    let store = file_store(&dir, clock.clone());

    let saved = record(&clock, Plan::Full, LicenseStatus::Active, Duration::hours(1));
    store.save(&saved).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.as_ref(), Some(&saved));

    let verdict = validate(loaded.as_ref(), clock.now_utc(), std::time::Duration::from_secs(30 * 60));
    assert!(verdict.valid);
    assert_eq!(verdict.action, Action::None);
    assert_eq!(verdict.reason, None);
}

#[test]
fn scenario_b_expiring_soon_warns() {
    let clock = clock_at(START);
    let license = record(&clock, Plan::Full, LicenseStatus::Active, Duration::days(3));

    let verdict = validate(
        Some(&license),
        clock.now_utc(),
        std::time::Duration::from_secs(7 * 24 * 60 * 60),
    );
    assert!(verdict.valid);
    assert_eq!(verdict.action, Action::Warn);
    assert_eq!(verdict.reason, Some(Reason::ExpiringSoon));
    assert!(verdict.message.contains("3 days"));
}

#[test]
fn scenario_c_blocked_license_denies_every_module() {
    let clock = clock_at(START);
    let license = record(&clock, Plan::Premium, LicenseStatus::Blocked, Duration::days(30));

    let verdict = validate(
        Some(&license),
        clock.now_utc(),
        std::time::Duration::from_secs(7 * 24 * 60 * 60),
    );
    assert!(!verdict.valid);
    assert_eq!(verdict.action, Action::Block);
    assert_eq!(verdict.reason, Some(Reason::Blocked));

    let f = fixture(clock, Some(license));
    assert_eq!(f.manager.state(), LoopState::Blocked);
    for module in ["inventory", "billing", "analytics"] {
        let decision = f.manager.can_access(module);
        assert!(!decision.allowed, "{module} should be denied");
        assert_eq!(decision.reason, Some(Reason::Blocked));
    }
}

#[test]
fn scenario_d_timeout_falls_back_to_cache() {
    let clock = clock_at(START);
    let mut cached = record(&clock, Plan::Full, LicenseStatus::Active, Duration::days(60));
    cached.last_validated_at = clock.now_utc() - Duration::hours(1);

    let f = fixture(clock, Some(cached));
    f.authority
        .fail(TierlockError::Transport("operation timed out".into()));

    let outcome = f.manager.revalidate();
    assert!(matches!(outcome, CheckOutcome::Offline(ref v) if v.valid));
    assert_eq!(f.manager.state(), LoopState::CacheFallback);
    assert!(f.manager.is_offline());
    assert_eq!(f.manager.verdict().reason, Some(Reason::NetworkFailure));
    assert_eq!(f.manager.verdict().action, Action::None);

    assert!(f.manager.can_access("inventory").allowed);
    assert!(f.manager.can_access("billing").allowed);
    assert_eq!(
        f.manager.can_access("analytics").reason,
        Some(Reason::InsufficientPlan)
    );
    assert_eq!(f.authority.calls(), vec![("client-42".into(), "tok-42".into())]);
    assert!(!f.observer.take().iter().any(|e| e.starts_with("blocked")));
}

#[test]
fn scenario_e_expiry_blocks_without_network() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.authority.answer(confirmed(&clock, Plan::Full, Duration::minutes(10)));
    f.manager.activate("tok-42").unwrap();
    assert_eq!(f.manager.state(), LoopState::Idle);
    f.observer.take();

    clock.advance(Duration::minutes(11));
    let verdict = f.manager.handle_expiry();

    assert_eq!(verdict.reason, Some(Reason::Expired));
    assert_eq!(f.manager.state(), LoopState::Blocked);
    assert_eq!(f.authority.calls().len(), 1);
    assert_eq!(
        f.manager.module_statuses()["billing"],
        ModuleStatus::Expired
    );

    let events = f.observer.take();
    assert!(events.iter().any(|e| e.starts_with("blocked:")));
    assert!(events.contains(&"module:billing:Expired".to_string()));
}

#[tokio::test(start_paused = true)]
async fn scenario_e_monitor_expiry_timer_beats_poll_interval() {
    let clock = clock_at(START);
    let config = TierlockConfig {
        poll_interval: std::time::Duration::from_secs(3600),
        ..common::config()
    };
    let authority = common::ScriptedAuthority::new();
    authority.answer(confirmed(&clock, Plan::Full, Duration::minutes(10)));
    authority.answer(confirmed(&clock, Plan::Full, Duration::minutes(10)));
    let manager = Arc::new(
        LicenseManager::builder(config.clone())
            .clock(clock.clone())
            .authority(authority.clone())
            .store(Arc::new(tierlock::MemoryStore::new(
                clock.clone(),
                config.staleness_window,
            )))
            .catalog(common::catalog())
            .build()
            .unwrap(),
    );
    manager.activate("tok-42").unwrap();
    assert!(manager.can_access("billing").allowed);

    let monitor = Monitor::start(Arc::clone(&manager));
    // The first scheduled check runs right away
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(authority.calls().len(), 2);
    assert_eq!(manager.state(), LoopState::Idle);

    clock.advance(Duration::minutes(11));
    tokio::time::sleep(std::time::Duration::from_secs(10 * 60 + 1)).await;

    assert_eq!(manager.state(), LoopState::Blocked);
    assert_eq!(manager.verdict().reason, Some(Reason::Expired));
    assert!(!manager.can_access("billing").allowed);
    assert_eq!(authority.calls().len(), 2, "expiry is decided locally");

    monitor.stop().await;
}

#[test]
fn offline_past_staleness_window_blocks() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.authority.answer(confirmed(&clock, Plan::Premium, Duration::days(365)));
    f.manager.activate("tok-42").unwrap();

    clock.advance(Duration::days(6));
    assert!(matches!(f.manager.revalidate(), CheckOutcome::Offline(_)));

    clock.advance(Duration::days(2));
    let outcome = f.manager.revalidate();
    assert!(matches!(outcome, CheckOutcome::Blocked(ref v) if v.reason == Some(Reason::StaleCache)));
    assert!(!f.manager.can_access("inventory").allowed);
}

#[test]
fn stale_record_is_rejected_by_store() {
    let dir = TempDir::new().unwrap();
    let clock = clock_at(START);
    let store = file_store(&dir, clock.clone());
    store
        .save(&record(&clock, Plan::Full, LicenseStatus::Active, Duration::days(365)))
        .unwrap();

    clock.advance(Duration::days(8));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn corrupt_store_is_discarded_and_reported() {
    let dir = TempDir::new().unwrap();
    let clock = clock_at(START);
    let store = Arc::new(file_store(&dir, clock.clone()));
    std::fs::write(store.path(), "{\"version\":1,\"not\":\"an envelope\"}").unwrap();

    let manager = LicenseManager::builder(common::config())
        .clock(clock)
        .authority(common::ScriptedAuthority::new())
        .store(store.clone())
        .catalog(common::catalog())
        .build()
        .unwrap();

    assert_eq!(manager.verdict().reason, Some(Reason::CorruptPersistence));
    assert_eq!(manager.state(), LoopState::Idle);
    assert!(manager.record().is_none());
    assert!(!store.path().exists());

    let decision = manager.can_access("inventory");
    assert!(!decision.allowed);
    assert_eq!(decision.reason, Some(Reason::CorruptPersistence));

    assert!(manager.start_demo().unwrap().valid);
    assert!(manager.can_access("inventory").allowed);
}

#[test]
fn license_survives_restart_through_encrypted_store() {
    let dir = TempDir::new().unwrap();
    let clock = clock_at(START);
    let authority = common::ScriptedAuthority::new();
    authority.answer(confirmed(&clock, Plan::Premium, Duration::days(90)));

    let first = LicenseManager::builder(common::config())
        .clock(clock.clone())
        .authority(authority.clone())
        .store(Arc::new(file_store(&dir, clock.clone())))
        .catalog(common::catalog())
        .build()
        .unwrap();
    first.activate("tok-42").unwrap();
    drop(first);

    clock.advance(Duration::days(1));
    let second = LicenseManager::builder(common::config())
        .clock(clock.clone())
        .authority(authority)
        .store(Arc::new(file_store(&dir, clock)))
        .catalog(common::catalog())
        .build()
        .unwrap();

    assert_eq!(second.record().map(|r| r.plan), Some(Plan::Premium));
    assert!(second.can_access("analytics").allowed);
}

#[test]
fn explicit_grants_restrict_within_plan() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.authority.answer(CheckResponse {
        active_modules: Some(["inventory".to_string()].into_iter().collect()),
        ..confirmed(&clock, Plan::Premium, Duration::days(90))
    });
    f.manager.activate("tok-42").unwrap();

    assert!(f.manager.can_access("inventory").allowed);
    assert_eq!(f.manager.can_access("billing").reason, Some(Reason::NotGranted));
    assert_eq!(f.manager.can_access("reports").reason, Some(Reason::UnknownModule));
}

#[test]
fn plan_tier_policy_ignores_grants() {
    let clock = clock_at(START);
    let config = TierlockConfig {
        gating: GatingPolicy::PlanTier,
        ..common::config()
    };
    let authority = common::ScriptedAuthority::new();
    authority.answer(CheckResponse {
        active_modules: Some(["inventory".to_string()].into_iter().collect()),
        ..confirmed(&clock, Plan::Full, Duration::days(90))
    });
    let manager = LicenseManager::builder(config)
        .clock(clock.clone())
        .authority(authority)
        .store(Arc::new(tierlock::MemoryStore::new(
            clock,
            std::time::Duration::from_secs(7 * 24 * 60 * 60),
        )))
        .catalog(common::catalog())
        .build()
        .unwrap();
    manager.activate("tok-42").unwrap();

    assert!(manager.can_access("billing").allowed);
    assert_eq!(manager.can_access("analytics").reason, Some(Reason::InsufficientPlan));
}

#[test]
fn demo_then_activation_upgrades() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);

    let verdict = f.manager.start_demo().unwrap();
    assert!(verdict.valid);
    assert!(f.manager.can_access("inventory").allowed);
    assert!(!f.manager.can_access("billing").allowed);
    assert!(f.authority.calls().is_empty());

    f.authority.answer(confirmed(&clock, Plan::Full, Duration::days(365)));
    let outcome = f.manager.activate("tok-42").unwrap();
    assert!(matches!(outcome, CheckOutcome::Online(_)));
    assert!(f.manager.can_access("billing").allowed);
    assert_eq!(f.store.peek().map(|r| r.token), Some("tok-42".to_string()));
}

#[test]
fn demo_expires_after_demo_period() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.manager.start_demo().unwrap();

    clock.advance(Duration::days(7) + Duration::minutes(1));
    assert_eq!(f.manager.verdict().reason, Some(Reason::Expired));
    f.manager.handle_expiry();
    assert_eq!(f.manager.state(), LoopState::Blocked);
    assert!(matches!(f.manager.start_demo(), Err(TierlockError::DemoUnavailable)));
}

#[test]
fn server_rejection_after_confirmation_blocks() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.authority.answer(confirmed(&clock, Plan::Full, Duration::days(90)));
    f.manager.activate("tok-42").unwrap();
    f.observer.take();

    f.authority.answer(CheckResponse {
        valid: false,
        plan: None,
        status: Some(LicenseStatus::Suspended),
        expires_at: None,
        active_modules: None,
    });
    let outcome = f.manager.revalidate();

    assert!(matches!(outcome, CheckOutcome::Blocked(ref v) if v.reason == Some(Reason::Blocked)));
    assert_eq!(f.store.peek().map(|r| r.status), Some(LicenseStatus::Suspended));
    let events = f.observer.take();
    assert!(events.iter().any(|e| e.starts_with("blocked:")));
    assert!(events.contains(&"module:billing:Locked".to_string()));
}

#[test]
fn reset_forgets_license() {
    let clock = clock_at(START);
    let f = fixture(clock.clone(), None);
    f.authority.answer(confirmed(&clock, Plan::Full, Duration::days(90)));
    f.manager.activate("tok-42").unwrap();

    f.manager.reset();

    assert!(f.manager.record().is_none());
    assert!(f.store.peek().is_none());
    assert_eq!(f.manager.verdict().reason, Some(Reason::NoLicense));
    assert!(f.manager.start_demo().is_ok());
}
