//! Shared fakes for integration tests.

#![allow(dead_code)]

use chrono::Duration;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tierlock::{
    CheckResponse, Clock, LicenseAuthority, LicenseManager, LicenseObserver, LicenseRecord,
    LicenseStatus, LicenseStore, MemoryStore, MockClock, ModuleCatalog, ModuleDescriptor,
    ModuleStatus, Plan, TierlockConfig, TierlockError,
};

/// Mock clock frozen at `rfc3339`, shared with the manager under test.
pub fn clock_at(rfc3339: &str) -> Arc<MockClock> {
    Arc::new(MockClock::from_rfc3339(rfc3339).unwrap())
}

/// Authority answering from a script. Once the script is exhausted every
/// call fails like a timed out request.
#[derive(Default)]
pub struct ScriptedAuthority {
    answers: Mutex<VecDeque<Result<CheckResponse, TierlockError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedAuthority {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, response: CheckResponse) {
        self.answers.lock().unwrap().push_back(Ok(response));
    }

    pub fn fail(&self, error: TierlockError) {
        self.answers.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl LicenseAuthority for ScriptedAuthority {
    fn check(&self, client_id: &str, token: &str) -> Result<CheckResponse, TierlockError> {
        self.calls
            .lock()
            .unwrap()
            .push((client_id.to_string(), token.to_string()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TierlockError::Transport("operation timed out".into())))
    }
}

/// Observer recording every callback as a short string.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl LicenseObserver for RecordingObserver {
    fn on_valid(&self, record: &LicenseRecord) {
        self.push(format!("valid:{}", record.plan));
    }

    fn on_warning(&self, message: &str) {
        self.push(format!("warning:{}", message));
    }

    fn on_blocked(&self, message: &str) {
        self.push(format!("blocked:{}", message));
    }

    fn on_module_changed(&self, module_id: &str, status: ModuleStatus) {
        self.push(format!("module:{}:{:?}", module_id, status));
    }
}

pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new([
        ModuleDescriptor::new("inventory", Plan::Demo),
        ModuleDescriptor::new("billing", Plan::Full),
        ModuleDescriptor::new("analytics", Plan::Premium),
    ])
}

pub fn config() -> TierlockConfig {
    TierlockConfig {
        client_id: Some("client-42".into()),
        ..TierlockConfig::new("scenario-app", "https://licenses.example.com")
    }
}

pub fn record(
    clock: &MockClock,
    plan: Plan,
    status: LicenseStatus,
    expires_in: Duration,
) -> LicenseRecord {
    let now = clock.now_utc();
    LicenseRecord {
        client_id: "client-42".into(),
        token: "tok-42".into(),
        plan,
        status,
        expires_at: now + expires_in,
        active_modules: Default::default(),
        last_validated_at: now,
    }
}

pub fn confirmed(clock: &MockClock, plan: Plan, expires_in: Duration) -> CheckResponse {
    CheckResponse {
        valid: true,
        plan: Some(plan),
        status: Some(LicenseStatus::Active),
        expires_at: Some(clock.now_utc() + expires_in),
        active_modules: None,
    }
}

pub struct Fixture {
    pub manager: LicenseManager,
    pub clock: Arc<MockClock>,
    pub authority: Arc<ScriptedAuthority>,
    pub store: Arc<MemoryStore>,
    pub observer: Arc<RecordingObserver>,
}

/// Manager over an in-memory store, optionally seeded with a record.
pub fn fixture(clock: Arc<MockClock>, seed: Option<LicenseRecord>) -> Fixture {
    let config = config();
    let store = Arc::new(MemoryStore::new(clock.clone(), config.staleness_window));
    if let Some(record) = seed {
        store.save(&record).unwrap();
    }
    let authority = ScriptedAuthority::new();
    let observer = RecordingObserver::new();
    let manager = LicenseManager::builder(config)
        .clock(clock.clone())
        .authority(authority.clone())
        .store(store.clone())
        .catalog(catalog())
        .observer(observer.clone())
        .build()
        .unwrap();
    observer.take();

    Fixture {
        manager,
        clock,
        authority,
        store,
        observer,
    }
}
