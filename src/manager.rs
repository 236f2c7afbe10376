//! License Manager - the main public API for Tierlock.
//!
//! The `LicenseManager` owns the current license record and provides:
//! - One-shot revalidation against the license authority
//! - Offline fallback to cached trust, bounded by the staleness window
//! - Module access decisions answered from the committed in-memory state
//! - Demo bootstrap, activation, manual refresh and reset
//!
//! Timers live in [`crate::monitor`]; everything here is synchronous.

use crate::cache::file::EncryptedFileStore;
use crate::cache::LicenseStore;
use crate::client::http::HttpAuthority;
use crate::client::LicenseAuthority;
use crate::clock::{Clock, SystemClock};
use crate::config::TierlockConfig;
use crate::crypto::machine_key::machine_fingerprint;
use crate::observer::{LicenseObserver, Notifications};
use crate::policy::access::{
    diff_statuses, module_statuses, resolve_access, AccessDecision, ModuleCatalog, ModuleStatus,
};
use crate::policy::freshness::evaluate;
use crate::policy::{Action, Reason, Verdict};
use crate::protocol::models::{CheckResponse, LicenseRecord, Plan};
use crate::TierlockError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// States of the revalidation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    /// Waiting for the next check; the last answer came from the authority.
    Idle,
    /// A remote check is in flight.
    Checking,
    /// The authority was unreachable; operating on cached trust.
    CacheFallback,
    /// Access revoked until a manual refresh or activation succeeds.
    Blocked,
}

/// Result of one revalidation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The authority confirmed the license.
    Online(Verdict),
    /// The authority was unreachable and cached trust still holds.
    Offline(Verdict),
    /// Access is revoked.
    Blocked(Verdict),
    /// Another check was already in flight; nothing was done.
    Skipped,
    /// The license was reset or replaced while the check was in flight;
    /// its result was discarded.
    Superseded,
}

impl CheckOutcome {
    fn from_commit(state: LoopState, verdict: Verdict) -> Self {
        match state {
            LoopState::CacheFallback => CheckOutcome::Offline(verdict),
            LoopState::Blocked => CheckOutcome::Blocked(verdict),
            LoopState::Idle | LoopState::Checking => CheckOutcome::Online(verdict),
        }
    }

    /// The verdict, when the check completed.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            CheckOutcome::Online(v) | CheckOutcome::Offline(v) | CheckOutcome::Blocked(v) => Some(v),
            CheckOutcome::Skipped | CheckOutcome::Superseded => None,
        }
    }
}

/// Point-in-time view of the manager for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseSnapshot {
    /// Loop state.
    pub state: LoopState,
    /// Whether decisions currently rest on cached trust.
    pub offline: bool,
    /// Current verdict.
    pub verdict: Verdict,
    /// Plan of the loaded license.
    pub plan: Option<Plan>,
    /// Expiry of the loaded license.
    pub expires_at: Option<DateTime<Utc>>,
    /// Last remote confirmation of the loaded license.
    pub last_validated_at: Option<DateTime<Utc>>,
    /// Status of every catalog module.
    pub modules: BTreeMap<String, ModuleStatus>,
}

/// How much to tell observers about a commit.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Announce {
    /// Module transitions only.
    Quiet,
    /// Module transitions plus valid/warning/blocked callbacks.
    Checked,
}

struct Update {
    record: Option<LicenseRecord>,
    state: LoopState,
    block: Option<Verdict>,
    persist: bool,
}

struct Inner {
    record: Option<LicenseRecord>,
    /// Token to present on the next check (set by activation).
    token: Option<String>,
    state: LoopState,
    /// Verdict overriding local evaluation: the one that moved the loop
    /// into `Blocked`, or the report of a discarded corrupt store.
    block: Option<Verdict>,
    /// Last announced module statuses.
    modules: BTreeMap<String, ModuleStatus>,
    /// Bumped by reset/activation/demo so in-flight results can be discarded.
    /// Only changed while `store_lock` is held.
    generation: u64,
    /// A token arrived while a check was in flight and has not been
    /// presented yet.
    pending_activation: bool,
}

/// Clears the in-flight flag when a check finishes.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builder for [`LicenseManager`]. Collaborators left unset get their
/// production implementation.
pub struct LicenseManagerBuilder {
    config: TierlockConfig,
    clock: Option<Arc<dyn Clock>>,
    authority: Option<Arc<dyn LicenseAuthority>>,
    store: Option<Arc<dyn LicenseStore>>,
    catalog: ModuleCatalog,
    observers: Vec<Arc<dyn LicenseObserver>>,
}

impl LicenseManagerBuilder {
    /// Use a custom clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom license authority.
    pub fn authority(mut self, authority: Arc<dyn LicenseAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Use a custom store.
    pub fn store(mut self, store: Arc<dyn LicenseStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the module catalog.
    pub fn catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Register an observer.
    pub fn observer(mut self, observer: Arc<dyn LicenseObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the manager and load any stored license.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The default HTTP authority cannot be configured
    /// - The default store directory cannot be created
    pub fn build(self) -> Result<LicenseManager, TierlockError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let authority = match self.authority {
            Some(authority) => authority,
            None => Arc::new(HttpAuthority::new(&self.config)?),
        };
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(EncryptedFileStore::new(
                self.config.store_namespace,
                Arc::clone(&clock),
                self.config.staleness_window,
            )?),
        };
        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(machine_fingerprint);
        let (expiry_tx, _) = watch::channel(None);

        let manager = LicenseManager {
            config: self.config,
            client_id,
            clock,
            authority,
            store,
            catalog: self.catalog,
            observers: self.observers,
            inner: RwLock::new(Inner {
                record: None,
                token: None,
                state: LoopState::Idle,
                block: None,
                modules: BTreeMap::new(),
                generation: 0,
                pending_activation: false,
            }),
            store_lock: Mutex::new(()),
            in_flight: AtomicBool::new(false),
            expiry_tx,
        };
        manager.load_cached();
        Ok(manager)
    }
}

/// Main license manager for Tierlock.
///
/// Create one instance per application and share it (usually in an `Arc`)
/// between the UI and the [`crate::monitor::Monitor`].
pub struct LicenseManager {
    config: TierlockConfig,
    client_id: String,
    clock: Arc<dyn Clock>,
    authority: Arc<dyn LicenseAuthority>,
    store: Arc<dyn LicenseStore>,
    catalog: ModuleCatalog,
    observers: Vec<Arc<dyn LicenseObserver>>,
    inner: RwLock<Inner>,
    /// Serializes store I/O and generation changes. Always taken before
    /// `inner`, never while holding it.
    store_lock: Mutex<()>,
    in_flight: AtomicBool,
    expiry_tx: watch::Sender<Option<DateTime<Utc>>>,
}

impl LicenseManager {
    /// Create a manager with the production authority, store and clock.
    pub fn new(config: TierlockConfig, catalog: ModuleCatalog) -> Result<Self, TierlockError> {
        Self::builder(config).catalog(catalog).build()
    }

    /// Start building a manager.
    pub fn builder(config: TierlockConfig) -> LicenseManagerBuilder {
        LicenseManagerBuilder {
            config,
            clock: None,
            authority: None,
            store: None,
            catalog: ModuleCatalog::default(),
            observers: Vec::new(),
        }
    }

    // ----- access decisions -------------------------------------------------

    /// Decide whether a module may be used right now.
    ///
    /// Answers from the committed in-memory record; never waits on an
    /// in-flight check.
    pub fn can_access(&self, module_id: &str) -> AccessDecision {
        let now = self.clock.now_utc();
        let inner = self.read();
        let verdict = self.effective_verdict(&inner, now);
        resolve_access(
            inner.record.as_ref(),
            &verdict,
            module_id,
            &self.catalog,
            self.config.gating,
        )
    }

    /// Current verdict for the loaded license.
    pub fn verdict(&self) -> Verdict {
        let now = self.clock.now_utc();
        self.effective_verdict(&self.read(), now)
    }

    /// Status of every catalog module right now.
    pub fn module_statuses(&self) -> BTreeMap<String, ModuleStatus> {
        let now = self.clock.now_utc();
        let inner = self.read();
        let verdict = self.effective_verdict(&inner, now);
        module_statuses(inner.record.as_ref(), &verdict, &self.catalog, self.config.gating)
    }

    /// Snapshot for status displays.
    pub fn snapshot(&self) -> LicenseSnapshot {
        let now = self.clock.now_utc();
        let inner = self.read();
        let verdict = self.effective_verdict(&inner, now);
        let record = inner.record.as_ref();
        LicenseSnapshot {
            state: inner.state,
            offline: inner.state == LoopState::CacheFallback,
            modules: module_statuses(record, &verdict, &self.catalog, self.config.gating),
            verdict,
            plan: record.map(|r| r.plan),
            expires_at: record.map(|r| r.expires_at),
            last_validated_at: record.map(|r| r.last_validated_at),
        }
    }

    /// Loop state.
    pub fn state(&self) -> LoopState {
        self.read().state
    }

    /// Whether a revalidation cycle is running right now.
    pub fn check_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether decisions currently rest on cached trust.
    pub fn is_offline(&self) -> bool {
        self.state() == LoopState::CacheFallback
    }

    /// The loaded license record, if any.
    pub fn record(&self) -> Option<LicenseRecord> {
        self.read().record.clone()
    }

    /// Installation identifier sent to the authority.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The configuration.
    pub fn config(&self) -> &TierlockConfig {
        &self.config
    }

    /// The clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Expiry of the currently valid license, updated on every change.
    /// `None` while no valid license is loaded.
    pub fn subscribe_expiry(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.expiry_tx.subscribe()
    }

    // ----- lifecycle --------------------------------------------------------

    /// Load the stored license into memory without contacting the authority.
    ///
    /// A corrupt store is cleared and no license is loaded; the verdict
    /// reports [`Reason::CorruptPersistence`] until the next check. A stored
    /// license that no longer validates puts the loop into `Blocked`.
    pub fn load_cached(&self) -> Verdict {
        let (record, corrupt) = match self.load_from_store() {
            Ok(record) => (record, None),
            Err(corrupt) => (None, Some(corrupt)),
        };
        let now = self.clock.now_utc();
        let verdict = evaluate(
            record.as_ref(),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );

        let (state, block) = match &record {
            Some(_) if !verdict.valid => (LoopState::Blocked, Some(verdict)),
            _ => (LoopState::Idle, corrupt),
        };
        let generation = self.read().generation;
        self.commit(
            generation,
            Update {
                record,
                state,
                block,
                persist: false,
            },
            Announce::Quiet,
        )
        .map(|(_, verdict)| verdict)
        .unwrap_or_else(|| self.verdict())
    }

    /// Run one revalidation cycle against the authority.
    ///
    /// Blocks for at most the request timeout, twice that when an
    /// activation lands mid-check. If another cycle is already running,
    /// returns [`CheckOutcome::Skipped`] immediately.
    #[instrument(skip_all, fields(app = self.config.app_name))]
    pub fn revalidate(&self) -> CheckOutcome {
        let mut outcome = CheckOutcome::Skipped;
        loop {
            let Some(guard) = self.try_begin() else {
                if outcome == CheckOutcome::Skipped {
                    debug!("revalidation already in flight, skipping");
                }
                return outcome;
            };
            outcome = self.run_cycle();
            drop(guard);

            // An activation that arrived mid-check was skipped; present its
            // token now.
            if !self.read().pending_activation {
                return outcome;
            }
            debug!("license token changed during check, checking again");
        }
    }

    fn run_cycle(&self) -> CheckOutcome {
        let (token, previous, generation) = {
            let mut inner = self.write();
            inner.state = LoopState::Checking;
            inner.pending_activation = false;
            let token = inner
                .token
                .clone()
                .or_else(|| inner.record.as_ref().map(|r| r.token.clone()));
            (token, inner.record.clone(), inner.generation)
        };

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return self.settle_locally(previous, generation);
        };

        match self.authority.check(&self.client_id, &token) {
            Ok(response) => self.apply_response(response, &token, previous.as_ref(), generation),
            Err(error) => self.fall_back(error, &token, previous, generation),
        }
    }

    /// Manual refresh: an immediate out-of-cycle revalidation.
    /// Also the way out of `Blocked`.
    pub fn refresh(&self) -> CheckOutcome {
        info!("manual license refresh requested");
        self.revalidate()
    }

    /// Enter a license token and check it with the authority.
    ///
    /// If a check is already in flight this returns
    /// [`CheckOutcome::Skipped`]: the in-flight result is discarded and that
    /// cycle checks again with the new token before it returns.
    pub fn activate(&self, token: &str) -> Result<CheckOutcome, TierlockError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TierlockError::MissingToken);
        }

        {
            let _store = self.store_guard();
            let mut inner = self.write();
            inner.generation += 1;
            inner.token = Some(token.to_string());
            inner.pending_activation = true;
        }
        info!("activating license token");
        Ok(self.revalidate())
    }

    /// Bootstrap a local demo license when none is loaded.
    pub fn start_demo(&self) -> Result<Verdict, TierlockError> {
        let now = self.clock.now_utc();
        let period = chrono::Duration::from_std(self.config.demo_period)
            .map_err(|e| TierlockError::ConfigError(format!("demo_period out of range: {}", e)))?;

        let generation = {
            let _store = self.store_guard();
            let mut inner = self.write();
            if inner.record.is_some() {
                return Err(TierlockError::DemoUnavailable);
            }
            inner.generation += 1;
            inner.generation
        };

        info!(days = period.num_days(), "starting demo license");
        let record = LicenseRecord::demo(self.client_id.clone(), now, period);
        self.commit(
            generation,
            Update {
                record: Some(record),
                state: LoopState::Idle,
                block: None,
                persist: true,
            },
            Announce::Checked,
        )
        .map(|(_, verdict)| verdict)
        .ok_or(TierlockError::DemoUnavailable)
    }

    /// Local re-check when the expiry timer fires. Never touches the network.
    ///
    /// Forces `Blocked` if the license no longer validates.
    pub fn handle_expiry(&self) -> Verdict {
        let now = self.clock.now_utc();
        let (record, generation, already_blocked) = {
            let inner = self.read();
            (
                inner.record.clone(),
                inner.generation,
                inner.state == LoopState::Blocked,
            )
        };

        let verdict = evaluate(
            record.as_ref(),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );
        if verdict.valid || already_blocked {
            return verdict;
        }

        info!(reason = ?verdict.reason, "license lapsed, blocking modules");
        self.commit(
            generation,
            Update {
                record,
                state: LoopState::Blocked,
                block: Some(verdict.clone()),
                persist: false,
            },
            Announce::Checked,
        );
        verdict
    }

    /// Forget the license: clear the store and return to `Idle` with no
    /// license loaded.
    pub fn reset(&self) {
        let now = self.clock.now_utc();
        let store = self.store_guard();
        let changes = {
            let mut inner = self.write();
            inner.generation += 1;
            inner.record = None;
            inner.token = None;
            inner.pending_activation = false;
            inner.state = LoopState::Idle;
            inner.block = None;
            self.refresh_modules(&mut inner, now).1
        };
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear license store");
        }
        drop(store);
        info!("license state reset");

        let mut notes = Notifications::default();
        notes.modules(changes);
        notes.deliver(&self.observers);
    }

    // ----- internals --------------------------------------------------------

    fn apply_response(
        &self,
        response: CheckResponse,
        token: &str,
        previous: Option<&LicenseRecord>,
        generation: u64,
    ) -> CheckOutcome {
        let now = self.clock.now_utc();
        let record = match response.into_record(&self.client_id, token, previous, now) {
            Ok(record) => record,
            Err(error) => return self.fall_back(error, token, previous.cloned(), generation),
        };

        let verdict = evaluate(
            Some(&record),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );
        let update = if verdict.valid {
            debug!(plan = %record.plan, "license confirmed");
            Update {
                record: Some(record),
                state: LoopState::Idle,
                block: None,
                persist: true,
            }
        } else {
            warn!(reason = ?verdict.reason, "license rejected by authority");
            Update {
                record: Some(record),
                state: LoopState::Blocked,
                block: Some(verdict),
                persist: true,
            }
        };

        self.commit(generation, update, Announce::Checked)
            .map(|(state, verdict)| CheckOutcome::from_commit(state, verdict))
            .unwrap_or(CheckOutcome::Superseded)
    }

    fn fall_back(
        &self,
        error: TierlockError,
        token: &str,
        previous: Option<LicenseRecord>,
        generation: u64,
    ) -> CheckOutcome {
        warn!(
            error = %error,
            network = error.is_network_failure(),
            "license authority unavailable, using cached license"
        );

        let mut corrupt = None;
        let cached = match previous.filter(|r| r.token == token) {
            Some(record) => Some(record),
            None => match self.load_from_store() {
                Ok(stored) => stored.filter(|r| r.token == token),
                Err(verdict) => {
                    corrupt = Some(verdict);
                    None
                }
            },
        };

        let now = self.clock.now_utc();
        let verdict = evaluate(
            cached.as_ref(),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );

        let update = if verdict.valid {
            Update {
                record: cached,
                state: LoopState::CacheFallback,
                block: None,
                persist: false,
            }
        } else {
            let block = match (verdict.reason, corrupt) {
                (Some(Reason::NoLicense), Some(corrupt)) => corrupt,
                (Some(Reason::NoLicense), None) => Verdict::block(
                    Reason::NoLicense,
                    "License server unreachable and no cached license is available. Check your connection and refresh.",
                ),
                _ => verdict,
            };
            Update {
                record: cached,
                state: LoopState::Blocked,
                block: Some(block),
                persist: false,
            }
        };

        self.commit(generation, update, Announce::Checked)
            .map(|(state, verdict)| CheckOutcome::from_commit(state, verdict))
            .unwrap_or(CheckOutcome::Superseded)
    }

    /// No token to present: only a local demo license can be evaluated.
    fn settle_locally(&self, previous: Option<LicenseRecord>, generation: u64) -> CheckOutcome {
        let now = self.clock.now_utc();
        let record = previous.filter(LicenseRecord::is_demo);
        let verdict = evaluate(
            record.as_ref(),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );

        let update = Update {
            state: if verdict.valid {
                LoopState::Idle
            } else {
                LoopState::Blocked
            },
            block: (!verdict.valid).then_some(verdict),
            record,
            persist: false,
        };

        self.commit(generation, update, Announce::Checked)
            .map(|(state, verdict)| CheckOutcome::from_commit(state, verdict))
            .unwrap_or(CheckOutcome::Superseded)
    }

    /// Commit a new state and notify observers once the lock is released.
    ///
    /// Returns `None` when `generation` is outdated (reset or activation
    /// happened meanwhile); nothing is applied then.
    fn commit(
        &self,
        generation: u64,
        update: Update,
        announce: Announce,
    ) -> Option<(LoopState, Verdict)> {
        let store = self.store_guard();
        if self.read().generation != generation {
            debug!("discarding superseded license result");
            return None;
        }

        // Readers keep answering from the previous state while this runs.
        if update.persist {
            if let Some(record) = &update.record {
                if let Err(e) = self.store.save(record) {
                    warn!(error = %e, "failed to persist license");
                }
            }
        }

        let now = self.clock.now_utc();
        let mut notes = Notifications::default();
        let (state, verdict) = {
            let mut inner = self.write();
            if let Some(record) = &update.record {
                inner.token = Some(record.token.clone());
            }
            inner.record = update.record;
            inner.state = update.state;
            inner.block = update.block;

            let (verdict, changes) = self.refresh_modules(&mut inner, now);
            notes.modules(changes);

            if announce == Announce::Checked {
                match inner.state {
                    LoopState::Blocked => notes.blocked(verdict.message.clone()),
                    LoopState::Idle if verdict.valid => {
                        if let Some(record) = &inner.record {
                            notes.valid(record.clone());
                        }
                    }
                    _ => {}
                }
                if verdict.action == Action::Warn {
                    notes.warning(verdict.message.clone());
                }
            }

            (inner.state, verdict)
        };
        drop(store);

        notes.deliver(&self.observers);
        Some((state, verdict))
    }

    /// Recompute module statuses and the published expiry. Returns the
    /// verdict and the module transitions since the last announcement.
    fn refresh_modules(
        &self,
        inner: &mut Inner,
        now: DateTime<Utc>,
    ) -> (Verdict, Vec<(String, ModuleStatus)>) {
        let verdict = self.effective_verdict(inner, now);
        let modules = module_statuses(
            inner.record.as_ref(),
            &verdict,
            &self.catalog,
            self.config.gating,
        );
        let changes = diff_statuses(&inner.modules, &modules);
        inner.modules = modules;

        let expiry = inner
            .record
            .as_ref()
            .filter(|_| verdict.valid)
            .map(|r| r.expires_at);
        self.expiry_tx.send_if_modified(|current| {
            if *current == expiry {
                false
            } else {
                *current = expiry;
                true
            }
        });

        (verdict, changes)
    }

    fn effective_verdict(&self, inner: &Inner, now: DateTime<Utc>) -> Verdict {
        if let Some(block) = &inner.block {
            return block.clone();
        }
        let verdict = evaluate(
            inner.record.as_ref(),
            now,
            self.config.warning_window,
            self.config.staleness_window,
        );
        if inner.state == LoopState::CacheFallback && verdict.reason.is_none() {
            return Verdict::offline();
        }
        verdict
    }

    /// Read the stored license. A corrupt store is cleared and reported
    /// as a [`Reason::CorruptPersistence`] verdict.
    fn load_from_store(&self) -> Result<Option<LicenseRecord>, Verdict> {
        let _store = self.store_guard();
        match self.store.load() {
            Ok(record) => Ok(record),
            Err(TierlockError::StoreCorrupt(detail)) => {
                warn!(%detail, "stored license is corrupt, discarding");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear corrupt license store");
                }
                Err(Verdict::block(
                    Reason::CorruptPersistence,
                    "Stored license could not be read and was discarded. Activate a license key or start a demo.",
                ))
            }
            Err(e) => {
                warn!(error = %e, "failed to load stored license");
                Ok(None)
            }
        }
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn store_guard(&self) -> MutexGuard<'_, ()> {
        self.store_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
