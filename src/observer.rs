//! UI notification callbacks.
//!
//! Observers are registered once when the manager is built and called
//! synchronously after each state change has been committed. They must
//! return quickly and must not call back into blocking manager operations
//! (`refresh`, `activate`).

use crate::policy::access::ModuleStatus;
use crate::protocol::models::LicenseRecord;

/// Receives license lifecycle notifications. All methods default to no-ops.
pub trait LicenseObserver: Send + Sync {
    /// The authority confirmed a valid license.
    fn on_valid(&self, _record: &LicenseRecord) {}

    /// Non-blocking notice, e.g. the license expires soon.
    fn on_warning(&self, _message: &str) {}

    /// Module access was revoked; the message says what to do about it.
    fn on_blocked(&self, _message: &str) {}

    /// A module switched between locked, unlocked and expired.
    fn on_module_changed(&self, _module_id: &str, _status: ModuleStatus) {}
}

/// Notifications collected while state is locked, delivered after release.
#[derive(Debug, Default)]
pub(crate) struct Notifications {
    valid: Option<LicenseRecord>,
    warning: Option<String>,
    blocked: Option<String>,
    modules: Vec<(String, ModuleStatus)>,
}

impl Notifications {
    pub(crate) fn valid(&mut self, record: LicenseRecord) {
        self.valid = Some(record);
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        self.warning = Some(message.into());
    }

    pub(crate) fn blocked(&mut self, message: impl Into<String>) {
        self.blocked = Some(message.into());
    }

    pub(crate) fn modules(&mut self, changes: Vec<(String, ModuleStatus)>) {
        self.modules = changes;
    }

    pub(crate) fn deliver(self, observers: &[std::sync::Arc<dyn LicenseObserver>]) {
        for observer in observers {
            if let Some(record) = &self.valid {
                observer.on_valid(record);
            }
            if let Some(message) = &self.warning {
                observer.on_warning(message);
            }
            if let Some(message) = &self.blocked {
                observer.on_blocked(message);
            }
            for (id, status) in &self.modules {
                observer.on_module_changed(id, *status);
            }
        }
    }
}
