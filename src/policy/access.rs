//! Module gating: which feature modules a license unlocks.
//!
//! Access is granted only when:
//! - the license validates (not absent, blocked, expired or stale)
//! - the module is in the catalog
//! - the license plan is at or above the module's required plan
//! - under [`GatingPolicy::ActiveModules`], the module is explicitly granted

use crate::policy::validate::{validate, Reason, Verdict};
use crate::protocol::models::{LicenseRecord, Plan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which grant source is authoritative for module gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingPolicy {
    /// `active_modules` is authoritative; the plan acts as a ceiling.
    /// An empty grant list falls back to the plan tier (demo default).
    #[default]
    ActiveModules,
    /// Plan tier comparison only; `active_modules` is ignored.
    PlanTier,
}

/// A feature module known to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module identifier.
    pub id: String,
    /// Minimum plan tier needed.
    pub required_plan: Plan,
}

impl ModuleDescriptor {
    /// Create a descriptor.
    pub fn new(id: impl Into<String>, required_plan: Plan) -> Self {
        Self {
            id: id.into(),
            required_plan,
        }
    }
}

/// The set of modules the host application can gate.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleCatalog {
    /// Build a catalog. Later duplicates replace earlier ones.
    pub fn new(modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        Self {
            modules: modules.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }

    /// Look a module up by id.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(id)
    }

    /// Iterate modules in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Per-module status, derived every time the license changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// Not reachable under the current license.
    Locked,
    /// Reachable.
    Unlocked,
    /// Not reachable because the license ran out (or went stale).
    Expired,
}

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether the module may be used.
    pub allowed: bool,
    /// Why access was refused.
    pub reason: Option<Reason>,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: Reason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Decide access for one module against an already computed verdict.
pub fn resolve_access(
    license: Option<&LicenseRecord>,
    verdict: &Verdict,
    module_id: &str,
    catalog: &ModuleCatalog,
    policy: GatingPolicy,
) -> AccessDecision {
    // 1. License must be valid
    let Some(license) = license.filter(|_| verdict.valid) else {
        return AccessDecision::deny(verdict.reason.unwrap_or(Reason::NoLicense));
    };

    // 2. Module must be known
    let Some(module) = catalog.get(module_id) else {
        return AccessDecision::deny(Reason::UnknownModule);
    };

    // 3. Plan ceiling
    if module.required_plan > license.plan {
        return AccessDecision::deny(Reason::InsufficientPlan);
    }

    // 4. Explicit grants
    if policy == GatingPolicy::ActiveModules
        && !license.active_modules.is_empty()
        && !license.active_modules.contains(module_id)
    {
        return AccessDecision::deny(Reason::NotGranted);
    }

    AccessDecision::allow()
}

/// Decide access for one module, validating the license at `now`.
pub fn can_access(
    license: Option<&LicenseRecord>,
    module_id: &str,
    catalog: &ModuleCatalog,
    policy: GatingPolicy,
    now: DateTime<Utc>,
    warning_window: Duration,
) -> AccessDecision {
    let verdict = validate(license, now, warning_window);
    resolve_access(license, &verdict, module_id, catalog, policy)
}

/// Status of every catalog module under a verdict.
pub fn module_statuses(
    license: Option<&LicenseRecord>,
    verdict: &Verdict,
    catalog: &ModuleCatalog,
    policy: GatingPolicy,
) -> BTreeMap<String, ModuleStatus> {
    let lapsed = matches!(verdict.reason, Some(Reason::Expired | Reason::StaleCache));

    catalog
        .iter()
        .map(|module| {
            let status = if resolve_access(license, verdict, &module.id, catalog, policy).allowed {
                ModuleStatus::Unlocked
            } else if lapsed {
                ModuleStatus::Expired
            } else {
                ModuleStatus::Locked
            };
            (module.id.clone(), status)
        })
        .collect()
}

/// Modules whose status differs between two snapshots, with the new status.
pub fn diff_statuses(
    old: &BTreeMap<String, ModuleStatus>,
    new: &BTreeMap<String, ModuleStatus>,
) -> Vec<(String, ModuleStatus)> {
    new.iter()
        .filter(|(id, status)| old.get(*id) != Some(*status))
        .map(|(id, status)| (id.clone(), *status))
        .collect()
}
