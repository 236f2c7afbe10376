//! # Tierlock
//!
//! **Offline-tolerant license gating for modular desktop and service apps.**
//!
//! Tierlock decides, at any moment, which modules of an application a user
//! may use. It combines a locally cached license record with periodic
//! confirmation from a remote license authority, and keeps working when the
//! authority is unreachable until cached trust goes stale.
//!
//! ## Features
//!
//! - **Pure validation**: expiry, status and warning window evaluated without I/O
//! - **Module gating**: plan tiers as a ceiling, explicit grants on top
//! - **Cache fallback**: network failures degrade to cached trust, bounded by a staleness window
//! - **Encrypted persistence**: records sealed with ChaCha20-Poly1305 under a machine-bound key
//! - **Signed responses**: optional Ed25519 verification of authority answers
//! - **Background monitor**: polling, manual refresh and expiry timer on one Tokio task
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tierlock::{LicenseManager, ModuleCatalog, ModuleDescriptor, Monitor, Plan, TierlockConfig};
//!
//! # async fn run() -> Result<(), tierlock::TierlockError> {
//! let config = TierlockConfig::new("myapp", "https://licenses.example.com");
//! let catalog = ModuleCatalog::new([
//!     ModuleDescriptor::new("inventory", Plan::Demo),
//!     ModuleDescriptor::new("billing", Plan::Full),
//!     ModuleDescriptor::new("analytics", Plan::Premium),
//! ]);
//!
//! let manager = Arc::new(LicenseManager::new(config, catalog)?);
//! let monitor = Monitor::start(Arc::clone(&manager));
//!
//! if manager.can_access("billing").allowed {
//!     println!("billing unlocked");
//! }
//!
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Trust Model
//!
//! - The authority is consulted, not trusted blindly: malformed or unsigned
//!   answers count as network failures and fall back to cache
//! - Cached trust expires after `staleness_window` without a confirmation
//! - Stored records are unreadable on another machine
//!
//! Tierlock does **not** prevent binary patching. Client-side licensing can
//! always be bypassed by a determined attacker with access to the binary.
//!
//! See [`TierlockConfig`] for all tunables.

#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/tierlock/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Cache layer
pub mod cache;

// Policy layer
pub mod policy;

// Manager (main public API)
pub mod manager;
pub mod monitor;
pub mod observer;

// Re-exports for public API
pub use cache::{file::EncryptedFileStore, LicenseStore, MemoryStore};
pub use client::{http::HttpAuthority, LicenseAuthority};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::TierlockConfig;
pub use errors::TierlockError;
pub use manager::{CheckOutcome, LicenseManager, LicenseManagerBuilder, LicenseSnapshot, LoopState};
pub use monitor::{Monitor, MonitorHandle};
pub use observer::LicenseObserver;
pub use policy::access::{AccessDecision, GatingPolicy, ModuleCatalog, ModuleDescriptor, ModuleStatus};
pub use policy::{Action, Reason, Verdict};
pub use protocol::models::{CheckResponse, LicenseRecord, LicenseStatus, Plan};
