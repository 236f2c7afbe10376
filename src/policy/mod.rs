//! License policy: validation, cached-trust freshness and module gating.

pub mod access;
pub mod freshness;
pub mod validate;

pub use validate::{Action, Reason, Verdict};
