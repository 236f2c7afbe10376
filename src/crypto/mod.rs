//! Cryptographic primitives: response signatures and machine-bound keys.

pub mod machine_key;
pub mod verify;
