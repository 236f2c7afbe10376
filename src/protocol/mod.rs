//! License record model and the license check wire format.

pub mod models;
