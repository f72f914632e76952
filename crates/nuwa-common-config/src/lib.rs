//! Configuration for CyberNuwa clients.
//!
//! Provides the `.nuwa/config.yaml` types with per-environment presets,
//! `NUWA_*` environment overrides, and the client-local preference store.

pub mod env;
pub mod loader;
pub mod store;
pub mod types;

pub use env::*;
pub use loader::*;
pub use store::{LocalStore, StoreError};
pub use types::*;
