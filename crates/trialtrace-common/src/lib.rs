//! trialtrace-common — Shared error type and the registry-capped HTTP client.

pub mod error;
pub mod sandbox;

pub use error::{Result, TrialTraceError};
pub use sandbox::{RegistryClient, DEFAULT_TIMEOUT};
