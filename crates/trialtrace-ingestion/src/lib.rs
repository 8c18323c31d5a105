//! trialtrace-ingestion — Trial retrieval and milestone-date reconciliation.
//!
//! - Registry search (one summary per trial)
//! - Source adapters (structured API fields, current detail page,
//!   first-version history page)
//! - Field label classification (estimated / actual / unknown)
//! - Date reconciliation into one complete record per trial
//! - Sequential batch pipeline

pub mod classify;
pub mod dates;
pub mod models;
pub mod pipeline;
pub mod reconcile;
pub mod sources;
