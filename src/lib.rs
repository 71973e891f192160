//! # xeroq
//!
//! Scenario-driven query tool for the Xero accounting API. Supply Custom
//! Connection credentials, pick a predefined query scenario, execute it, and
//! view or export the tabular result.
//!
//! ## Modules
//!
//! - `gateway` - Trait-based HTTP seam so the pipeline is testable offline
//! - `scenario` - Static scenario catalog loaded once at startup
//! - `auth` - Client-credentials token grant and tenant resolution
//! - `query` - Parameter translation and authenticated query execution
//! - `aggregate` - Per-account count/balance aggregation
//! - `present` - Sortable table views, cell formatting, CSV export
//! - `session` - Per-execution state and the end-to-end pipeline
//! - `server` - JSON API in front of the pipeline

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod present;
pub mod query;
pub mod scenario;
pub mod server;
pub mod session;

pub use error::{Error, Result};
