//! Query construction and execution against the Xero API

pub mod builder;
pub mod executor;

pub use builder::{build_query, build_query_at, QueryParams};
pub use executor::{first_array_property, unwrap_envelope, QueryExecutor, ERROR_LIST_KEY};
