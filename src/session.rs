//! Per-execution session state and pipeline orchestration
//!
//! One user action is one pipeline run: build the query, authenticate,
//! optionally fetch reference accounts, run the primary query, optionally
//! aggregate. Every step is sequential and nothing is retried; the first
//! failure aborts the run and is surfaced as-is.

use crate::aggregate::{aggregate_by_account, totals_to_rows};
use crate::auth::{Authenticator, Credentials};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use crate::query::{build_query, unwrap_envelope, QueryExecutor};
use crate::scenario::Scenario;
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

/// Filter applied to the preliminary reference-accounts fetch.
const BANK_ACCOUNTS_FILTER: &str = "Type==\"BANK\"";

/// Immutable UI-facing session state: which scenario is selected, whether a
/// request is in flight, and the current rows. Transitions return a new
/// value instead of mutating shared state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub scenario: Option<Scenario>,
    pub busy: bool,
    pub rows: Option<Vec<Value>>,
}

impl SessionState {
    pub fn with_scenario(self, scenario: Scenario) -> Self {
        // Selecting a scenario clears any previous results.
        Self {
            scenario: Some(scenario),
            busy: false,
            rows: None,
        }
    }

    pub fn with_busy(self, busy: bool) -> Self {
        Self { busy, ..self }
    }

    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        Self {
            rows: Some(rows),
            busy: false,
            ..self
        }
    }

    /// Run the selected scenario and return the state holding its rows.
    /// Refuses to start while a query is already in flight.
    pub async fn execute(
        self,
        gateway: &dyn ApiGateway,
        config: &Config,
        credentials: &Credentials,
        values: &HashMap<String, String>,
    ) -> Result<Self> {
        if self.busy {
            return Err(Error::Other("a query is already in flight".to_string()));
        }
        let scenario = self
            .scenario
            .as_ref()
            .ok_or_else(|| Error::Other("no scenario selected".to_string()))?;
        let rows = execute_scenario(gateway, config, scenario, credentials, values).await?;
        Ok(self.with_rows(rows))
    }
}

/// Run one scenario end to end and return the display rows.
pub async fn execute_scenario(
    gateway: &dyn ApiGateway,
    config: &Config,
    scenario: &Scenario,
    credentials: &Credentials,
    values: &HashMap<String, String>,
) -> Result<Vec<Value>> {
    let params = build_query(scenario, values);

    let token = Authenticator::new(gateway, config)
        .authenticate(credentials)
        .await?;

    let executor = QueryExecutor::new(gateway);

    // Reference accounts come first so the primary result can be reconciled
    // against the full account list; skipped entirely when the scenario does
    // not aggregate.
    let reference_accounts = if scenario.aggregate_by_account {
        match scenario.accounts_endpoint.as_deref() {
            Some(endpoint) if scenario.fetch_all_accounts => {
                let envelope = executor
                    .execute(
                        &token,
                        endpoint,
                        &[("where".to_string(), BANK_ACCOUNTS_FILTER.to_string())],
                    )
                    .await?;
                unwrap_envelope(&envelope)
            }
            _ => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let envelope = executor.execute(&token, &scenario.endpoint, &params).await?;
    let rows = unwrap_envelope(&envelope);
    info!(scenario = %scenario.id, rows = rows.len(), "query complete");

    if scenario.aggregate_by_account {
        let totals = aggregate_by_account(&reference_accounts, &rows);
        Ok(totals_to_rows(&totals, &config.currency, &config.locale))
    } else {
        Ok(rows)
    }
}
