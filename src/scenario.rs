//! Scenario catalog
//!
//! Scenarios are predefined query definitions loaded once at startup from a
//! static JSON document and treated as read-only for the rest of the
//! session.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Text,
    Date,
    Select,
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Fixed literal for hidden parameters, applied unconditionally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::GET
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub parameters: Vec<ScenarioParameter>,
    /// Preferred column order for table rendering; discovery order is used
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_fields: Option<Vec<String>>,
    #[serde(default)]
    pub aggregate_by_account: bool,
    #[serde(default)]
    pub fetch_all_accounts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts_endpoint: Option<String>,
}

impl Scenario {
    /// Whether the preliminary reference-accounts fetch should run. When the
    /// flags are inconsistent, aggregation degrades to observed accounts
    /// only rather than failing.
    pub fn wants_reference_accounts(&self) -> bool {
        self.fetch_all_accounts && self.accounts_endpoint.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    scenarios: Vec<Scenario>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> = serde_json::from_str(json)?;
        Self::validate(&scenarios)?;
        Ok(Self { scenarios })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(scenarios: &[Scenario]) -> Result<()> {
        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.id.as_str()) {
                return Err(Error::Catalog(format!(
                    "duplicate scenario id: {}",
                    scenario.id
                )));
            }
            if scenario.aggregate_by_account && !scenario.wants_reference_accounts() {
                warn!(
                    scenario = %scenario.id,
                    "aggregateByAccount set without fetchAllAccounts/accountsEndpoint; \
                     aggregation will cover observed accounts only"
                );
            }
        }
        Ok(())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn find(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}
