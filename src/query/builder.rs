//! Scenario parameter to query-string translation
//!
//! Parameters are walked in the scenario's declared order and folded into a
//! flat list of query-string pairs. Date-flavored parameters collapse into a
//! single accumulating `where` filter expression, so declaration order
//! determines the final clause order.

use crate::scenario::{ParameterKind, Scenario};
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;

/// Ordered query-string pairs. Order is preserved so `where` accumulation
/// stays deterministic and URLs render reproducibly.
pub type QueryParams = Vec<(String, String)>;

const WHERE_KEY: &str = "where";
const DEFAULT_TRAILING_DAYS: i64 = 30;

/// Build query pairs for a scenario using today's UTC date for trailing
/// date-range arithmetic.
pub fn build_query(scenario: &Scenario, values: &HashMap<String, String>) -> QueryParams {
    build_query_at(scenario, values, Utc::now().date_naive())
}

/// Build query pairs with an explicit "today", so date-range translation is
/// testable independent of the wall clock.
pub fn build_query_at(
    scenario: &Scenario,
    values: &HashMap<String, String>,
    today: NaiveDate,
) -> QueryParams {
    let mut params: QueryParams = Vec::new();

    for spec in &scenario.parameters {
        let user_value = values.get(&spec.name).map(String::as_str);

        match spec.kind {
            ParameterKind::Hidden => {
                // Fixed literal, applied unconditionally regardless of input.
                set(
                    &mut params,
                    &spec.name,
                    spec.value.clone().unwrap_or_default(),
                );
            }
            ParameterKind::Select if spec.name == "dateRange" => {
                let days = user_value
                    .or(spec.default.as_deref())
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(DEFAULT_TRAILING_DAYS);
                let cutoff = today - Duration::days(days);
                set(&mut params, WHERE_KEY, date_clause(">=", &cutoff.to_string()));
            }
            ParameterKind::Date if spec.name == "fromDate" => {
                if let Some(value) = non_empty(user_value) {
                    append_where(&mut params, date_clause(">=", value));
                }
            }
            ParameterKind::Date if spec.name == "toDate" => {
                if let Some(value) = non_empty(user_value) {
                    append_where(&mut params, date_clause("<=", value));
                }
            }
            _ => {
                if let Some(value) = non_empty(user_value) {
                    set(&mut params, &spec.name, value.to_string());
                }
            }
        }
    }

    params
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn date_clause(op: &str, date: &str) -> String {
    format!("Date {op} DateTime.Parse(\"{date}\")")
}

/// Insert or overwrite a key, keeping its original position when it already
/// exists.
fn set(params: &mut QueryParams, key: &str, value: String) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => params.push((key.to_string(), value)),
    }
}

/// Conjoin a clause onto the accumulated `where` expression.
fn append_where(params: &mut QueryParams, clause: String) {
    match params.iter_mut().find(|(k, _)| k == WHERE_KEY) {
        Some(entry) => entry.1 = format!("{} AND {}", entry.1, clause),
        None => params.push((WHERE_KEY.to_string(), clause)),
    }
}
