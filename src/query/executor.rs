//! Authenticated query execution and envelope unwrapping

use crate::auth::TokenContext;
use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// The Xero envelope key that carries validation errors rather than rows.
pub const ERROR_LIST_KEY: &str = "Errors";

pub struct QueryExecutor<'a> {
    gateway: &'a dyn ApiGateway,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(gateway: &'a dyn ApiGateway) -> Self {
        Self { gateway }
    }

    /// Issue one authenticated GET and return the raw response envelope.
    /// Query pairs with empty values are dropped rather than sent as empty
    /// strings.
    pub async fn execute(
        &self,
        token: &TokenContext,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        if endpoint.is_empty() {
            return Err(Error::MissingEndpoint);
        }

        let mut url = Url::parse(endpoint)
            .map_err(|e| Error::Other(format!("Invalid endpoint URL {endpoint}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                if !value.is_empty() {
                    query.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        debug!(%url, "executing query");

        let bearer = format!("Bearer {}", token.access_token);
        let reply = self
            .gateway
            .get(
                url.as_str(),
                &[
                    ("Authorization", bearer.as_str()),
                    ("Accept", "application/json"),
                    ("Content-Type", "application/json"),
                    ("xero-tenant-id", token.tenant_id.as_str()),
                ],
            )
            .await?;

        if !reply.is_success() {
            return Err(Error::UpstreamQueryFailed {
                status: reply.status,
                reason: reply.reason,
                body: reply.body,
            });
        }

        reply.json()
    }
}

/// Locate the first property of `envelope` whose value is an array and whose
/// key is not `exclude_key`. The upstream API wraps results under a
/// type-specific key ("Invoices", "BankTransactions", ...) the client does
/// not know in advance; first match in key iteration order wins.
pub fn first_array_property<'v>(
    envelope: &'v Value,
    exclude_key: &str,
) -> Option<(&'v str, &'v Vec<Value>)> {
    let object = envelope.as_object()?;
    object.iter().find_map(|(key, value)| match value {
        Value::Array(items) if key != exclude_key => Some((key.as_str(), items)),
        _ => None,
    })
}

/// Extract the result rows from a response envelope. No array-valued
/// property means an empty result set, not an error.
pub fn unwrap_envelope(envelope: &Value) -> Vec<Value> {
    first_array_property(envelope, ERROR_LIST_KEY)
        .map(|(_, rows)| rows.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_first_array_property() {
        let envelope = json!({
            "Id": "abc",
            "Invoices": [{"InvoiceID": "1"}, {"InvoiceID": "2"}],
            "Status": "OK"
        });
        let (key, rows) = first_array_property(&envelope, ERROR_LIST_KEY).unwrap();
        assert_eq!(key, "Invoices");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn skips_the_error_list_key() {
        let envelope = json!({
            "Errors": [{"Message": "bad"}],
            "Payments": [{"PaymentID": "1"}]
        });
        let (key, _) = first_array_property(&envelope, ERROR_LIST_KEY).unwrap();
        assert_eq!(key, "Payments");
    }

    #[test]
    fn no_array_property_means_empty_result_set() {
        let envelope = json!({"Id": "abc", "Status": "OK"});
        assert!(first_array_property(&envelope, ERROR_LIST_KEY).is_none());
        assert!(unwrap_envelope(&envelope).is_empty());

        let not_an_object = json!([1, 2, 3]);
        assert!(unwrap_envelope(&not_an_object).is_empty());
    }

    #[test]
    fn only_errors_array_means_empty_result_set() {
        let envelope = json!({"Errors": [{"Message": "validation"}]});
        assert!(unwrap_envelope(&envelope).is_empty());
    }
}
