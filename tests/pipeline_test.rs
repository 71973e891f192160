//! End-to-end pipeline tests over a scripted mock gateway

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use xeroq::auth::Credentials;
use xeroq::config::Config;
use xeroq::error::{Error, Result};
use xeroq::gateway::{ApiGateway, HttpReply};
use xeroq::scenario::Scenario;
use xeroq::session::{execute_scenario, SessionState};

/// Gateway that replays scripted replies in order and records every call.
struct MockGateway {
    replies: Mutex<VecDeque<HttpReply>>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    fn new(replies: Vec<HttpReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<HttpReply> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Other("unexpected extra call".to_string()))
    }
}

#[async_trait]
impl ApiGateway for MockGateway {
    async fn post_form(&self, url: &str, _fields: &[(&str, &str)]) -> Result<HttpReply> {
        self.calls.lock().unwrap().push(format!("POST {url}"));
        self.next_reply()
    }

    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpReply> {
        self.calls.lock().unwrap().push(format!("GET {url}"));
        self.next_reply()
    }
}

fn ok(body: serde_json::Value) -> HttpReply {
    HttpReply {
        status: 200,
        reason: "OK".to_string(),
        body: body.to_string(),
    }
}

fn failed(status: u16, reason: &str, body: &str) -> HttpReply {
    HttpReply {
        status,
        reason: reason.to_string(),
        body: body.to_string(),
    }
}

fn token_reply() -> HttpReply {
    ok(json!({"access_token": "tok", "expires_in": 1800, "token_type": "Bearer"}))
}

fn connections_reply() -> HttpReply {
    ok(json!([
        {"id": "c1", "tenantId": "tenant-1", "tenantType": "ORGANISATION", "tenantName": "Demo Co"}
    ]))
}

fn config() -> Config {
    Config {
        token_url: "https://identity.test/connect/token".to_string(),
        connections_url: "https://api.test/connections".to_string(),
        ..Config::default()
    }
}

fn scenario(json_text: &str) -> Scenario {
    serde_json::from_str(json_text).unwrap()
}

fn plain_scenario() -> Scenario {
    scenario(
        r#"{
            "id": "invoices",
            "name": "Invoices",
            "endpoint": "https://api.test/Invoices",
            "parameters": [
                {"name": "order", "type": "text"},
                {"name": "status", "type": "hidden", "value": "AUTHORISED"}
            ]
        }"#,
    )
}

fn aggregating_scenario() -> Scenario {
    scenario(
        r#"{
            "id": "unreconciled",
            "name": "Unreconciled",
            "endpoint": "https://api.test/BankTransactions",
            "parameters": [
                {"name": "where", "type": "hidden", "value": "IsReconciled==false"}
            ],
            "aggregateByAccount": true,
            "fetchAllAccounts": true,
            "accountsEndpoint": "https://api.test/Accounts"
        }"#,
    )
}

fn creds() -> Credentials {
    Credentials::new("id", "secret")
}

#[tokio::test]
async fn failing_token_endpoint_short_circuits() {
    let gateway = MockGateway::new(vec![failed(401, "Unauthorized", "invalid_client")]);

    let err = execute_scenario(&gateway, &config(), &plain_scenario(), &creds(), &HashMap::new())
        .await
        .unwrap_err();

    match err {
        Error::TokenRequestFailed { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_client");
        }
        other => panic!("expected TokenRequestFailed, got {other:?}"),
    }
    // No connections or resource call was made.
    assert_eq!(
        gateway.calls(),
        vec!["POST https://identity.test/connect/token"]
    );
}

#[tokio::test]
async fn empty_credentials_fail_before_any_network_call() {
    let gateway = MockGateway::new(vec![]);
    let credentials = Credentials::new("", "secret");

    let err = execute_scenario(
        &gateway,
        &config(),
        &plain_scenario(),
        &credentials,
        &HashMap::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::InvalidCredentials));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn empty_connections_list_reports_no_organization() {
    let gateway = MockGateway::new(vec![token_reply(), ok(json!([]))]);

    let err = execute_scenario(&gateway, &config(), &plain_scenario(), &creds(), &HashMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoOrganizationConnected));
}

#[tokio::test]
async fn plain_scenario_returns_unwrapped_rows() {
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        ok(json!({
            "Id": "resp-1",
            "Invoices": [{"InvoiceID": "a"}, {"InvoiceID": "b"}]
        })),
    ]);

    let mut values = HashMap::new();
    values.insert("order".to_string(), "Date DESC".to_string());

    let rows = execute_scenario(&gateway, &config(), &plain_scenario(), &creds(), &values)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["InvoiceID"], "a");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], "POST https://identity.test/connect/token");
    assert_eq!(calls[1], "GET https://api.test/connections");
    // Query string carries the user parameter and the hidden constant.
    assert!(calls[2].contains("order=Date+DESC") || calls[2].contains("order=Date%20DESC"));
    assert!(calls[2].contains("status=AUTHORISED"));
}

#[tokio::test]
async fn upstream_failure_keeps_status_and_body() {
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        failed(403, "Forbidden", "insufficient scope"),
    ]);

    let err = execute_scenario(&gateway, &config(), &plain_scenario(), &creds(), &HashMap::new())
        .await
        .unwrap_err();

    match err {
        Error::UpstreamQueryFailed {
            status,
            reason,
            body,
        } => {
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
            assert_eq!(body, "insufficient scope");
        }
        other => panic!("expected UpstreamQueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn aggregation_seeds_reference_accounts_and_appends_strays() {
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        // Preliminary accounts fetch, then the primary query.
        ok(json!({"Accounts": [{"Name": "A"}, {"Name": "B"}]})),
        ok(json!({"BankTransactions": [
            {"BankAccount": {"Name": "A"}, "Total": 10},
            {"BankAccount": {"Name": "A"}, "Total": 5},
            {"BankAccount": {"Name": "C"}, "Total": 2}
        ]})),
    ]);

    let rows = execute_scenario(
        &gateway,
        &config(),
        &aggregating_scenario(),
        &creds(),
        &HashMap::new(),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["Bank Account"], "A");
    assert_eq!(rows[0]["Count of Unreconciled"], 2);
    assert_eq!(rows[0]["Balance on Xero"], "£15.00");
    assert_eq!(rows[1]["Bank Account"], "B");
    assert_eq!(rows[1]["Count of Unreconciled"], 0);
    assert_eq!(rows[1]["Balance on Xero"], "£0.00");
    assert_eq!(rows[2]["Bank Account"], "C");
    assert_eq!(rows[2]["Count of Unreconciled"], 1);
    assert_eq!(rows[2]["Balance on Xero"], "£2.00");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 4);
    // Accounts fetch is filtered to bank accounts and precedes the primary query.
    assert!(calls[2].starts_with("GET https://api.test/Accounts?"));
    assert!(calls[2].contains("where=Type%3D%3D%22BANK%22"));
    assert!(calls[3].starts_with("GET https://api.test/BankTransactions?"));
}

#[tokio::test]
async fn aggregation_degrades_without_accounts_endpoint() {
    let degraded = scenario(
        r#"{
            "id": "unreconciled",
            "name": "Unreconciled",
            "endpoint": "https://api.test/BankTransactions",
            "aggregateByAccount": true
        }"#,
    );
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        ok(json!({"BankTransactions": [
            {"BankAccount": {"Name": "A"}, "Total": 1.5}
        ]})),
    ]);

    let rows = execute_scenario(&gateway, &config(), &degraded, &creds(), &HashMap::new())
        .await
        .unwrap();

    // Observed accounts only: no preliminary fetch happened.
    assert_eq!(gateway.calls().len(), 3);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Bank Account"], "A");
}

#[tokio::test]
async fn session_state_carries_the_query_results() {
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        ok(json!({"Invoices": [{"InvoiceID": "a"}]})),
    ]);

    let state = SessionState::default().with_scenario(plain_scenario());
    let state = state
        .execute(&gateway, &config(), &creds(), &HashMap::new())
        .await
        .unwrap();

    assert!(!state.busy);
    let rows = state.rows.expect("rows should be set after execution");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["InvoiceID"], "a");
}

#[tokio::test]
async fn session_refuses_to_start_while_busy() {
    let gateway = MockGateway::new(vec![]);

    let state = SessionState::default()
        .with_scenario(plain_scenario())
        .with_busy(true);
    let err = state
        .execute(&gateway, &config(), &creds(), &HashMap::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("already in flight"));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn session_without_a_scenario_cannot_execute() {
    let gateway = MockGateway::new(vec![]);

    let err = SessionState::default()
        .execute(&gateway, &config(), &creds(), &HashMap::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no scenario selected"));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn primary_failure_yields_no_rows_even_after_accounts_fetch() {
    let gateway = MockGateway::new(vec![
        token_reply(),
        connections_reply(),
        ok(json!({"Accounts": [{"Name": "A"}]})),
        failed(500, "Internal Server Error", "boom"),
    ]);

    let err = execute_scenario(
        &gateway,
        &config(),
        &aggregating_scenario(),
        &creds(),
        &HashMap::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::UpstreamQueryFailed { status: 500, .. }));
}
