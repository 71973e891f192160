//! HTTP API server
//!
//! Thin JSON API in front of the query pipeline: the catalog for form
//! population and a query proxy that re-authenticates on every call and
//! mirrors upstream failures back to the caller.

use crate::auth::{Authenticator, Credentials};
use crate::config::Config;
use crate::error::Error;
use crate::gateway::ApiGateway;
use crate::query::QueryExecutor;
use crate::scenario::Catalog;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub struct ApiServer {
    state: Arc<AppState>,
    port: u16,
}

pub struct AppState {
    pub gateway: Box<dyn ApiGateway>,
    pub config: Config,
    pub catalog: Catalog,
}

impl ApiServer {
    pub fn new(gateway: Box<dyn ApiGateway>, config: Config, catalog: Catalog, port: u16) -> Self {
        Self {
            state: Arc::new(AppState {
                gateway,
                config,
                catalog,
            }),
            port,
        }
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let app = build_router(self.state);

        info!("Starting API server on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/scenarios", get(list_scenarios))
        .route("/api/query", post(run_query))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    endpoint: String,
    /// Kept as a JSON map so the query string preserves the caller's
    /// parameter order.
    #[serde(default)]
    parameters: serde_json::Map<String, Value>,
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn list_scenarios(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!(state.catalog.scenarios()))
}

/// Execute one upstream query: full re-authentication, one GET, raw envelope
/// back. Upstream failures keep their status code and body; local validation
/// failures are 400s.
async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<Value>) {
    if request.client_id.is_empty() || request.client_secret.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, &Error::InvalidCredentials, None);
    }
    if request.endpoint.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, &Error::MissingEndpoint, None);
    }

    let credentials = Credentials::new(request.client_id, request.client_secret);
    let token = match Authenticator::new(state.gateway.as_ref(), &state.config)
        .authenticate(&credentials)
        .await
    {
        Ok(token) => token,
        Err(e) => return failure(e),
    };

    let params: Vec<(String, String)> = request
        .parameters
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();
    match QueryExecutor::new(state.gateway.as_ref())
        .execute(&token, &request.endpoint, &params)
        .await
    {
        Ok(envelope) => (StatusCode::OK, Json(envelope)),
        Err(e) => failure(e),
    }
}

fn failure(error: Error) -> (StatusCode, Json<Value>) {
    warn!("query failed: {error}");
    let status = error
        .upstream_status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(match &error {
            Error::InvalidCredentials | Error::MissingEndpoint => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        });
    let details = error.upstream_body().map(str::to_string);
    error_response(status, &error, details)
}

fn error_response(
    status: StatusCode,
    error: &Error,
    details: Option<String>,
) -> (StatusCode, Json<Value>) {
    let mut body = json!({"error": error.to_string()});
    if let Some(details) = details {
        body["details"] = json!(details);
    }
    (status, Json(body))
}
