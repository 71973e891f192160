//! Xero authentication using a Custom Connection (client_credentials grant)
//!
//! Every query execution re-authenticates from scratch: a token grant
//! followed by a connections lookup to resolve the tenant. Nothing is cached
//! or persisted; credentials and tokens live only for the one execution.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Client credentials supplied by the user for one execution.
///
/// Held in memory only; the Debug impl redacts both fields so they can never
/// leak through logging.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token plus resolved tenant, valid for one execution.
#[derive(Clone)]
pub struct TokenContext {
    pub access_token: String,
    pub tenant_id: String,
}

impl fmt::Debug for TokenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenContext")
            .field("access_token", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    tenant_id: String,
}

pub struct Authenticator<'a> {
    gateway: &'a dyn ApiGateway,
    token_url: &'a str,
    connections_url: &'a str,
}

impl<'a> Authenticator<'a> {
    pub fn new(gateway: &'a dyn ApiGateway, config: &'a Config) -> Self {
        Self {
            gateway,
            token_url: &config.token_url,
            connections_url: &config.connections_url,
        }
    }

    /// Exchange client credentials for a bearer token and resolve the active
    /// tenant. Two sequential network calls; fails fast on the first
    /// non-success response with the upstream status and body intact.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<TokenContext> {
        if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        let reply = self
            .gateway
            .post_form(
                self.token_url,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", &credentials.client_id),
                    ("client_secret", &credentials.client_secret),
                ],
            )
            .await?;

        if !reply.is_success() {
            return Err(Error::TokenRequestFailed {
                status: reply.status,
                body: reply.body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&reply.body)?;
        debug!("access token acquired, resolving tenant");

        let bearer = format!("Bearer {}", token.access_token);
        let reply = self
            .gateway
            .get(
                self.connections_url,
                &[
                    ("Authorization", bearer.as_str()),
                    ("Content-Type", "application/json"),
                ],
            )
            .await?;

        if !reply.is_success() {
            return Err(Error::ConnectionsRequestFailed {
                status: reply.status,
                body: reply.body,
            });
        }

        let connections: Vec<Connection> = serde_json::from_str(&reply.body)?;
        // Custom Connections are single-tenant in practice; with multiple
        // organizations connected the first one wins, with no disambiguation.
        let first = connections
            .into_iter()
            .next()
            .ok_or(Error::NoOrganizationConnected)?;

        debug!(tenant = %first.tenant_id, "tenant resolved");
        Ok(TokenContext {
            access_token: token.access_token,
            tenant_id: first.tenant_id,
        })
    }
}
