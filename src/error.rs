use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client ID and Client Secret are required")]
    InvalidCredentials,

    #[error("Endpoint is required")]
    MissingEndpoint,

    #[error("Failed to get access token: {status} - {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Failed to get connections: {status} - {body}")]
    ConnectionsRequestFailed { status: u16, body: String },

    #[error("No Xero organizations found. Ensure your Custom Connection has access to at least one organization")]
    NoOrganizationConnected,

    #[error("Xero API error: {status} {reason}")]
    UpstreamQueryFailed {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Scenario catalog error: {0}")]
    Catalog(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Upstream HTTP status to mirror back to the caller, when one exists.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::TokenRequestFailed { status, .. }
            | Error::ConnectionsRequestFailed { status, .. }
            | Error::UpstreamQueryFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream response body, when one was captured.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Error::TokenRequestFailed { body, .. }
            | Error::ConnectionsRequestFailed { body, .. }
            | Error::UpstreamQueryFailed { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
