//! Runtime configuration with environment overrides

use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_URL: &str = "https://identity.xero.com/connect/token";
pub const DEFAULT_CONNECTIONS_URL: &str = "https://api.xero.com/connections";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity token endpoint for the client-credentials grant.
    pub token_url: String,
    /// Endpoint listing the organizations the connection can access.
    pub connections_url: String,
    /// Per-request timeout in seconds for all outbound calls.
    pub timeout_secs: u64,
    /// Currency code used when formatting aggregated balances.
    pub currency: String,
    /// Locale used when formatting aggregated balances.
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            connections_url: DEFAULT_CONNECTIONS_URL.to_string(),
            timeout_secs: 30,
            currency: "GBP".to_string(),
            locale: "en-GB".to_string(),
        }
    }
}

impl Config {
    /// Build a config from defaults, letting XEROQ_* environment
    /// variables override individual fields.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("XEROQ_TOKEN_URL") {
            config.token_url = url;
        }
        if let Ok(url) = std::env::var("XEROQ_CONNECTIONS_URL") {
            config.connections_url = url;
        }
        if let Ok(secs) = std::env::var("XEROQ_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.timeout_secs = secs;
            }
        }
        if let Ok(currency) = std::env::var("XEROQ_CURRENCY") {
            config.currency = currency;
        }
        if let Ok(locale) = std::env::var("XEROQ_LOCALE") {
            config.locale = locale;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_xero() {
        let config = Config::default();
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.connections_url, DEFAULT_CONNECTIONS_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.currency, "GBP");
    }
}
