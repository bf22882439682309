use serde::Deserialize;
use std::env;

use crate::constants::{
    BILL_POLL_INTERVAL_SECS, DEFAULT_APTOS_NODE_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_LOCAL_CACHE_PATH, DEFAULT_MODULE_NAME,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Blockchain
    pub aptos_node_url: String,
    pub module_address: Option<String>,
    pub module_name: String,

    // Wallet session (watch-only)
    pub wallet_address: Option<String>,

    // Bill sync
    pub bill_poll_interval_secs: u64,

    // Outbound HTTP request timeout
    pub http_timeout_secs: u64,

    // AutoPay side-store as seen by the client flows
    pub autopay_api_url: String,
    pub local_cache_path: String,

    // CORS
    pub cors_allowed_origins: String,
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            aptos_node_url: env::var("APTOS_NODE_URL")
                .unwrap_or_else(|_| DEFAULT_APTOS_NODE_URL.to_string()),
            module_address: env_non_empty("MODULE_ADDRESS"),
            module_name: env::var("MODULE_NAME")
                .unwrap_or_else(|_| DEFAULT_MODULE_NAME.to_string()),

            wallet_address: env_non_empty("WALLET_ADDRESS"),

            bill_poll_interval_secs: env::var("BILL_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| BILL_POLL_INTERVAL_SECS.to_string())
                .parse()?,
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                .parse()?,

            autopay_api_url: env::var("AUTOPAY_API_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            local_cache_path: env::var("LOCAL_CACHE_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_CACHE_PATH.to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if url::Url::parse(&self.aptos_node_url).is_err() {
            anyhow::bail!("APTOS_NODE_URL is not a valid URL");
        }
        if url::Url::parse(&self.autopay_api_url).is_err() {
            anyhow::bail!("AUTOPAY_API_URL is not a valid URL");
        }
        if self.bill_poll_interval_secs == 0 {
            anyhow::bail!("BILL_POLL_INTERVAL_SECS must be > 0");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
        }

        if self.module_address.is_none() {
            tracing::warn!("MODULE_ADDRESS not set; bill sync will keep sample bills");
        }
        if self.wallet_address.is_none() {
            tracing::warn!("WALLET_ADDRESS not set; wallet session is disconnected");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        let node = self.aptos_node_url.to_ascii_lowercase();
        node.contains("testnet") || node.contains("devnet")
    }

    /// Fully-qualified Move function id, or `None` while the contract is unconfigured.
    pub fn module_function(&self, function: &str) -> Option<String> {
        self.module_address
            .as_deref()
            .map(|address| format!("{}::{}::{}", address, self.module_name, function))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 3001,
        environment: "development".to_string(),
        database_url: "postgres://localhost/pulse".to_string(),
        database_max_connections: 1,
        aptos_node_url: "http://localhost:8080/v1".to_string(),
        module_address: Some("0xbeef".to_string()),
        module_name: DEFAULT_MODULE_NAME.to_string(),
        wallet_address: None,
        bill_poll_interval_secs: BILL_POLL_INTERVAL_SECS,
        http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        autopay_api_url: "http://localhost:3001".to_string(),
        local_cache_path: DEFAULT_LOCAL_CACHE_PATH.to_string(),
        cors_allowed_origins: "*".to_string(),
    }
}
