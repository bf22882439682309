use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::{
    constants::HTTP_CONNECT_TIMEOUT_SECS,
    error::{AppError, Result},
};

/// Read side of the chain: view functions and transaction confirmation.
#[async_trait]
pub trait BillLedger: Send + Sync {
    /// Calls a Move view function and returns its result values.
    async fn view(
        &self,
        function: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<Vec<serde_json::Value>>;

    /// Blocks until the transaction is committed and fails if it aborted.
    async fn wait_for_transaction(&self, hash: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ViewRequest<'a> {
    function: &'a str,
    type_arguments: Vec<String>,
    arguments: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct NodeError {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommittedTransaction {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    vm_status: String,
}

fn view_request(function: &str, arguments: Vec<serde_json::Value>) -> ViewRequest<'_> {
    ViewRequest {
        function,
        type_arguments: Vec::new(),
        arguments,
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// HTTP client with connect and whole-request timeouts, so a hung peer
/// surfaces as an error instead of stalling the caller.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("HTTP client init failed: {}", e)))
}

/// Aptos fullnode REST client
pub struct AptosClient {
    node_url: String,
    client: reqwest::Client,
}

impl AptosClient {
    pub fn new(node_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            node_url,
            client: http_client(timeout)?,
        })
    }

    async fn node_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        match response.json::<NodeError>().await {
            Ok(body) => AppError::BlockchainRPC(format!(
                "{} ({}): {}",
                status,
                body.error_code.unwrap_or_default(),
                body.message
            )),
            Err(_) => AppError::BlockchainRPC(format!("node returned {}", status)),
        }
    }
}

#[async_trait]
impl BillLedger for AptosClient {
    async fn view(
        &self,
        function: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<Vec<serde_json::Value>> {
        let request = view_request(function, arguments);
        tracing::debug!(function, "calling view function");

        let response = self
            .client
            .post(endpoint(&self.node_url, "view"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::node_error(response).await);
        }

        response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn wait_for_transaction(&self, hash: &str) -> Result<()> {
        let response = self
            .client
            .get(endpoint(
                &self.node_url,
                &format!("transactions/wait_by_hash/{}", hash),
            ))
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::node_error(response).await);
        }

        let tx: CommittedTransaction = response
            .json()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;

        if !tx.success {
            return Err(AppError::BlockchainRPC(format!(
                "transaction {} failed: {}",
                hash, tx.vm_status
            )));
        }

        tracing::info!(hash, "transaction confirmed");
        Ok(())
    }
}
