use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    aptos::client::http_client,
    error::{AppError, Result},
    models::{AutopayBill, CreateAutopayRequest, CreateAutopayResponse},
};

/// AutoPay document store: the Postgres table itself, or the HTTP API in
/// front of it as seen from the dashboard flows.
#[async_trait]
pub trait AutopayStore: Send + Sync {
    /// Stores one document and returns its id.
    async fn store(&self, user_address: &str, bill_details: serde_json::Value) -> Result<i64>;

    /// All documents for `user_address`, newest first.
    async fn list(&self, user_address: &str) -> Result<Vec<AutopayBill>>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SuccessBody<T> {
    data: T,
}

/// HTTP client for the `/api/autopay` endpoints.
pub struct AutopayClient {
    base_url: String,
    client: reqwest::Client,
}

impl AutopayClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => AppError::ExternalAPI(body.error.message),
            Err(_) => AppError::ExternalAPI(format!("autopay store returned {}", status)),
        }
    }
}

#[async_trait]
impl AutopayStore for AutopayClient {
    async fn store(&self, user_address: &str, bill_details: serde_json::Value) -> Result<i64> {
        let request = CreateAutopayRequest {
            user_address: Some(user_address.to_string()),
            bill_details: Some(bill_details),
        };
        let response = self
            .client
            .post(format!("{}/api/autopay", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: SuccessBody<CreateAutopayResponse> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(e.to_string()))?;
        Ok(body.data.id)
    }

    async fn list(&self, user_address: &str) -> Result<Vec<AutopayBill>> {
        let response = self
            .client
            .get(format!("{}/api/autopay/{}", self.base_url, user_address))
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: SuccessBody<Vec<AutopayBill>> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(e.to_string()))?;
        Ok(body.data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory store keeping documents in insertion order.
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub stored: Mutex<Vec<(String, serde_json::Value)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl AutopayStore for FakeStore {
        async fn store(&self, user_address: &str, bill_details: serde_json::Value) -> Result<i64> {
            if self.fail {
                return Err(AppError::ExternalAPI("store down".to_string()));
            }
            let mut stored = self.stored.lock().unwrap();
            stored.push((user_address.to_string(), bill_details));
            Ok(stored.len() as i64)
        }

        async fn list(&self, user_address: &str) -> Result<Vec<AutopayBill>> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .enumerate()
                .filter(|(_, (addr, _))| addr == user_address)
                .map(|(i, (addr, details))| AutopayBill {
                    id: i as i64 + 1,
                    user_address: addr.clone(),
                    bill_details: details.clone(),
                    created_at: chrono::Utc::now(),
                })
                .rev()
                .collect())
        }
    }

    #[test]
    fn parses_error_envelope() {
        let body: ErrorBody = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": {"code": "BAD_REQUEST", "message": "Missing userAddress or billDetails"}
        }))
        .unwrap();
        assert_eq!(body.error.message, "Missing userAddress or billDetails");
    }

    #[test]
    fn parses_created_envelope() {
        let body: SuccessBody<CreateAutopayResponse> = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": {"id": 12, "message": "Autopay bill stored successfully"}
        }))
        .unwrap();
        assert_eq!(body.data.id, 12);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client =
            AutopayClient::new("http://localhost:3001/".to_string(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");
    }
}
