use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Wallet not connected")]
    WalletUnavailable,

    #[error("Contract address not configured")]
    ContractNotConfigured,

    #[error("Insufficient locked funds: needed {needed:.4} APT, locked {locked:.4} APT")]
    InsufficientLockedFunds { needed: f64, locked: f64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::BlockchainRPC(_) => (StatusCode::BAD_GATEWAY, "BLOCKCHAIN_RPC_ERROR"),
            AppError::WalletUnavailable => (StatusCode::UNAUTHORIZED, "WALLET_UNAVAILABLE"),
            AppError::ContractNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONTRACT_NOT_CONFIGURED")
            }
            AppError::InsufficientLockedFunds { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_LOCKED_FUNDS")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::ExternalAPI(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage failures surface the raw driver message, the rest carry their own text.
        let (message, details) = match self {
            AppError::Database(ref e) => (e.to_string(), None),
            AppError::NotFound(ref msg)
            | AppError::BadRequest(ref msg)
            | AppError::BlockchainRPC(ref msg)
            | AppError::ExternalAPI(ref msg)
            | AppError::Internal(ref msg) => (msg.clone(), None),
            AppError::InsufficientLockedFunds { needed, locked } => (
                self.to_string(),
                Some(serde_json::json!({ "needed": needed, "locked": locked })),
            ),
            AppError::WalletUnavailable | AppError::ContractNotConfigured => {
                (self.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response =
            AppError::BadRequest("Missing userAddress or billDetails".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_error_maps_to_500() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn insufficient_funds_message_has_both_amounts() {
        let err = AppError::InsufficientLockedFunds {
            needed: 2.003,
            locked: 1.5,
        };
        let text = err.to_string();
        assert!(text.contains("2.0030"));
        assert!(text.contains("1.5000"));
    }
}
