use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== STORED DOCUMENT ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AutopayBill {
    pub id: i64,
    pub user_address: String,
    pub bill_details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AutopayBill {
    pub fn is_enabled(&self) -> bool {
        self.bill_details.get("enabled").and_then(|v| v.as_bool()) == Some(true)
    }

    pub fn due_date(&self) -> Option<&str> {
        self.bill_details.get("dueDate").and_then(|v| v.as_str())
    }

    pub fn bill_id(&self) -> Option<String> {
        match self.bill_details.get("billId")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ==================== REQUESTS / RESPONSES ====================
/// Body of `POST /api/autopay`. Both fields are optional at the type level so
/// that an incomplete body reaches the handler and gets a 400, not a 422.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutopayRequest {
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub bill_details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAutopayResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DueBillsResponse {
    pub bills: Vec<AutopayBill>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(details: serde_json::Value) -> AutopayBill {
        AutopayBill {
            id: 1,
            user_address: "0xabc".to_string(),
            bill_details: details,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn enabled_requires_boolean_true() {
        assert!(doc(serde_json::json!({"enabled": true})).is_enabled());
        assert!(!doc(serde_json::json!({"enabled": "true"})).is_enabled());
        assert!(!doc(serde_json::json!({})).is_enabled());
    }

    #[test]
    fn bill_id_accepts_number_or_string() {
        assert_eq!(doc(serde_json::json!({"billId": 4})).bill_id().as_deref(), Some("4"));
        assert_eq!(doc(serde_json::json!({"billId": "x1"})).bill_id().as_deref(), Some("x1"));
        assert!(doc(serde_json::json!({"billId": null})).bill_id().is_none());
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateAutopayRequest =
            serde_json::from_value(serde_json::json!({"userAddress": "0xabc"})).unwrap();
        assert_eq!(req.user_address.as_deref(), Some("0xabc"));
        assert!(req.bill_details.is_none());
    }
}
