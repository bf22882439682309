use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bills::decoder::encode_hex;

/// Entry-function payload handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl EntryFunctionPayload {
    pub fn new(function: String, arguments: Vec<serde_json::Value>) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function,
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// `add_bill(description: vector<u8>, amount: u64, payee: address, due_date: u64, bill_id: u64, status: u8)`
pub fn add_bill(
    function: String,
    description: &str,
    amount_octas: u64,
    payee: &str,
    due_date: u64,
    bill_id: u64,
    status: u8,
) -> EntryFunctionPayload {
    EntryFunctionPayload::new(
        function,
        vec![
            json!(encode_hex(description.as_bytes())),
            json!(amount_octas.to_string()),
            json!(payee),
            json!(due_date.to_string()),
            json!(bill_id.to_string()),
            json!(status),
        ],
    )
}

/// `update_bill_status(bill_id: u64, status: u8)`
pub fn update_bill_status(function: String, bill_id: &str, status: u8) -> EntryFunctionPayload {
    EntryFunctionPayload::new(function, vec![json!(bill_id), json!(status)])
}

/// `pay_all_pending_bills()`
pub fn pay_all_pending_bills(function: String) -> EntryFunctionPayload {
    EntryFunctionPayload::new(function, Vec::new())
}

/// `lock_funds(amount: u64)`
pub fn lock_funds(function: String, amount_octas: u64) -> EntryFunctionPayload {
    EntryFunctionPayload::new(function, vec![json!(amount_octas.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_bill_encodes_description_and_u64s() {
        let payload = add_bill(
            "0x1::bill_payment::add_bill".to_string(),
            "Rent",
            250_000_000,
            "0xfeed",
            1_767_225_600,
            0,
            0,
        );
        assert_eq!(payload.payload_type, "entry_function_payload");
        assert_eq!(payload.arguments[0], json!("0x52656e74"));
        assert_eq!(payload.arguments[1], json!("250000000"));
        assert_eq!(payload.arguments[2], json!("0xfeed"));
        assert_eq!(payload.arguments[5], json!(0));
    }

    #[test]
    fn payload_serializes_type_field() {
        let payload = pay_all_pending_bills("0x1::bill_payment::pay_all_pending_bills".to_string());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], json!("entry_function_payload"));
        assert_eq!(value["arguments"], json!([]));
    }
}
