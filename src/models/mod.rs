// src/models/mod.rs
pub mod autopay;
pub mod bill;
pub mod notification;

use serde::Serialize;

pub use autopay::{AutopayBill, CreateAutopayRequest, CreateAutopayResponse, DueBillsResponse};
pub use bill::{AutoPayConfig, Bill, BillStatus, Frequency, NewBillForm};
pub use notification::{Notification, NotificationType};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }
}
