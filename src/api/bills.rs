use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, AutoPayConfig, Bill, BillStatus, Frequency, NewBillForm},
    services::{
        bill_actions::{AutopayBillView, AutopayOutcome, GroupPaymentReceipt, ProfileSummary},
        bill_sync::StatusCounts,
        local_cache::ReconcileReport,
        Dashboard,
    },
};

#[derive(Debug, Deserialize)]
pub struct ListBillsQuery {
    pub status: Option<BillStatus>,
}

#[derive(Debug, Serialize)]
pub struct BillsView {
    pub bills: Vec<Bill>,
    pub counts: StatusCounts,
}

#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableAutopayRequest {
    #[serde(default)]
    pub payment_date: u8,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub max_amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct LockFundsRequest {
    pub amount: f64,
}

/// GET /api/bills?status=
pub async fn list_bills(
    State(dashboard): State<Dashboard>,
    Query(query): Query<ListBillsQuery>,
) -> Json<ApiResponse<BillsView>> {
    let bills = dashboard.board.filter(query.status).await;
    let counts = dashboard.board.status_counts().await;
    Json(ApiResponse::success(BillsView { bills, counts }))
}

/// POST /api/bills
pub async fn add_bill(
    State(dashboard): State<Dashboard>,
    Json(form): Json<NewBillForm>,
) -> Result<Json<ApiResponse<TxResponse>>> {
    let tx_hash = dashboard.actions.add_bill(form).await?;
    Ok(Json(ApiResponse::success(TxResponse { tx_hash })))
}

/// POST /api/bills/{bill_id}/autopay
pub async fn enable_autopay(
    State(dashboard): State<Dashboard>,
    Path(bill_id): Path<String>,
    Json(req): Json<EnableAutopayRequest>,
) -> Result<Json<ApiResponse<AutopayOutcome>>> {
    let config = AutoPayConfig {
        bill_id,
        payment_date: req.payment_date,
        frequency: req.frequency,
        max_amount: req.max_amount,
        enabled: true,
    };
    let outcome = dashboard.actions.enable_autopay(config).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /api/bills/autopay
pub async fn autopay_bills(
    State(dashboard): State<Dashboard>,
) -> Json<ApiResponse<Vec<AutopayBillView>>> {
    Json(ApiResponse::success(dashboard.actions.autopay_bills().await))
}

/// POST /api/bills/{bill_id}/paid
pub async fn mark_paid(
    State(dashboard): State<Dashboard>,
    Path(bill_id): Path<String>,
) -> Result<Json<ApiResponse<Bill>>> {
    if !dashboard.actions.mark_paid(&bill_id).await {
        return Err(AppError::NotFound(format!("Bill {} not found", bill_id)));
    }
    let bill = dashboard
        .board
        .get(&bill_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Bill {} not found", bill_id)))?;
    Ok(Json(ApiResponse::success(bill)))
}

/// GET /api/bills/{bill_id}/transactions
pub async fn bill_transactions(
    State(dashboard): State<Dashboard>,
    Path(bill_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Value>>>> {
    let transactions = dashboard.actions.bill_transactions(&bill_id).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

/// POST /api/bills/pay-all
pub async fn pay_all(
    State(dashboard): State<Dashboard>,
) -> Result<Json<ApiResponse<GroupPaymentReceipt>>> {
    let receipt = dashboard.actions.pay_all_pending().await?;
    Ok(Json(ApiResponse::success(receipt)))
}

/// POST /api/funds/lock
pub async fn lock_funds(
    State(dashboard): State<Dashboard>,
    Json(req): Json<LockFundsRequest>,
) -> Result<Json<ApiResponse<TxResponse>>> {
    let tx_hash = dashboard.actions.lock_funds(req.amount).await?;
    Ok(Json(ApiResponse::success(TxResponse { tx_hash })))
}

/// GET /api/profile
pub async fn profile(State(dashboard): State<Dashboard>) -> Result<Json<ApiResponse<ProfileSummary>>> {
    let summary = dashboard.actions.profile_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// POST /api/autopay/reconcile
pub async fn reconcile_autopay(
    State(dashboard): State<Dashboard>,
) -> Result<Json<ApiResponse<ReconcileReport>>> {
    let report = dashboard.actions.reconcile_autopay().await?;
    Ok(Json(ApiResponse::success(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::NotificationType, services::tests::test_dashboard, wallet::tests::FakeWallet,
    };
    use serde_json::json;

    #[tokio::test]
    async fn list_bills_filters_by_status() {
        let (dashboard, _) = test_dashboard("api-list", FakeWallet::connected("0xabc")).await;
        let query = ListBillsQuery {
            status: Some(BillStatus::Pending),
        };
        let Json(response) = list_bills(State(dashboard), Query(query)).await;
        assert_eq!(response.data.bills.len(), 3);
        assert_eq!(response.data.counts.total, 6);
        assert_eq!(response.data.counts.autopay, 2);
    }

    #[test]
    fn status_query_uses_display_labels() {
        let query: ListBillsQuery =
            serde_json::from_value(json!({"status": "AutoPay Enabled"})).unwrap();
        assert_eq!(query.status, Some(BillStatus::AutoPayEnabled));
    }

    #[tokio::test]
    async fn mark_paid_updates_board() {
        let (dashboard, _) = test_dashboard("api-paid", FakeWallet::connected("0xabc")).await;
        let Json(response) = mark_paid(State(dashboard.clone()), Path("4".to_string()))
            .await
            .unwrap();
        assert_eq!(response.data.status, BillStatus::Paid);
        assert!(response.data.last_paid.is_some());

        let feed = dashboard.notifications.list().await;
        assert_eq!(feed[0].title, "Payment Successful");
        assert_eq!(feed[0].notif_type, NotificationType::Success);

        let missing = mark_paid(State(dashboard), Path("404".to_string())).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn autopay_page_lists_enabled_bills() {
        let (dashboard, _) = test_dashboard("api-autopay", FakeWallet::connected("0xabc")).await;
        let Json(response) = autopay_bills(State(dashboard)).await;
        let ids: Vec<&str> = response.data.iter().map(|v| v.bill.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "5"]);
        assert!(response
            .data
            .iter()
            .all(|v| v.config.enabled && v.config.bill_id == v.bill.id));
    }

    #[tokio::test]
    async fn pay_all_surfaces_insufficient_funds() {
        let (dashboard, ledger) = test_dashboard("api-pay", FakeWallet::connected("0xabc")).await;
        ledger.respond("get_pending_bills_total", Ok(vec![json!("300000000"), json!("2")]));
        ledger.respond("get_locked_funds", Ok(vec![json!("100000000")]));
        let result = pay_all(State(dashboard)).await;
        assert!(matches!(
            result,
            Err(AppError::InsufficientLockedFunds { .. })
        ));
    }

    #[tokio::test]
    async fn profile_converts_octas() {
        let (dashboard, ledger) = test_dashboard("api-profile", FakeWallet::connected("0xabc")).await;
        ledger.respond("get_user_balance", Ok(vec![json!("150000000")]));
        ledger.respond("get_locked_funds", Ok(vec![json!("50000000")]));
        ledger.respond("get_user_transaction_history", Ok(vec![json!([{"amount": "1"}])]));
        let Json(response) = profile(State(dashboard)).await.unwrap();
        assert_eq!(response.data.balance_apt, 1.5);
        assert_eq!(response.data.locked_apt, 0.5);
        assert_eq!(response.data.history.len(), 1);
    }
}
