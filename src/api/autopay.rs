use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    db::{filter_due, Database},
    error::{AppError, Result},
    models::{
        ApiResponse, AutopayBill, CreateAutopayRequest, CreateAutopayResponse, DueBillsResponse,
    },
    services::autopay_client::AutopayStore,
};

/// POST /api/autopay
pub async fn create_autopay_bill(
    State(db): State<Database>,
    Json(req): Json<CreateAutopayRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateAutopayResponse>>)> {
    store_document(&db, req).await.map(created)
}

fn created(
    body: CreateAutopayResponse,
) -> (StatusCode, Json<ApiResponse<CreateAutopayResponse>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(body)))
}

async fn store_document(
    store: &dyn AutopayStore,
    req: CreateAutopayRequest,
) -> Result<CreateAutopayResponse> {
    let user_address = req
        .user_address
        .filter(|addr| !addr.trim().is_empty());
    let bill_details = req.bill_details.filter(|details| !details.is_null());
    let (Some(user_address), Some(bill_details)) = (user_address, bill_details) else {
        return Err(AppError::BadRequest(
            "Missing userAddress or billDetails".to_string(),
        ));
    };

    let id = store.store(&user_address, bill_details).await?;
    tracing::info!(user = %user_address, id, "autopay bill stored");

    Ok(CreateAutopayResponse {
        id,
        message: "Autopay bill stored successfully".to_string(),
    })
}

/// GET /api/autopay/due/{user_address}
///
/// Enabled documents whose `dueDate` equals the server's UTC date.
pub async fn get_due_bills(
    State(db): State<Database>,
    Path(user_address): Path<String>,
) -> Result<Json<DueBillsResponse>> {
    let bills = due_bills(&db, &user_address, &utc_date(Utc::now())).await?;
    Ok(Json(DueBillsResponse { bills }))
}

async fn due_bills(
    store: &dyn AutopayStore,
    user_address: &str,
    today: &str,
) -> Result<Vec<AutopayBill>> {
    let bills = store.list(user_address).await?;
    Ok(filter_due(bills, today))
}

/// `YYYY-MM-DD` of `now` in UTC, whatever zone it was taken in.
fn utc_date<Tz: TimeZone>(now: DateTime<Tz>) -> String {
    now.with_timezone(&Utc)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

/// GET /api/autopay/{user_address}
pub async fn list_autopay_bills(
    State(db): State<Database>,
    Path(user_address): Path<String>,
) -> Result<Json<ApiResponse<Vec<AutopayBill>>>> {
    let bills = db.list_autopay_bills(&user_address).await?;
    Ok(Json(ApiResponse::success(bills)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::autopay_client::tests::FakeStore;
    use serde_json::json;

    async fn create(store: &FakeStore, req: serde_json::Value) -> Result<CreateAutopayResponse> {
        let req: CreateAutopayRequest = serde_json::from_value(req).unwrap();
        store_document(store, req).await
    }

    #[tokio::test]
    async fn stores_document_and_returns_id() {
        let store = FakeStore::default();
        let created = create(
            &store,
            json!({"userAddress": "0xabc", "billDetails": {"dueDate": "2025-03-01", "enabled": true}}),
        )
        .await
        .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.message, "Autopay bill stored successfully");

        let stored = store.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, "0xabc");
        assert_eq!(stored[0].1["dueDate"], "2025-03-01");
    }

    #[tokio::test]
    async fn created_response_uses_201_envelope() {
        let response = create(
            &FakeStore::default(),
            json!({"userAddress": "0xabc", "billDetails": {"enabled": true}}),
        )
        .await
        .unwrap();
        let (status, Json(body)) = created(response);
        assert_eq!(status, StatusCode::CREATED);
        let body = serde_json::to_value(&body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = FakeStore {
            fail: true,
            ..Default::default()
        };
        let result = create(&store, json!({"userAddress": "0xabc", "billDetails": {}})).await;
        assert!(matches!(result, Err(AppError::ExternalAPI(_))));
    }

    #[tokio::test]
    async fn missing_user_address_is_bad_request() {
        let store = FakeStore::default();
        let result = create(&store, json!({"billDetails": {"enabled": true}})).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Missing userAddress or billDetails"),
            other => panic!("expected bad request, got {:?}", other),
        }
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_or_empty_fields_are_bad_request() {
        let store = FakeStore::default();
        let cases = [
            json!({"userAddress": "0xabc", "billDetails": null}),
            json!({"userAddress": "", "billDetails": {"enabled": true}}),
            json!({"userAddress": "0xabc"}),
            json!({}),
        ];
        for case in cases {
            assert!(matches!(
                create(&store, case).await,
                Err(AppError::BadRequest(_))
            ));
        }
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn due_bills_match_only_today() {
        let store = FakeStore::default();
        for due in ["2025-02-28", "2025-03-01", "2025-03-02"] {
            create(
                &store,
                json!({"userAddress": "0xabc", "billDetails": {"dueDate": due, "enabled": true}}),
            )
            .await
            .unwrap();
        }
        create(
            &store,
            json!({"userAddress": "0xdef", "billDetails": {"dueDate": "2025-03-01", "enabled": true}}),
        )
        .await
        .unwrap();

        let due = due_bills(&store, "0xabc", "2025-03-01").await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].bill_details["dueDate"], "2025-03-01");
        assert_eq!(due[0].user_address, "0xabc");
    }

    #[test]
    fn today_is_taken_in_utc() {
        let local = DateTime::parse_from_rfc3339("2025-03-02T01:00:00+05:00").unwrap();
        assert_eq!(utc_date(local), "2025-03-01");

        let late = DateTime::parse_from_rfc3339("2025-02-28T22:30:00-03:00").unwrap();
        assert_eq!(utc_date(late), "2025-03-01");

        let utc = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(utc_date(utc), "2025-03-01");
    }
}
