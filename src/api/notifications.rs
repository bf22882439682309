use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, Notification},
    services::Dashboard,
};

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub unread_count: usize,
}

/// GET /api/notifications
pub async fn list(State(dashboard): State<Dashboard>) -> Json<ApiResponse<NotificationList>> {
    let center = &dashboard.notifications;
    Json(ApiResponse::success(NotificationList {
        items: center.list().await,
        unread_count: center.unread_count().await,
    }))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(dashboard): State<Dashboard>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>> {
    if !dashboard.notifications.mark_read(&id).await {
        return Err(AppError::NotFound(format!("Notification {} not found", id)));
    }
    Ok(Json(ApiResponse::success("Notification marked as read".to_string())))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(State(dashboard): State<Dashboard>) -> Json<ApiResponse<String>> {
    dashboard.notifications.mark_all_read().await;
    Json(ApiResponse::success("All notifications marked as read".to_string()))
}

/// DELETE /api/notifications
pub async fn clear(State(dashboard): State<Dashboard>) -> Json<ApiResponse<usize>> {
    Json(ApiResponse::success(dashboard.notifications.clear().await))
}
