use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== NOTIFICATION ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Success,
    Error,
}

/// UI-only record. Lives in memory and is lost on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notif_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}
