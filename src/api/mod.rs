// src/api/mod.rs

pub mod autopay;
pub mod bills;
pub mod health;
pub mod notifications;

use axum::extract::FromRef;

use crate::config::Config;
use crate::db::Database;
use crate::services::Dashboard;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub dashboard: Dashboard,
}
