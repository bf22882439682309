use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    config::Config,
    error::{AppError, Result},
    models::AutopayBill,
    services::autopay_client::AutopayStore,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== AUTOPAY QUERIES ====================
impl Database {
    pub async fn insert_autopay_bill(
        &self,
        user_address: &str,
        bill_details: &serde_json::Value,
    ) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO autopay_bills (user_address, bill_details)
             VALUES ($1, $2)
             RETURNING id",
        )
        .bind(user_address)
        .bind(bill_details)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id")?;
        Ok(id)
    }

    /// All documents for an address, newest first.
    pub async fn list_autopay_bills(&self, user_address: &str) -> Result<Vec<AutopayBill>> {
        let bills = sqlx::query_as::<_, AutopayBill>(
            "SELECT id, user_address, bill_details, created_at
             FROM autopay_bills
             WHERE user_address = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_address)
        .fetch_all(&self.pool)
        .await?;
        Ok(bills)
    }

    pub async fn list_autopay_users(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT user_address FROM autopay_bills ORDER BY user_address",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("user_address").map_err(AppError::from))
            .collect()
    }
}

#[async_trait]
impl AutopayStore for Database {
    async fn store(&self, user_address: &str, bill_details: serde_json::Value) -> Result<i64> {
        self.insert_autopay_bill(user_address, &bill_details).await
    }

    async fn list(&self, user_address: &str) -> Result<Vec<AutopayBill>> {
        self.list_autopay_bills(user_address).await
    }
}

/// Keeps enabled documents whose `dueDate` is exactly `today` (`YYYY-MM-DD`).
pub fn filter_due(bills: Vec<AutopayBill>, today: &str) -> Vec<AutopayBill> {
    bills
        .into_iter()
        .filter(|bill| bill.is_enabled() && bill.due_date() == Some(today))
        .collect()
}
