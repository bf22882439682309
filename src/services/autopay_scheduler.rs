use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::time::{interval, Duration};

use crate::{
    constants::AUTOPAY_SCHEDULER_INTERVAL_SECS, db::Database, error::Result, models::AutopayBill,
};

/// One AutoPay-enabled document as seen by the daily job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledAutopay {
    pub wallet: String,
    pub bill_id: String,
    pub payment_date: Option<u64>,
    pub due_date: Option<String>,
    pub due_today: bool,
}

/// Daily AutoPay job. It only reports what would be paid; payment itself
/// stays with the wallet holder.
pub struct AutopayScheduler {
    db: Database,
}

impl AutopayScheduler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Runs [`AutopayScheduler::run_once`] every day in the background.
    pub async fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(AUTOPAY_SCHEDULER_INTERVAL_SECS));

            loop {
                ticker.tick().await;

                if let Err(e) = self.run_once(Utc::now().date_naive()).await {
                    tracing::error!("AutoPay scheduler error: {}", e);
                }
            }
        });
    }

    pub async fn run_once(&self, today: NaiveDate) -> Result<Vec<ScheduledAutopay>> {
        let users = self.db.list_autopay_users().await?;
        if users.is_empty() {
            tracing::info!("No users found.");
            return Ok(Vec::new());
        }

        let mut scheduled = Vec::new();
        for wallet in users {
            let docs = self.db.list_autopay_bills(&wallet).await?;
            for entry in collect_enabled(&wallet, &docs, today) {
                tracing::info!(
                    wallet = %entry.wallet,
                    bill_id = %entry.bill_id,
                    payment_date = ?entry.payment_date,
                    due_date = ?entry.due_date,
                    due_today = entry.due_today,
                    "autopay bill scheduled"
                );
                scheduled.push(entry);
            }
        }

        tracing::info!("AutoPay scheduler found {} enabled bills", scheduled.len());
        Ok(scheduled)
    }
}

/// Enabled documents for one wallet. A bill enabled more than once is
/// reported from its newest document only.
pub fn collect_enabled(wallet: &str, docs: &[AutopayBill], today: NaiveDate) -> Vec<ScheduledAutopay> {
    let today = today.format("%Y-%m-%d").to_string();
    let mut newest_first: Vec<&AutopayBill> = docs.iter().collect();
    newest_first.sort_by_key(|doc| std::cmp::Reverse((doc.created_at, doc.id)));

    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();
    for doc in newest_first {
        let Some(bill_id) = doc.bill_id() else {
            continue;
        };
        if !seen.insert(bill_id.clone()) || !doc.is_enabled() {
            continue;
        }
        let due_date = doc.due_date().map(str::to_string);
        entries.push(ScheduledAutopay {
            wallet: wallet.to_string(),
            bill_id,
            payment_date: doc
                .bill_details
                .get("paymentDate")
                .and_then(crate::bills::units::parse_u64_value),
            due_today: due_date.as_deref() == Some(today.as_str()),
            due_date,
        });
    }
    entries
}
