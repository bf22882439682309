use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    aptos::BillContract,
    bills::{normalize_batch, samples::sample_bills},
    error::Result,
    models::{Bill, BillStatus},
    wallet::WalletSession,
};

/// The bill collection the dashboard renders. Replaced wholesale by a
/// sync, patched in place by optimistic UI actions.
#[derive(Clone)]
pub struct BillBoard {
    bills: Arc<RwLock<Vec<Bill>>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub paid: usize,
    pub autopay: usize,
}

impl BillBoard {
    pub fn new(bills: Vec<Bill>) -> Self {
        Self {
            bills: Arc::new(RwLock::new(bills)),
        }
    }

    /// Board seeded with the sample bills.
    pub fn with_samples() -> Self {
        Self::new(sample_bills())
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> Vec<Bill> {
        self.bills.read().await.clone()
    }

    pub async fn get(&self, bill_id: &str) -> Option<Bill> {
        self.bills
            .read()
            .await
            .iter()
            .find(|b| b.id == bill_id)
            .cloned()
    }

    pub async fn replace(&self, bills: Vec<Bill>) {
        *self.bills.write().await = bills;
    }

    pub async fn clear(&self) {
        self.bills.write().await.clear();
    }

    /// Sets a bill's status. Returns false if the bill is not on the board.
    pub async fn set_status(&self, bill_id: &str, status: BillStatus) -> bool {
        let mut bills = self.bills.write().await;
        match bills.iter_mut().find(|b| b.id == bill_id) {
            Some(bill) => {
                bill.status = status;
                if status == BillStatus::Paid {
                    bill.last_paid = Some(Utc::now().date_naive().format("%Y-%m-%d").to_string());
                }
                true
            }
            None => false,
        }
    }

    pub async fn filter(&self, status: Option<BillStatus>) -> Vec<Bill> {
        self.bills
            .read()
            .await
            .iter()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect()
    }

    pub async fn status_counts(&self) -> StatusCounts {
        let bills = self.bills.read().await;
        let mut counts = StatusCounts {
            total: bills.len(),
            ..StatusCounts::default()
        };
        for bill in bills.iter() {
            match bill.status {
                BillStatus::Pending => counts.pending += 1,
                BillStatus::Paid => counts.paid += 1,
                BillStatus::AutoPayEnabled => counts.autopay += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoWallet,
    ContractNotConfigured,
}

/// What a single refresh did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Preconditions not met; board untouched.
    Skipped(SkipReason),
    /// Board replaced by this many normalized bills.
    Replaced(usize),
    /// Contract reported no bills; board emptied.
    Cleared,
    /// Query failed; board untouched.
    Failed(String),
}

/// Pulls the user's bills from the contract into a [`BillBoard`].
pub struct BillSync {
    contract: BillContract,
    wallet: Arc<dyn WalletSession>,
    board: BillBoard,
}

impl BillSync {
    pub fn new(contract: BillContract, wallet: Arc<dyn WalletSession>, board: BillBoard) -> Self {
        Self {
            contract,
            wallet,
            board,
        }
    }

    #[cfg(test)]
    pub(crate) fn board(&self) -> &BillBoard {
        &self.board
    }

    /// Runs one sync. Never fails outward: every error is logged and leaves
    /// the board as it was.
    pub async fn refresh(&self) -> SyncOutcome {
        let user = match self.connected_address().await {
            Some(user) => user,
            None => {
                tracing::debug!("No wallet address found, keeping current bills");
                return SyncOutcome::Skipped(SkipReason::NoWallet);
            }
        };

        if !self.contract.is_configured() {
            tracing::debug!("Module address not configured, keeping current bills");
            return SyncOutcome::Skipped(SkipReason::ContractNotConfigured);
        }

        match self.fetch(&user).await {
            Ok(Some(bills)) => {
                let count = bills.len();
                self.board.replace(bills).await;
                tracing::info!(user = %user, count, "bills synced from contract");
                SyncOutcome::Replaced(count)
            }
            Ok(None) => {
                tracing::info!(user = %user, "no bills found in contract");
                self.board.clear().await;
                SyncOutcome::Cleared
            }
            Err(e) => {
                tracing::error!("Error fetching bills from smart contract: {}", e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn connected_address(&self) -> Option<String> {
        if !self.wallet.is_connected().await {
            return None;
        }
        self.wallet.current_address().await
    }

    async fn fetch(&self, user: &str) -> Result<Option<Vec<Bill>>> {
        let result = self.contract.get_user_bills(user).await?;
        match result.first() {
            Some(Value::Array(records)) if !records.is_empty() => {
                Ok(Some(normalize_batch(records, Utc::now().date_naive())))
            }
            _ => Ok(None),
        }
    }
}
