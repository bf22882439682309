use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;

use super::{
    autopay_client::AutopayStore,
    bill_poller::RefreshTrigger,
    bill_sync::BillBoard,
    local_cache::{BatchRecord, LocalCache, ReconcileReport},
    notification_center::NotificationCenter,
};
use crate::{
    aptos::{BillContract, EntryFunctionPayload},
    bills::{apt_to_octas, octas_to_apt, units::format_apt},
    constants::{
        DEFAULT_DUE_IN_DAYS, GAS_ESTIMATE_PER_BILL_APT, PAYEE_CHECK_LIMIT,
        POST_SUBMIT_REFRESH_DELAY_SECS, STATUS_CODE_AUTOPAY, STATUS_CODE_PENDING,
    },
    error::{AppError, Result},
    models::{AutoPayConfig, Bill, BillStatus, NewBillForm, NotificationType},
    wallet::{normalize_address, WalletSession},
};

#[derive(Debug, Clone, Serialize)]
pub struct AutopayOutcome {
    pub config: AutoPayConfig,
    pub onchain_hash: Option<String>,
    pub onchain_error: Option<String>,
    pub stored_id: Option<i64>,
    pub store_error: Option<String>,
}

/// An AutoPay-enabled bill with the config it will be paid under.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutopayBillView {
    pub bill: Bill,
    pub config: AutoPayConfig,
    /// False when `config` is the fallback rather than a saved one.
    pub configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPaymentReceipt {
    pub hash: String,
    pub bill_count: u64,
    pub total_apt: f64,
    pub gas_estimate_apt: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub address: String,
    pub balance_apt: f64,
    pub locked_apt: f64,
    pub history: Vec<Value>,
    pub batches: Vec<BatchRecord>,
}

/// Unix seconds for a `YYYY-MM-DD` due date (UTC midnight), or 30 days out.
pub fn due_timestamp(due_date: Option<&str>) -> Result<u64> {
    let due = match due_date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("Invalid due date: {}", text)))?
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| AppError::BadRequest(format!("Invalid due date: {}", text)))?,
        None => Utc::now() + ChronoDuration::days(DEFAULT_DUE_IN_DAYS),
    };
    u64::try_from(due.timestamp())
        .map_err(|_| AppError::BadRequest("Due date must be after 1970-01-01".to_string()))
}

/// AutoPay config plus the bill fields the store keeps alongside it.
pub fn autopay_document(config: &AutoPayConfig, bill: &Bill) -> Value {
    let mut details = serde_json::to_value(config).unwrap_or_else(|_| serde_json::json!({}));
    if let Value::Object(map) = &mut details {
        map.insert("service".to_string(), Value::from(bill.service.clone()));
        map.insert("amount".to_string(), Value::from(bill.amount));
        map.insert("category".to_string(), Value::from(bill.category.clone()));
        map.insert(
            "payee".to_string(),
            bill.payee.clone().map(Value::from).unwrap_or(Value::Null),
        );
        map.insert("dueDate".to_string(), Value::from(bill.due_date.clone()));
    }
    details
}

/// User-initiated bill operations: each one signs through the wallet session,
/// waits for the chain, then updates the board, cache and notifications.
pub struct BillActions {
    contract: BillContract,
    wallet: Arc<dyn WalletSession>,
    board: BillBoard,
    notifications: NotificationCenter,
    cache: Arc<LocalCache>,
    remote: Arc<dyn AutopayStore>,
    refresh: RefreshTrigger,
}

impl BillActions {
    pub fn new(
        contract: BillContract,
        wallet: Arc<dyn WalletSession>,
        board: BillBoard,
        notifications: NotificationCenter,
        cache: Arc<LocalCache>,
        remote: Arc<dyn AutopayStore>,
        refresh: RefreshTrigger,
    ) -> Self {
        Self {
            contract,
            wallet,
            board,
            notifications,
            cache,
            remote,
            refresh,
        }
    }

    async fn require_address(&self) -> Result<String> {
        if !self.wallet.is_connected().await {
            return Err(AppError::WalletUnavailable);
        }
        self.wallet
            .current_address()
            .await
            .ok_or(AppError::WalletUnavailable)
    }

    async fn submit_and_wait(&self, payload: EntryFunctionPayload) -> Result<String> {
        tracing::info!(function = %payload.function, "requesting wallet signature");
        let hash = self.wallet.sign_and_submit(payload).await?;
        if hash.is_empty() {
            return Err(AppError::BlockchainRPC(
                "Transaction failed - no hash returned".to_string(),
            ));
        }
        self.contract.ledger().wait_for_transaction(&hash).await?;
        Ok(hash)
    }

    fn schedule_refresh(&self) {
        self.refresh
            .trigger_after(Duration::from_secs(POST_SUBMIT_REFRESH_DELAY_SECS));
    }

    /// Submits `add_bill` for a new pending bill and schedules a resync.
    pub async fn add_bill(&self, form: NewBillForm) -> Result<String> {
        let description = form.description.trim();
        let payee = form.address.trim();
        if description.is_empty() || payee.is_empty() || !is_positive(form.amount) {
            return Err(AppError::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }
        self.require_address().await?;

        let amount_octas = apt_to_octas(form.amount)?;
        let due_date = due_timestamp(form.due_date.as_deref())?;
        let payee = normalize_address(payee);

        let payload = self.contract.add_bill_payload(
            description,
            amount_octas,
            &payee,
            due_date,
            0,
            STATUS_CODE_PENDING,
        )?;
        let hash = self.submit_and_wait(payload).await?;

        self.notifications
            .push(
                NotificationType::Success,
                "Bill Added to Blockchain",
                format!(
                    "{} for {} has been added. Hash: {}",
                    description,
                    format_apt(form.amount, 4),
                    short_hash(&hash)
                ),
            )
            .await;
        self.schedule_refresh();
        Ok(hash)
    }

    /// Enables AutoPay for a bill on the board.
    ///
    /// The bill is patched optimistically, the config is cached locally, and
    /// then the contract status update and the store write are issued
    /// independently; a failure of either is reported in the outcome and
    /// notified, not rolled back.
    pub async fn enable_autopay(&self, config: AutoPayConfig) -> Result<AutopayOutcome> {
        let bill = self
            .board
            .get(&config.bill_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Bill {} not found", config.bill_id)))?;
        let config = config.normalized_for(bill.amount)?;

        self.board
            .set_status(&bill.id, BillStatus::AutoPayEnabled)
            .await;

        if let Err(e) = self.cache.save_autopay_config(config.clone()).await {
            tracing::warn!("Failed to cache autopay config: {}", e);
        }
        let address = self.wallet.current_address().await;
        if let Some(address) = address.as_deref() {
            if let Err(e) = self.cache.record_autopay_user(address, &bill.id).await {
                tracing::warn!("Failed to store user address and billId: {}", e);
            }
        }

        let mut outcome = AutopayOutcome {
            config: config.clone(),
            onchain_hash: None,
            onchain_error: None,
            stored_id: None,
            store_error: None,
        };

        let onchain = match self.require_address().await {
            Ok(_) => match self
                .contract
                .update_bill_status_payload(&bill.id, STATUS_CODE_AUTOPAY)
            {
                Ok(payload) => self.submit_and_wait(payload).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        match onchain {
            Ok(hash) => outcome.onchain_hash = Some(hash),
            Err(e) => {
                tracing::error!("Error updating AutoPay status in contract: {}", e);
                self.notifications
                    .push(
                        NotificationType::Error,
                        "AutoPay Update Failed",
                        format!("Error updating AutoPay status: {}", e),
                    )
                    .await;
                outcome.onchain_error = Some(e.to_string());
            }
        }

        if let Some(address) = address.as_deref() {
            match self
                .remote
                .store(address, autopay_document(&config, &bill))
                .await
            {
                Ok(id) => outcome.stored_id = Some(id),
                Err(e) => {
                    tracing::error!("Failed to store autopay bill: {}", e);
                    outcome.store_error = Some(e.to_string());
                }
            }
        }

        self.notifications
            .push(
                NotificationType::Success,
                "AutoPay Enabled",
                format!(
                    "AutoPay has been enabled for {} on day {} ({:?})",
                    bill.service, config.payment_date, config.frequency
                ),
            )
            .await;

        Ok(outcome)
    }

    /// Pays every pending bill from locked funds in one group transaction.
    pub async fn pay_all_pending(&self) -> Result<GroupPaymentReceipt> {
        match self.pay_all_pending_inner().await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::error!("One click pay error: {}", e);
                self.notifications
                    .push(NotificationType::Error, "Payment Failed", e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    async fn pay_all_pending_inner(&self) -> Result<GroupPaymentReceipt> {
        let user = self.require_address().await?;

        let (total_octas, bill_count) = self.contract.get_pending_bills_total(&user).await?;
        if bill_count == 0 {
            return Err(AppError::BadRequest("No pending bills found".to_string()));
        }

        let total_apt = octas_to_apt(total_octas);
        let gas_estimate_apt = bill_count as f64 * GAS_ESTIMATE_PER_BILL_APT;
        let needed = total_apt + gas_estimate_apt;
        let locked = octas_to_apt(self.contract.get_locked_funds(&user).await?);
        tracing::info!(
            user = %user,
            bill_count,
            total_apt,
            gas_estimate_apt,
            locked,
            "checking locked funds for group payment"
        );
        if locked < needed {
            return Err(AppError::InsufficientLockedFunds { needed, locked });
        }

        self.log_payee_balances("before").await;
        let hash = self
            .submit_and_wait(self.contract.pay_all_pending_bills_payload()?)
            .await?;
        self.log_payee_balances("after").await;

        if let Err(e) = self.cache.record_batch(&user, &hash, bill_count).await {
            tracing::warn!("Failed to record batch transaction hash: {}", e);
        }

        self.notifications
            .push(
                NotificationType::Success,
                "Group Payment Complete",
                format!(
                    "Successfully paid {} pending bills using locked funds. Hash: {}",
                    bill_count,
                    short_hash(&hash)
                ),
            )
            .await;
        self.schedule_refresh();

        Ok(GroupPaymentReceipt {
            hash,
            bill_count,
            total_apt,
            gas_estimate_apt,
        })
    }

    // Diagnostics only; lookup failures are logged and ignored.
    async fn log_payee_balances(&self, stage: &str) {
        let pending = self.board.filter(Some(BillStatus::Pending)).await;
        for bill in pending.iter().take(PAYEE_CHECK_LIMIT) {
            let Some(payee) = bill.payee.as_deref() else {
                continue;
            };
            let initialized = self.contract.is_address_initialized(payee).await;
            let balance = self.contract.get_apt_balance(payee).await;
            match (initialized, balance) {
                (Ok(initialized), Ok(balance)) => tracing::debug!(
                    stage,
                    payee,
                    initialized,
                    balance_apt = octas_to_apt(balance),
                    "payee balance"
                ),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Error checking payee {}: {}", payee, e)
                }
            }
        }
    }

    /// Moves `amount_apt` into the contract's locked-funds escrow.
    pub async fn lock_funds(&self, amount_apt: f64) -> Result<String> {
        if !is_positive(amount_apt) {
            return Err(AppError::BadRequest(
                "Please enter a valid amount".to_string(),
            ));
        }
        self.require_address().await?;
        let payload = self.contract.lock_funds_payload(apt_to_octas(amount_apt)?)?;
        let hash = self.submit_and_wait(payload).await?;
        self.notifications
            .push(
                NotificationType::Success,
                "Funds Locked",
                format!("Locked {} for bill payments", format_apt(amount_apt, 4)),
            )
            .await;
        Ok(hash)
    }

    /// Local-only status patch after a UI payment.
    pub async fn mark_paid(&self, bill_id: &str) -> bool {
        let patched = self.board.set_status(bill_id, BillStatus::Paid).await;
        if patched {
            tracing::debug!(bill_id, status = BillStatus::Paid.code(), "bill marked paid locally");
            self.notifications
                .push(
                    NotificationType::Success,
                    "Payment Successful",
                    "Bill payment completed successfully",
                )
                .await;
        }
        patched
    }

    /// AutoPay-enabled bills on the board, each with its cached config or
    /// the fallback when none was saved on this device.
    pub async fn autopay_bills(&self) -> Vec<AutopayBillView> {
        let mut views = Vec::new();
        for bill in self.board.filter(Some(BillStatus::AutoPayEnabled)).await {
            let (config, configured) = match self.cache.autopay_config(&bill.id).await {
                Some(config) => (config, true),
                None => {
                    tracing::debug!(bill_id = %bill.id, "using default autopay config");
                    (AutoPayConfig::fallback_for(&bill), false)
                }
            };
            views.push(AutopayBillView {
                bill,
                config,
                configured,
            });
        }
        views
    }

    pub async fn profile_summary(&self) -> Result<ProfileSummary> {
        let address = self.require_address().await?;
        let balance = self.contract.get_user_balance(&address).await?;
        let locked = self.contract.get_locked_funds(&address).await?;
        let history = self.contract.get_user_transaction_history(&address).await?;
        let batches = self.cache.batches(&address).await;
        Ok(ProfileSummary {
            address,
            balance_apt: octas_to_apt(balance),
            locked_apt: octas_to_apt(locked),
            history,
            batches,
        })
    }

    pub async fn bill_transactions(&self, bill_id: &str) -> Result<Vec<Value>> {
        let address = self.require_address().await?;
        self.contract.get_bill_transactions(&address, bill_id).await
    }

    /// Re-reads the store and repairs the local AutoPay cache from it.
    pub async fn reconcile_autopay(&self) -> Result<ReconcileReport> {
        let address = self.require_address().await?;
        let remote = self.remote.list(&address).await?;
        self.cache.reconcile(&remote).await
    }
}

fn is_positive(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

fn short_hash(hash: &str) -> String {
    let prefix: String = hash.chars().take(10).collect();
    format!("{}...", prefix)
}
