pub mod autopay_client;
pub mod autopay_scheduler;
pub mod bill_actions;
pub mod bill_poller;
pub mod bill_sync;
pub mod local_cache;
pub mod notification_center;

pub use autopay_client::{AutopayClient, AutopayStore};
pub use autopay_scheduler::AutopayScheduler;
pub use bill_actions::BillActions;
pub use bill_poller::{BillPoller, RefreshTrigger};
pub use bill_sync::{BillBoard, BillSync};
pub use local_cache::LocalCache;
pub use notification_center::NotificationCenter;

use std::sync::Arc;
use tokio::time::Duration;

use crate::{
    aptos::{AptosClient, BillContract},
    config::Config,
    db::Database,
    wallet::session_from_address,
};

// Internal helper that checks conditions for `is_env_flag_enabled`.
pub(crate) fn is_env_flag_enabled(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
        })
        .unwrap_or(false)
}

/// Dashboard state shared with the HTTP handlers.
#[derive(Clone)]
pub struct Dashboard {
    pub board: BillBoard,
    pub notifications: NotificationCenter,
    pub actions: Arc<BillActions>,
}

/// Long-lived services owned by the server process.
pub struct BackgroundServices {
    pub dashboard: Dashboard,
    pub poller: BillPoller,
}

impl BackgroundServices {
    pub async fn shutdown(&mut self) {
        if !self.poller.is_running() {
            tracing::warn!("Bill poller had already exited");
        }
        self.poller.stop().await;
        tracing::info!("Background services stopped");
    }
}

/// Start all background services
pub async fn start_background_services(
    db: Database,
    config: Config,
) -> anyhow::Result<BackgroundServices> {
    tracing::info!("Starting background services...");

    let http_timeout = Duration::from_secs(config.http_timeout_secs);
    let ledger = Arc::new(AptosClient::new(config.aptos_node_url.clone(), http_timeout)?);
    let contract = BillContract::new(ledger, &config);
    let wallet = session_from_address(config.wallet_address.as_deref());
    let board = BillBoard::with_samples();
    let notifications = NotificationCenter::new();

    let sync = Arc::new(BillSync::new(contract.clone(), wallet.clone(), board.clone()));
    let poller = BillPoller::start(
        RefreshTrigger::new(sync),
        Duration::from_secs(config.bill_poll_interval_secs),
    );

    let cache = Arc::new(LocalCache::load(config.local_cache_path.clone()).await?);
    let remote: Arc<dyn AutopayStore> =
        Arc::new(AutopayClient::new(config.autopay_api_url.clone(), http_timeout)?);
    let actions = Arc::new(BillActions::new(
        contract,
        wallet.clone(),
        board.clone(),
        notifications.clone(),
        cache,
        remote,
        poller.trigger_handle(),
    ));

    if wallet.is_connected().await {
        let actions = actions.clone();
        tokio::spawn(async move {
            match actions.reconcile_autopay().await {
                Ok(report) if report.changed() => {
                    tracing::info!(?report, "AutoPay cache reconciled with store")
                }
                Ok(_) => tracing::debug!("AutoPay cache already matches store"),
                Err(e) => tracing::warn!("AutoPay reconciliation skipped: {}", e),
            }
        });
    }

    if is_env_flag_enabled("ENABLE_AUTOPAY_SCHEDULER") {
        let scheduler = Arc::new(AutopayScheduler::new(db.clone()));
        scheduler.start().await;
    } else {
        tracing::debug!("AutoPay scheduler disabled via ENABLE_AUTOPAY_SCHEDULER");
    }

    tracing::info!("All background services started successfully");
    Ok(BackgroundServices {
        dashboard: Dashboard {
            board,
            notifications,
            actions,
        },
        poller,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        aptos::contract::tests::FakeLedger, config::test_config,
        services::{autopay_client::tests::FakeStore, local_cache::tests::temp_cache_path},
        wallet::tests::FakeWallet,
    };

    /// Dashboard over fakes, with the sample bills on the board.
    pub(crate) async fn test_dashboard(name: &str, wallet: FakeWallet) -> (Dashboard, Arc<FakeLedger>) {
        let ledger = Arc::new(FakeLedger::default());
        let wallet = Arc::new(wallet);
        let contract = BillContract::new(ledger.clone(), &test_config());
        let board = BillBoard::with_samples();
        let notifications = NotificationCenter::new();

        let path = temp_cache_path(name);
        let _ = tokio::fs::remove_file(&path).await;
        let cache = Arc::new(LocalCache::load(path).await.unwrap());

        let sync = Arc::new(BillSync::new(contract.clone(), wallet.clone(), board.clone()));
        let actions = Arc::new(BillActions::new(
            contract,
            wallet,
            board.clone(),
            notifications.clone(),
            cache,
            Arc::new(FakeStore::default()),
            RefreshTrigger::new(sync),
        ));
        (
            Dashboard {
                board,
                notifications,
                actions,
            },
            ledger,
        )
    }

    #[test]
    fn env_flag_accepts_common_truthy_values() {
        std::env::set_var("PULSE_TEST_FLAG_ON", " Yes ");
        std::env::set_var("PULSE_TEST_FLAG_OFF", "0");
        assert!(is_env_flag_enabled("PULSE_TEST_FLAG_ON"));
        assert!(!is_env_flag_enabled("PULSE_TEST_FLAG_OFF"));
        assert!(!is_env_flag_enabled("PULSE_TEST_FLAG_MISSING"));
    }
}
