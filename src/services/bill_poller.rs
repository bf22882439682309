use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, Duration, MissedTickBehavior},
};

use super::bill_sync::{BillSync, SyncOutcome};
use crate::constants::POLLER_STOP_GRACE_SECS;

/// Cloneable handle that runs a bill refresh unless one is already in flight.
#[derive(Clone)]
pub struct RefreshTrigger {
    sync: Arc<BillSync>,
    in_flight: Arc<AtomicBool>,
}

/// Periodic bill sync with at most one refresh in flight.
///
/// A tick (or [`RefreshTrigger::trigger`]) that lands while a refresh is
/// still running is dropped instead of queued, so overlapping syncs cannot
/// race each other on the board.
pub struct BillPoller {
    trigger: RefreshTrigger,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Clears the in-flight flag when a refresh finishes, even if it panics.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn guarded_refresh(sync: &BillSync, in_flight: &Arc<AtomicBool>) -> Option<SyncOutcome> {
    if in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        tracing::debug!("Bill refresh already in flight, skipping");
        return None;
    }
    let _guard = InFlightGuard(in_flight.clone());
    Some(sync.refresh().await)
}

impl RefreshTrigger {
    pub fn new(sync: Arc<BillSync>) -> Self {
        Self {
            sync,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Refreshes now unless a refresh is already running.
    pub async fn trigger(&self) -> Option<SyncOutcome> {
        guarded_refresh(&self.sync, &self.in_flight).await
    }

    /// Refreshes after `delay` in the background, e.g. to let the chain
    /// index a transaction that was just confirmed.
    pub fn trigger_after(&self, delay: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.trigger().await;
        });
    }
}

impl BillPoller {
    /// Starts polling. The first refresh runs immediately.
    pub fn start(trigger: RefreshTrigger, period: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task_trigger = trigger.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let stopping = tokio::select! {
                    _ = ticker.tick() => {
                        // A refresh in progress is dropped on shutdown, which
                        // also releases the in-flight flag.
                        tokio::select! {
                            _ = task_trigger.trigger() => false,
                            changed = shutdown_rx.changed() => {
                                changed.is_err() || *shutdown_rx.borrow()
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        changed.is_err() || *shutdown_rx.borrow()
                    }
                };
                if stopping {
                    break;
                }
            }
            tracing::info!("Bill poller stopped");
        });

        tracing::info!("Bill poller started ({}s interval)", period.as_secs());
        Self {
            trigger,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn trigger_handle(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the polling task and waits for it to exit. A refresh that is
    /// mid-flight is cancelled; a task still alive after the grace period is
    /// aborted.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        let grace = Duration::from_secs(POLLER_STOP_GRACE_SECS);
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Bill poller task failed: {}", e),
            Err(_) => {
                tracing::warn!(
                    "Bill poller did not stop within {}s, aborting",
                    POLLER_STOP_GRACE_SECS
                );
                handle.abort();
            }
        }
    }
}

impl Drop for BillPoller {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
