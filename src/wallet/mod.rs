//! Wallet session seam. Everything that needs the user's address or a
//! signature goes through [`WalletSession`] instead of reaching for a
//! global wallet object.

use async_trait::async_trait;

use crate::{
    aptos::EntryFunctionPayload,
    error::{AppError, Result},
};

#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn is_connected(&self) -> bool;

    async fn current_address(&self) -> Option<String>;

    /// Signs and submits `payload`, returning the transaction hash.
    async fn sign_and_submit(&self, payload: EntryFunctionPayload) -> Result<String>;
}

/// No wallet. Syncs are skipped and every write is refused.
pub struct DisconnectedSession;

#[async_trait]
impl WalletSession for DisconnectedSession {
    async fn is_connected(&self) -> bool {
        false
    }

    async fn current_address(&self) -> Option<String> {
        None
    }

    async fn sign_and_submit(&self, _payload: EntryFunctionPayload) -> Result<String> {
        Err(AppError::WalletUnavailable)
    }
}

/// Knows an address but holds no key: reads work, writes are refused.
pub struct WatchOnlySession {
    address: String,
}

impl WatchOnlySession {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: normalize_address(&address.into()),
        }
    }
}

#[async_trait]
impl WalletSession for WatchOnlySession {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn current_address(&self) -> Option<String> {
        Some(self.address.clone())
    }

    async fn sign_and_submit(&self, payload: EntryFunctionPayload) -> Result<String> {
        tracing::warn!(
            function = %payload.function,
            "watch-only session cannot sign transactions"
        );
        Err(AppError::WalletUnavailable)
    }
}

/// Session for the configured address, if any.
pub fn session_from_address(address: Option<&str>) -> std::sync::Arc<dyn WalletSession> {
    match address {
        Some(address) => std::sync::Arc::new(WatchOnlySession::new(address)),
        None => std::sync::Arc::new(DisconnectedSession),
    }
}

/// Lowercases and adds the `0x` prefix the contract expects.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim().to_ascii_lowercase();
    if trimmed.starts_with("0x") {
        trimmed
    } else {
        format!("0x{}", trimmed)
    }
}
