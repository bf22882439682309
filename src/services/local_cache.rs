use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::{AppError, Result},
    models::{AutoPayConfig, AutopayBill},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutopayUser {
    pub address: String,
    pub bill_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub hash: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub bill_count: u64,
}

/// On-disk layout, one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    #[serde(default)]
    pub autopay_configs: BTreeMap<String, AutoPayConfig>,
    #[serde(default)]
    pub autopay_users: Vec<AutopayUser>,
    #[serde(default)]
    pub batch_transaction_hashes: BTreeMap<String, Vec<BatchRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Bill ids whose local config differed from the store and was overwritten.
    pub repaired: Vec<String>,
    /// Bill ids present only in the store, now cached.
    pub added: Vec<String>,
    /// Bill ids cached locally that the store does not know about.
    pub local_only: Vec<String>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.repaired.is_empty() || !self.added.is_empty()
    }
}

/// Per-device cache of AutoPay state. The off-chain store stays the source
/// of truth; see [`LocalCache::reconcile`].
pub struct LocalCache {
    path: PathBuf,
    doc: Mutex<CacheDocument>,
}

fn io_error(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("local cache {}: {}", path.display(), e))
}

impl LocalCache {
    /// Opens the cache at `path`. A missing file starts empty, an unreadable
    /// one is logged and discarded.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Discarding corrupt local cache {}: {}", path.display(), e);
                CacheDocument::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheDocument::default(),
            Err(e) => return Err(io_error(&path, e)),
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(&self, doc: &CacheDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&self.path, e))?;
        }
        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| io_error(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn document(&self) -> CacheDocument {
        self.doc.lock().await.clone()
    }

    pub async fn autopay_config(&self, bill_id: &str) -> Option<AutoPayConfig> {
        self.doc.lock().await.autopay_configs.get(bill_id).cloned()
    }

    pub async fn save_autopay_config(&self, config: AutoPayConfig) -> Result<()> {
        let mut doc = self.doc.lock().await;
        doc.autopay_configs.insert(config.bill_id.clone(), config);
        self.persist(&doc).await
    }

    pub async fn record_autopay_user(&self, address: &str, bill_id: &str) -> Result<()> {
        let mut doc = self.doc.lock().await;
        doc.autopay_users.push(AutopayUser {
            address: address.to_string(),
            bill_id: bill_id.to_string(),
        });
        self.persist(&doc).await
    }

    pub async fn record_batch(&self, address: &str, hash: &str, bill_count: u64) -> Result<()> {
        let mut doc = self.doc.lock().await;
        doc.batch_transaction_hashes
            .entry(address.to_string())
            .or_default()
            .push(BatchRecord {
                hash: hash.to_string(),
                timestamp: chrono::Utc::now().timestamp_millis(),
                bill_count,
            });
        self.persist(&doc).await
    }

    pub async fn batches(&self, address: &str) -> Vec<BatchRecord> {
        self.doc
            .lock()
            .await
            .batch_transaction_hashes
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Brings the cached AutoPay configs in line with the store's documents.
    /// The newest document per bill wins; documents whose details do not
    /// parse as a config are ignored.
    pub async fn reconcile(&self, remote: &[AutopayBill]) -> Result<ReconcileReport> {
        let mut ordered: Vec<&AutopayBill> = remote.iter().collect();
        ordered.sort_by_key(|d| (d.created_at, d.id));

        let mut latest: BTreeMap<String, AutoPayConfig> = BTreeMap::new();
        for doc in ordered {
            match serde_json::from_value::<AutoPayConfig>(doc.bill_details.clone()) {
                Ok(config) => {
                    latest.insert(config.bill_id.clone(), config);
                }
                Err(e) => tracing::debug!("Ignoring autopay document {}: {}", doc.id, e),
            }
        }

        let mut doc = self.doc.lock().await;
        let mut report = ReconcileReport::default();

        for (bill_id, config) in latest.iter() {
            match doc.autopay_configs.get(bill_id) {
                Some(local) if local == config => {}
                Some(_) => {
                    report.repaired.push(bill_id.clone());
                    doc.autopay_configs.insert(bill_id.clone(), config.clone());
                }
                None => {
                    report.added.push(bill_id.clone());
                    doc.autopay_configs.insert(bill_id.clone(), config.clone());
                }
            }
        }
        report.local_only = doc
            .autopay_configs
            .keys()
            .filter(|id| !latest.contains_key(*id))
            .cloned()
            .collect();

        if report.changed() {
            self.persist(&doc).await?;
            tracing::info!(
                repaired = report.repaired.len(),
                added = report.added.len(),
                "local autopay cache repaired from store"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Frequency;
    use chrono::{Duration, Utc};

    pub(crate) fn temp_cache_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pulse-cache-{}-{}", name, std::process::id()))
            .join("cache.json")
    }

    fn config(bill_id: &str, day: u8) -> AutoPayConfig {
        AutoPayConfig {
            bill_id: bill_id.to_string(),
            payment_date: day,
            frequency: Frequency::Monthly,
            max_amount: 10.0,
            enabled: true,
        }
    }

    fn remote(id: i64, age_secs: i64, config: &AutoPayConfig) -> AutopayBill {
        let mut details = serde_json::to_value(config).unwrap();
        details["service"] = serde_json::json!("Rent");
        AutopayBill {
            id,
            user_address: "0xabc".to_string(),
            bill_details: details,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let path = temp_cache_path("reload");
        let _ = tokio::fs::remove_file(&path).await;

        let cache = LocalCache::load(&path).await.unwrap();
        cache.save_autopay_config(config("1", 5)).await.unwrap();
        cache.record_autopay_user("0xabc", "1").await.unwrap();
        cache.record_batch("0xabc", "0xhash", 3).await.unwrap();

        let reloaded = LocalCache::load(&path).await.unwrap();
        assert_eq!(reloaded.autopay_config("1").await, Some(config("1", 5)));
        assert_eq!(reloaded.document().await.autopay_users.len(), 1);
        assert_eq!(reloaded.batches("0xabc").await[0].bill_count, 3);
        assert!(reloaded.batches("0xother").await.is_empty());
    }

    #[tokio::test]
    async fn reconcile_prefers_newest_remote_document() {
        let path = temp_cache_path("reconcile");
        let _ = tokio::fs::remove_file(&path).await;

        let cache = LocalCache::load(&path).await.unwrap();
        cache.save_autopay_config(config("1", 5)).await.unwrap();
        cache.save_autopay_config(config("9", 1)).await.unwrap();

        let docs = vec![
            remote(2, 10, &config("1", 20)),
            remote(1, 100, &config("1", 12)),
            remote(3, 5, &config("2", 3)),
            AutopayBill {
                id: 4,
                user_address: "0xabc".to_string(),
                bill_details: serde_json::json!({"note": "not a config"}),
                created_at: Utc::now(),
            },
        ];
        let report = cache.reconcile(&docs).await.unwrap();

        assert_eq!(report.repaired, vec!["1".to_string()]);
        assert_eq!(report.added, vec!["2".to_string()]);
        assert_eq!(report.local_only, vec!["9".to_string()]);
        assert_eq!(cache.autopay_config("1").await.unwrap().payment_date, 20);

        let again = cache.reconcile(&docs).await.unwrap();
        assert!(!again.changed());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_cache_path("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let cache = LocalCache::load(&path).await.unwrap();
        assert_eq!(cache.document().await, CacheDocument::default());
    }
}
