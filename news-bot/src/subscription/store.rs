//! Persistence for subscription records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::record::SubscriptionRecord;
use crate::types::Result;

/// Keyed storage of subscription records, one per user id.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;

    async fn put(&self, user_id: &str, record: SubscriptionRecord) -> Result<()>;

    async fn list(&self) -> Result<Vec<(String, SubscriptionRecord)>>;
}

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, SubscriptionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, record: SubscriptionRecord) -> Result<()> {
        self.records.write().await.insert(user_id.to_string(), record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, SubscriptionRecord)>> {
        let records = self.records.read().await;
        Ok(records.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// All records in one JSON object on disk, keyed by user id. The whole file
/// is rewritten on every `put`, through a temp file and a rename.
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, SubscriptionRecord>>,
}

impl JsonFileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) => decode_records(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No subscription file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!("Loaded {} subscription record(s) from {}", records.len(), path.display());
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &BTreeMap<String, SubscriptionRecord>) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, record: SubscriptionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let previous = records.insert(user_id.to_string(), record);

        if let Err(e) = self.persist(&records).await {
            // keep memory and disk in agreement
            match previous {
                Some(previous) => records.insert(user_id.to_string(), previous),
                None => records.remove(user_id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, SubscriptionRecord)>> {
        let records = self.records.read().await;
        Ok(records.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Decode the subscription file. Unreadable content, or any single record
/// that does not decode, is skipped rather than failing the load.
fn decode_records(content: &str) -> BTreeMap<String, SubscriptionRecord> {
    if content.trim().is_empty() {
        return BTreeMap::new();
    }

    let raw: BTreeMap<String, Value> = match serde_json::from_str(content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Subscription file is malformed, starting empty: {}", e);
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(user_id, value)| match serde_json::from_value(value) {
            Ok(record) => Some((user_id, record)),
            Err(e) => {
                warn!("Ignoring malformed subscription record for {}: {}", user_id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::tier::Tier;

    #[test]
    fn malformed_file_decodes_empty() {
        assert!(decode_records("{not json").is_empty());
        assert!(decode_records("[1, 2, 3]").is_empty());
        assert!(decode_records("").is_empty());
    }

    #[test]
    fn malformed_record_is_skipped() {
        let content = r#"{
            "1": {"tier": "premium", "expires_at": "2099-01-01T00:00:00"},
            "2": {"tier": "platinum"},
            "3": "garbage"
        }"#;
        let records = decode_records(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records["1"].tier, Tier::Premium);
    }

    #[tokio::test]
    async fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("subscriptions.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let record = SubscriptionRecord {
            daily_count: 3,
            ..Default::default()
        };
        store.put("42", record.clone()).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("42").await.unwrap(), Some(record));
        assert_eq!(reopened.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        std::fs::write(&path, "{{{{").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get("1").await.unwrap().is_none());

        store.put("1", SubscriptionRecord::default()).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"1\""));
    }
}
