use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::record::SubscriptionRecord;
use super::store::SubscriptionStore;
use super::tier::{Allowance, Feature, FeatureDecision, Tier, TierLimits};
use crate::catalog::FeedCatalog;
use crate::types::{NewsError, Result};

/// Length of one paid month.
pub const DAYS_PER_MONTH: i64 = 30;

/// Source of "now" for expiry and daily resets, in local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Read-only view of a user's tier, limits and today's usage.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitsSnapshot {
    pub tier: Tier,
    pub limits: TierLimits,
    pub current_usage: u32,
    pub expires_at: Option<NaiveDateTime>,
}

impl LimitsSnapshot {
    pub fn remaining_today(&self) -> u32 {
        self.limits.daily_articles.saturating_sub(self.current_usage)
    }
}

/// Entitlement decisions over a [`SubscriptionStore`].
///
/// Expiry and daily resets are applied lazily whenever a record is read.
/// Every operation runs under one lock, so read-modify-write cycles from
/// concurrent handlers never interleave.
pub struct SubscriptionManager {
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn SubscriptionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lock: Mutex::new(()),
        }
    }

    pub async fn get_tier(&self, user_id: &str) -> Tier {
        let _guard = self.lock.lock().await;
        self.tier_locked(user_id).await
    }

    /// Make the user premium for `months` * 30 days from now. Any previous
    /// expiry is replaced, not extended. Usage counters are kept.
    pub async fn upgrade(&self, user_id: &str, months: u32) -> Result<SubscriptionRecord> {
        if months == 0 {
            return Err(NewsError::InvalidInput(
                "upgrade needs at least one month".to_string(),
            ));
        }

        let _guard = self.lock.lock().await;
        let now = self.clock.now();
        let mut record = self
            .load(user_id)
            .await
            .unwrap_or_else(|| SubscriptionRecord::fresh(now.date()));

        record.tier = Tier::Premium;
        record.expires_at = Some(now + Duration::days(DAYS_PER_MONTH * i64::from(months)));
        record.upgraded_at = Some(now);
        record.months = Some(months);

        self.store.put(user_id, record.clone()).await?;
        info!("Upgraded user {} to premium for {} month(s)", user_id, months);
        Ok(record)
    }

    /// Today's usage record, created if absent and reset on a new day.
    pub async fn get_usage(&self, user_id: &str) -> SubscriptionRecord {
        let _guard = self.lock.lock().await;
        self.usage_locked(user_id).await
    }

    /// Count one delivered article. Returns the new daily count.
    pub async fn increment_usage(&self, user_id: &str) -> Result<u32> {
        let _guard = self.lock.lock().await;
        let mut record = self.usage_locked(user_id).await;
        record.daily_count = record.daily_count.saturating_add(1);
        let count = record.daily_count;

        self.store.put(user_id, record).await?;
        debug!("User {} has read {} article(s) today", user_id, count);
        Ok(count)
    }

    pub async fn check_feature(&self, user_id: &str, feature: Feature<'_>) -> FeatureDecision {
        let _guard = self.lock.lock().await;
        let tier = self.tier_locked(user_id).await;
        let daily_count = match feature {
            Feature::DailyLimit => self.usage_locked(user_id).await.daily_count,
            _ => 0,
        };
        tier.limits().decide(feature, daily_count)
    }

    /// Name-keyed variant of [`check_feature`](Self::check_feature). Unknown
    /// names, and membership checks without a value, are denied.
    pub async fn check_feature_named(
        &self,
        user_id: &str,
        name: &str,
        value: Option<&str>,
    ) -> FeatureDecision {
        match Feature::from_name(name, value) {
            Some(feature) => self.check_feature(user_id, feature).await,
            None => {
                debug!("Denying unknown feature '{}' for user {}", name, user_id);
                FeatureDecision::Denied
            }
        }
    }

    pub async fn get_limits(&self, user_id: &str) -> LimitsSnapshot {
        let _guard = self.lock.lock().await;
        let tier = self.tier_locked(user_id).await;
        let usage = self.usage_locked(user_id).await;

        LimitsSnapshot {
            tier,
            limits: tier.limits(),
            current_usage: usage.daily_count,
            expires_at: if tier.is_premium() { usage.expires_at } else { None },
        }
    }

    /// Catalog sources the user's tier may read, in catalog order.
    pub async fn available_sources(&self, user_id: &str, catalog: &FeedCatalog) -> Vec<String> {
        let allowance = self.get_tier(user_id).await.limits().sources;
        catalog
            .sources()
            .filter(|source| allowance.permits(source))
            .map(str::to_string)
            .collect()
    }

    pub async fn available_categories(&self, user_id: &str) -> Allowance {
        self.get_tier(user_id).await.limits().categories
    }

    /// Raw stored record, without lazy expiry or reset.
    pub async fn record(&self, user_id: &str) -> Option<SubscriptionRecord> {
        let _guard = self.lock.lock().await;
        self.load(user_id).await
    }

    /// Records whose stored tier is premium.
    pub async fn premium_users(&self) -> Result<Vec<(String, SubscriptionRecord)>> {
        let _guard = self.lock.lock().await;
        let records = self.store.list().await?;
        Ok(records
            .into_iter()
            .filter(|(_, record)| record.tier.is_premium())
            .collect())
    }

    /// Set a known user back to free. Returns false when the user has no
    /// record.
    pub async fn revoke(&self, user_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let Some(mut record) = self.load(user_id).await else {
            return Ok(false);
        };

        record.tier = Tier::Free;
        self.store.put(user_id, record).await?;
        info!("Revoked premium for user {}", user_id);
        Ok(true)
    }

    async fn load(&self, user_id: &str) -> Option<SubscriptionRecord> {
        match self.store.get(user_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Treating unreadable record for {} as absent: {}", user_id, e);
                None
            }
        }
    }

    /// Persist a lazily-applied change; a failed write is logged and the
    /// caller still gets its answer.
    async fn save_lazily(&self, user_id: &str, record: &SubscriptionRecord) {
        if let Err(e) = self.store.put(user_id, record.clone()).await {
            warn!("Failed to persist subscription update for {}: {}", user_id, e);
        }
    }

    async fn tier_locked(&self, user_id: &str) -> Tier {
        let Some(mut record) = self.load(user_id).await else {
            return Tier::Free;
        };

        let now = self.clock.now();
        if record.expire_if_due(now) {
            info!("Premium for user {} expired, downgrading to free", user_id);
            self.save_lazily(user_id, &record).await;
        }

        if record.is_premium_at(now) {
            Tier::Premium
        } else {
            Tier::Free
        }
    }

    async fn usage_locked(&self, user_id: &str) -> SubscriptionRecord {
        let today = self.clock.today();
        let (mut record, mut dirty) = match self.load(user_id).await {
            Some(record) => (record, false),
            None => (SubscriptionRecord::fresh(today), true),
        };

        if record.roll_day(today) {
            dirty = true;
        }
        if dirty {
            self.save_lazily(user_id, &record).await;
        }
        record
    }
}
