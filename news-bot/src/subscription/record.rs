use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// Persisted subscription state of one user. Every field is optional on
/// disk; missing fields read as a free user with no usage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    #[serde(default)]
    pub daily_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<NaiveDate>,
}

impl SubscriptionRecord {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            last_reset: Some(today),
            ..Self::default()
        }
    }

    pub fn is_premium_at(&self, now: NaiveDateTime) -> bool {
        self.tier == Tier::Premium && self.expires_at.map_or(false, |expiry| now < expiry)
    }

    /// Drop an expired premium tier. Returns whether the record changed.
    pub fn expire_if_due(&mut self, now: NaiveDateTime) -> bool {
        if self.tier == Tier::Premium && !self.is_premium_at(now) {
            self.tier = Tier::Free;
            return true;
        }
        false
    }

    /// Zero the counter when `today` is a new day. Returns whether the
    /// record changed.
    pub fn roll_day(&mut self, today: NaiveDate) -> bool {
        if self.last_reset == Some(today) {
            return false;
        }
        self.daily_count = 0;
        self.last_reset = Some(today);
        true
    }
}
