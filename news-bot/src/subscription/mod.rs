//! Free/premium entitlements: tiers, per-user records and their storage.

pub mod manager;
pub mod record;
pub mod store;
pub mod tier;

pub use manager::{Clock, LimitsSnapshot, SubscriptionManager, SystemClock, DAYS_PER_MONTH};
pub use record::SubscriptionRecord;
pub use store::{JsonFileStore, MemoryStore, SubscriptionStore};
pub use tier::{Allowance, Feature, FeatureDecision, Tier, TierLimits, FREE_LIMITS, PREMIUM_LIMITS};
