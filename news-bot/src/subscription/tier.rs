//! Subscription tiers and their static limit table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Tier::Premium)
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Free => FREE_LIMITS,
            Tier::Premium => PREMIUM_LIMITS,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which names of a kind (sources, categories) a tier may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    All,
    Only(&'static [&'static str]),
}

impl Allowance {
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Allowance::All => true,
            Allowance::Only(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Allowance::All)
    }
}

/// A feature whose access depends on the user's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature<'a> {
    Source(&'a str),
    Category(&'a str),
    AiSummaries,
    DailyLimit,
    SearchResults,
}

impl<'a> Feature<'a> {
    /// Resolve a feature by name. Membership checks need a value; unknown
    /// names resolve to `None`.
    pub fn from_name(name: &str, value: Option<&'a str>) -> Option<Self> {
        match name {
            "source" => value.map(Feature::Source),
            "category" => value.map(Feature::Category),
            "ai_summaries" => Some(Feature::AiSummaries),
            "daily_limit" => Some(Feature::DailyLimit),
            "search_results" => Some(Feature::SearchResults),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureDecision {
    Granted,
    Denied,
    /// Numeric cap for count-style features.
    Limit(u32),
}

impl FeatureDecision {
    pub fn is_granted(&self) -> bool {
        match self {
            FeatureDecision::Granted => true,
            FeatureDecision::Denied => false,
            FeatureDecision::Limit(n) => *n > 0,
        }
    }

    pub fn limit(&self) -> Option<u32> {
        match self {
            FeatureDecision::Limit(n) => Some(*n),
            _ => None,
        }
    }

    fn from_bool(granted: bool) -> Self {
        if granted {
            FeatureDecision::Granted
        } else {
            FeatureDecision::Denied
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub daily_articles: u32,
    pub sources: Allowance,
    pub categories: Allowance,
    pub ai_summaries: bool,
    pub search_results: u32,
}

pub const FREE_LIMITS: TierLimits = TierLimits {
    daily_articles: 10,
    sources: Allowance::Only(&["bbc", "guardian"]),
    categories: Allowance::Only(&["general", "world"]),
    ai_summaries: false,
    search_results: 3,
};

pub const PREMIUM_LIMITS: TierLimits = TierLimits {
    daily_articles: 100,
    sources: Allowance::All,
    categories: Allowance::All,
    ai_summaries: true,
    search_results: 10,
};

impl TierLimits {
    /// Decide `feature` given today's article count.
    pub fn decide(&self, feature: Feature<'_>, daily_count: u32) -> FeatureDecision {
        match feature {
            Feature::Source(name) => FeatureDecision::from_bool(self.sources.permits(name)),
            Feature::Category(name) => FeatureDecision::from_bool(self.categories.permits(name)),
            Feature::AiSummaries => FeatureDecision::from_bool(self.ai_summaries),
            Feature::DailyLimit => FeatureDecision::from_bool(daily_count < self.daily_articles),
            Feature::SearchResults => FeatureDecision::Limit(self.search_results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_is_restricted() {
        let limits = Tier::Free.limits();
        assert!(limits.decide(Feature::Source("bbc"), 0).is_granted());
        assert!(!limits.decide(Feature::Source("techcrunch"), 0).is_granted());
        assert!(limits.decide(Feature::Category("world"), 0).is_granted());
        assert!(!limits.decide(Feature::Category("technology"), 0).is_granted());
        assert_eq!(limits.decide(Feature::AiSummaries, 0), FeatureDecision::Denied);
        assert_eq!(limits.decide(Feature::SearchResults, 0), FeatureDecision::Limit(3));
    }

    #[test]
    fn premium_tier_is_unrestricted() {
        let limits = Tier::Premium.limits();
        assert!(limits.decide(Feature::Source("techcrunch"), 0).is_granted());
        assert!(limits.decide(Feature::Category("anything"), 0).is_granted());
        assert!(limits.decide(Feature::AiSummaries, 0).is_granted());
        assert_eq!(limits.decide(Feature::SearchResults, 0).limit(), Some(10));
    }

    #[test]
    fn daily_limit_is_a_strict_bound() {
        let limits = Tier::Free.limits();
        assert!(limits.decide(Feature::DailyLimit, 9).is_granted());
        assert!(!limits.decide(Feature::DailyLimit, 10).is_granted());
    }

    #[test]
    fn feature_names_resolve() {
        assert_eq!(Feature::from_name("source", Some("bbc")), Some(Feature::Source("bbc")));
        assert_eq!(Feature::from_name("source", None), None);
        assert_eq!(Feature::from_name("daily_limit", None), Some(Feature::DailyLimit));
        assert_eq!(Feature::from_name("teleport", None), None);
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Premium).unwrap(), "\"premium\"");
        let tier: Tier = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(tier, Tier::Free);
    }
}
