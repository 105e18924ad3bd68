//! Subscription plans, purchase records and entitlement resolution.

mod catalog;
pub mod entitlements;
mod service;

pub use catalog::default_catalog;
pub use entitlements::{is_active, resolve_active_plans, Capability, CapabilityTable, Entitlements};
pub use service::{EntitlementReport, Subscriptions};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Catalog key of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanKey {
    ChapterUnlock,
    DailyPractice,
    MockTestMaster,
    ChapterMockCombo,
    /// Top tier; holding it grants every capability through the catalog table.
    YearlyElite,
}

impl PlanKey {
    pub const ALL: [PlanKey; 5] = [
        PlanKey::ChapterUnlock,
        PlanKey::DailyPractice,
        PlanKey::MockTestMaster,
        PlanKey::ChapterMockCombo,
        PlanKey::YearlyElite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKey::ChapterUnlock => "CHAPTER_UNLOCK",
            PlanKey::DailyPractice => "DAILY_PRACTICE",
            PlanKey::MockTestMaster => "MOCK_TEST_MASTER",
            PlanKey::ChapterMockCombo => "CHAPTER_MOCK_COMBO",
            PlanKey::YearlyElite => "YEARLY_ELITE",
        }
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownPlan(s.to_string()))
    }
}

/// Static catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub key: PlanKey,
    pub name: String,
    pub description: String,
    /// Price in paise.
    pub price_paise: i64,
    pub duration_days: u32,
    pub features: Vec<Capability>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Expired => "EXPIRED",
            SubscriptionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "EXPIRED" => Some(SubscriptionStatus::Expired),
            "CANCELLED" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// A purchase record. Expiry is never written back to `status`; it is
/// computed from `expires_at` at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan: PlanKey,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_ref: String,
    pub amount_paise: i64,
}
