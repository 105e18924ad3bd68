//! User profile and practice state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::StreakState;

/// Exam a user is preparing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    Jee,
    Neet,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Jee => "JEE",
            ExamType::Neet => "NEET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "JEE" => Some(ExamType::Jee),
            "NEET" => Some(ExamType::Neet),
            _ => None,
        }
    }
}

/// Display-only subscription tier. Entitlements are always derived from
/// subscription records, never from this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "FREE",
            SubscriptionTier::Premium => "PREMIUM",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "PREMIUM" => SubscriptionTier::Premium,
            _ => SubscriptionTier::Free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Identity id issued by the external identity provider.
    pub external_uid: String,
    pub email: String,
    pub name: String,
    pub exam_type: ExamType,
    pub subscription_tier: SubscriptionTier,
    #[serde(flatten)]
    pub streak: StreakState,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub external_uid: String,
    pub email: String,
    pub name: String,
    pub exam_type: ExamType,
}
