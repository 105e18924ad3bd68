//! Plan catalog, activation and entitlement lookups over the database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{
    default_catalog, CapabilityTable, Entitlements, PlanKey, Subscription, SubscriptionPlan,
    SubscriptionStatus,
};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::Database;
use crate::user::{SubscriptionTier, User};

/// Entitlement payload for one user at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementReport {
    #[serde(flatten)]
    pub entitlements: Entitlements,
    pub is_premium: bool,
    pub show_ads: bool,
}

impl From<Entitlements> for EntitlementReport {
    fn from(entitlements: Entitlements) -> Self {
        Self {
            is_premium: entitlements.is_premium(),
            show_ads: entitlements.show_ads(),
            entitlements,
        }
    }
}

pub struct Subscriptions<'a> {
    db: &'a Database,
}

impl<'a> Subscriptions<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Write the built-in catalog, updating entries that already exist.
    pub fn seed_catalog(&self) -> Result<usize> {
        let seeded = self.db.upsert_plans(&default_catalog())?;
        tracing::info!(plans = seeded, "seeded plan catalog");
        Ok(seeded)
    }

    /// Active plans ordered by price.
    pub fn plans(&self) -> Result<Vec<SubscriptionPlan>> {
        Ok(self.db.list_plans(true)?)
    }

    /// Capabilities per plan, from the stored catalog or the built-in one
    /// when nothing has been seeded.
    pub fn capability_table(&self) -> Result<CapabilityTable> {
        let stored = self.db.list_plans(false)?;
        if stored.is_empty() {
            return Ok(CapabilityTable::default());
        }
        Ok(CapabilityTable::from_catalog(&stored))
    }

    fn user(&self, user_uid: &str) -> Result<User> {
        self.db
            .find_user(user_uid)?
            .ok_or_else(|| CoreError::not_found("user", user_uid))
    }

    pub fn entitlements(&self, user_uid: &str, now: DateTime<Utc>) -> Result<EntitlementReport> {
        let user = self.user(user_uid)?;
        let subscriptions = self.db.subscriptions_for_user(user.id)?;
        let table = self.capability_table()?;
        Ok(Entitlements::evaluate(&subscriptions, now, &table).into())
    }

    /// Record a paid subscription. Payment verification happens upstream;
    /// `payment_ref` is the gateway's identifier for it.
    ///
    /// # Errors
    /// Returns a validation error for an unknown or retired plan or an empty
    /// payment reference, and not-found for an unknown user.
    pub fn activate(
        &self,
        user_uid: &str,
        plan: &str,
        payment_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription> {
        let key: PlanKey = plan.parse()?;
        if payment_ref.trim().is_empty() {
            return Err(ValidationError::MissingField("payment_ref").into());
        }

        let subscription = self.db.immediate(|db| {
            let user = self.user(user_uid)?;
            let plan = match db.find_plan(key)? {
                Some(plan) => plan,
                None => default_catalog()
                    .into_iter()
                    .find(|p| p.key == key)
                    .ok_or_else(|| ValidationError::UnknownPlan(key.to_string()))?,
            };
            if !plan.is_active {
                return Err(CoreError::from(ValidationError::InvalidValue {
                    field: "plan".into(),
                    message: format!("{key} is no longer offered"),
                }));
            }

            let expires_at = now + Duration::days(i64::from(plan.duration_days));
            let subscription = db.insert_subscription(
                user.id,
                key,
                SubscriptionStatus::Active,
                now,
                expires_at,
                payment_ref,
                plan.price_paise,
            )?;
            db.set_subscription_tier(user.id, SubscriptionTier::Premium)?;
            Ok(subscription)
        })?;

        tracing::info!(
            user = user_uid,
            plan = %key,
            expires_at = %subscription.expires_at,
            "activated subscription"
        );
        Ok(subscription)
    }

    /// Every subscription record of the user, newest first.
    pub fn list(&self, user_uid: &str) -> Result<Vec<Subscription>> {
        let user = self.user(user_uid)?;
        Ok(self.db.subscriptions_for_user(user.id)?)
    }
}
