//! Entitlement resolution.
//!
//! Resolution happens in two steps. [`resolve_active_plans`] is a pure
//! function from subscription records and an instant to the set of plan keys
//! held; it does not interpret plan hierarchy. [`Entitlements::evaluate`]
//! then expands held plans into capabilities through a single
//! [`CapabilityTable`], once per request, so every capability check reads the
//! same answer.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlanKey, Subscription, SubscriptionPlan, SubscriptionStatus};

/// A capability a plan can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ChapterUnlock,
    DailyPractice,
    MockTests,
    AdFree,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::ChapterUnlock,
        Capability::DailyPractice,
        Capability::MockTests,
        Capability::AdFree,
    ];
}

/// Chapters that stay open without a chapter plan, compared lowercase.
const FREE_CHAPTERS: &[&str] = &[
    // Physics
    "physical world",
    "units and measurements",
    "electric charges and fields",
    "electrostatic potential and capacitance",
    "electric potential and capacitance",
    // Chemistry
    "the solid state",
    "solid state",
    "some basic concepts of chemistry",
    "structure of atom",
    "solutions",
    // Zoology
    "human reproduction",
    "reproductive health",
    "animal kingdom",
    "structural organisation in animals",
    // Botany
    "reproduction in organisms",
    "sexual reproduction in flowering plants",
    "the living world",
    "biological classification",
];

/// A subscription counts iff it is ACTIVE and has not reached `expires_at`.
pub fn is_active(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    subscription.status == SubscriptionStatus::Active && subscription.expires_at > now
}

/// Plan keys with at least one active subscription. Overlapping records for
/// the same plan collapse into one key; no key implies another here.
pub fn resolve_active_plans(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> BTreeSet<PlanKey> {
    subscriptions
        .iter()
        .filter(|s| is_active(s, now))
        .map(|s| s.plan)
        .collect()
}

/// Maps each plan key to the capabilities it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    grants: BTreeMap<PlanKey, BTreeSet<Capability>>,
}

impl CapabilityTable {
    /// Build the table from catalog feature tags. Inactive catalog entries
    /// still grant their features to existing subscribers.
    pub fn from_catalog(plans: &[SubscriptionPlan]) -> Self {
        let grants = plans
            .iter()
            .map(|p| (p.key, p.features.iter().copied().collect()))
            .collect();
        Self { grants }
    }

    pub fn grants(&self, plan: PlanKey) -> impl Iterator<Item = Capability> + '_ {
        self.grants.get(&plan).into_iter().flatten().copied()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::from_catalog(&super::default_catalog())
    }
}

/// Resolved entitlements for one user at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    pub plans: BTreeSet<PlanKey>,
    pub capabilities: BTreeSet<Capability>,
}

impl Entitlements {
    pub fn evaluate(
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
        table: &CapabilityTable,
    ) -> Self {
        let plans = resolve_active_plans(subscriptions, now);
        let capabilities = plans.iter().flat_map(|p| table.grants(*p)).collect();
        Self { plans, capabilities }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn holds(&self, plan: PlanKey) -> bool {
        self.plans.contains(&plan)
    }

    /// Legacy premium flag: holds the top-tier plan.
    pub fn is_premium(&self) -> bool {
        self.holds(PlanKey::YearlyElite)
    }

    pub fn show_ads(&self) -> bool {
        !self.has(Capability::AdFree)
    }

    /// Whether `chapter` is locked for this user. Only meaningful when lock
    /// enforcement is switched on.
    pub fn chapter_locked(&self, chapter: &str, enforce: bool) -> bool {
        if !enforce || self.has(Capability::ChapterUnlock) {
            return false;
        }
        let chapter = chapter.trim().to_lowercase();
        !FREE_CHAPTERS.contains(&chapter.as_str())
    }
}
