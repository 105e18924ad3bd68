use super::{Capability, PlanKey, SubscriptionPlan};

/// Built-in plan catalog, ordered by price.
///
/// | Plan | Price | Capabilities |
/// |------|-------|--------------|
/// | Chapter Wise Practice | 179 | chapter_unlock |
/// | Daily Practice | 249 | daily_practice, ad_free |
/// | Mock Test Master | 299 | mock_tests, ad_free |
/// | Chapter + Mock Combo | 449 | chapter_unlock, mock_tests, ad_free |
/// | Yearly Elite | 699 | all |
pub fn default_catalog() -> Vec<SubscriptionPlan> {
    vec![
        plan(
            PlanKey::ChapterUnlock,
            "Chapter Wise Practice",
            "Unlock all chapters for practice (Ad-Supported)",
            179,
            &[Capability::ChapterUnlock],
        ),
        plan(
            PlanKey::DailyPractice,
            "Daily Practice",
            "Daily practice questions (Ad-Free)",
            249,
            &[Capability::DailyPractice, Capability::AdFree],
        ),
        plan(
            PlanKey::MockTestMaster,
            "Mock Test Master",
            "Full length mock tests (Ad-Free)",
            299,
            &[Capability::MockTests, Capability::AdFree],
        ),
        plan(
            PlanKey::ChapterMockCombo,
            "Chapter + Mock Combo",
            "Chapters + Mock Tests (Ad-Free)",
            449,
            &[Capability::ChapterUnlock, Capability::MockTests, Capability::AdFree],
        ),
        plan(
            PlanKey::YearlyElite,
            "Yearly Elite",
            "All features unlocked (Ad-Free)",
            699,
            &Capability::ALL,
        ),
    ]
}

fn plan(
    key: PlanKey,
    name: &str,
    description: &str,
    rupees: i64,
    features: &[Capability],
) -> SubscriptionPlan {
    SubscriptionPlan {
        key,
        name: name.to_string(),
        description: description.to_string(),
        price_paise: rupees * 100,
        duration_days: 365,
        features: features.to_vec(),
        is_active: true,
    }
}
