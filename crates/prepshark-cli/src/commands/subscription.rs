use chrono::Utc;
use clap::Subcommand;
use prepshark_core::{Config, Database, Subscriptions};
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Record a verified payment for a plan
    Activate {
        #[arg(long)]
        user: String,
        /// Plan key (e.g. DAILY_PRACTICE)
        #[arg(long)]
        plan: String,
        /// Payment gateway reference
        #[arg(long)]
        payment_ref: String,
    },
    /// Every subscription record of a user
    List {
        #[arg(long)]
        user: String,
    },
    /// Active plans and capabilities
    Entitlements {
        #[arg(long)]
        user: String,
        /// Also report lock status for this chapter
        #[arg(long)]
        chapter: Option<String>,
    },
}

pub fn run(action: SubscriptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let subscriptions = Subscriptions::new(&db);
    let now = Utc::now();

    match action {
        SubscriptionAction::Activate {
            user,
            plan,
            payment_ref,
        } => {
            print_json(&subscriptions.activate(&user, &plan, &payment_ref, now)?)?;
        }
        SubscriptionAction::List { user } => {
            print_json(&subscriptions.list(&user)?)?;
        }
        SubscriptionAction::Entitlements { user, chapter } => {
            let report = subscriptions.entitlements(&user, now)?;
            match chapter {
                Some(chapter) => {
                    let enforce = Config::load()?.entitlements.enforce_chapter_locks;
                    let locked = report.entitlements.chapter_locked(&chapter, enforce);
                    let mut value = serde_json::to_value(&report)?;
                    value["chapter"] = json!({ "name": chapter, "locked": locked });
                    print_json(&value)?;
                }
                None => print_json(&report)?,
            }
        }
    }
    Ok(())
}
