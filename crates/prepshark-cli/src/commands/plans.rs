use clap::Subcommand;
use prepshark_core::{Database, Subscriptions};
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum PlansAction {
    /// Write the built-in plan catalog
    Seed,
    /// Active plans ordered by price
    List,
}

pub fn run(action: PlansAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let subscriptions = Subscriptions::new(&db);

    match action {
        PlansAction::Seed => {
            let seeded = subscriptions.seed_catalog()?;
            print_json(&json!({ "seeded": seeded }))?;
        }
        PlansAction::List => {
            print_json(&subscriptions.plans()?)?;
        }
    }
    Ok(())
}
