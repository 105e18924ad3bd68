use chrono::Utc;
use clap::Subcommand;
use prepshark_core::{CoreError, Database, ExamType, NewUser};
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user, or return the existing one
    Register {
        /// External identity id
        uid: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// JEE or NEET
        #[arg(long, default_value = "NEET")]
        exam: String,
    },
    /// Show a user and their streak
    Show {
        uid: String,
    },
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        UserAction::Register {
            uid,
            email,
            name,
            exam,
        } => {
            let exam_type =
                ExamType::parse(&exam).ok_or_else(|| format!("unknown exam type: {exam}"))?;
            let new_user = NewUser {
                external_uid: uid,
                email,
                name,
                exam_type,
            };
            let (user, created) = db.register_user(&new_user, Utc::now())?;
            print_json(&json!({ "created": created, "user": user }))?;
        }
        UserAction::Show { uid } => {
            let user = db
                .find_user(&uid)?
                .ok_or_else(|| CoreError::not_found("user", uid.as_str()))?;
            print_json(&user)?;
        }
    }
    Ok(())
}
