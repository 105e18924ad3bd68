use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use prepshark_core::{AttemptSubmission, Config, DailyPractice, Database, PracticeSize};

use super::{parse_date, print_json};

#[derive(Subcommand)]
pub enum PracticeAction {
    /// Submit a completed paper for today
    Submit {
        /// External identity id
        #[arg(long)]
        user: String,
        /// Paper size (25 or 50)
        #[arg(long)]
        size: i64,
        #[arg(long, allow_negative_numbers = true)]
        score: i32,
        #[arg(long, default_value_t = 0)]
        total: u32,
        #[arg(long, default_value_t = 0)]
        correct: u32,
    },
    /// Record a score against an explicit date
    Record {
        #[arg(long)]
        user: String,
        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        size: i64,
        #[arg(long, allow_negative_numbers = true)]
        score: i32,
    },
    /// Today's practice status and streak
    Status {
        #[arg(long)]
        user: String,
    },
    /// All attempts, newest first
    History {
        #[arg(long)]
        user: String,
    },
}

pub fn run(action: PracticeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let practice = DailyPractice::new(&db, &config)?;
    let now = Utc::now();

    match action {
        PracticeAction::Submit {
            user,
            size,
            score,
            total,
            correct,
        } => {
            let submission = AttemptSubmission::new(size, score, total, correct);
            print_json(&practice.submit(&user, &submission, now)?)?;
        }
        PracticeAction::Record {
            user,
            date,
            size,
            score,
        } => {
            let size = PracticeSize::try_from(size)?;
            print_json(&practice.record_attempt(&user, date, size, score, now)?)?;
        }
        PracticeAction::Status { user } => {
            print_json(&practice.status(&user, now)?)?;
        }
        PracticeAction::History { user } => {
            print_json(&practice.history(&user)?)?;
        }
    }
    Ok(())
}
