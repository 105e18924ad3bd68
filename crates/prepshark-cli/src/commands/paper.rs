use chrono::Utc;
use clap::Subcommand;
use prepshark_core::{Config, DailyPractice, Database};

use super::{parse_date, print_json};

#[derive(Subcommand)]
pub enum PaperAction {
    /// Today's paper as question summaries
    Today {
        /// Paper size (25 or 50)
        #[arg(long, default_value_t = 25)]
        size: i64,
    },
    /// The paper for a given date, with its source and question ids
    Show {
        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: chrono::NaiveDate,
        /// Paper size (25 or 50)
        #[arg(long, default_value_t = 25)]
        size: i64,
        /// Print question summaries instead of ids
        #[arg(long)]
        questions: bool,
    },
}

pub fn run(action: PaperAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let practice = DailyPractice::new(&db, &config)?;
    let now = Utc::now();

    match action {
        PaperAction::Today { size } => {
            print_json(&practice.todays_paper(size, now)?)?;
        }
        PaperAction::Show {
            date,
            size,
            questions,
        } => {
            if questions {
                print_json(&practice.paper_questions(date, size, now)?)?;
            } else {
                print_json(&practice.paper(date, size, now)?)?;
            }
        }
    }
    Ok(())
}
