use std::path::PathBuf;

use clap::Subcommand;
use prepshark_core::{Config, Database, NewQuestion, QuestionPool, QuestionSummary};
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum QuestionsAction {
    /// Import questions from a JSON file (one object or an array)
    Import {
        file: PathBuf,
    },
    /// Count questions, optionally for one subject
    Count {
        #[arg(long)]
        subject: Option<String>,
    },
    /// Show questions by id
    Show {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

pub fn run(action: QuestionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        QuestionsAction::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
            let questions = NewQuestion::parse_batch(&content)?;
            print_json(&db.import_questions(&questions)?)?;
        }
        QuestionsAction::Count { subject } => {
            let count = db.question_count(subject.as_deref())?;
            print_json(&json!({ "subject": subject, "count": count }))?;
        }
        QuestionsAction::Show { ids } => {
            let visibility = Config::load()?.answer_visibility();
            let questions: Vec<QuestionSummary> = db
                .questions_by_ids(&ids)?
                .iter()
                .map(|q| QuestionSummary::from_question(q, visibility))
                .collect();
            print_json(&questions)?;
        }
    }
    Ok(())
}
