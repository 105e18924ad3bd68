//! Question bank records and the read-only pool the paper generator draws from.

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Parse a stored or imported value; unknown tiers fall back to medium.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "EASY" => Difficulty::Easy,
            "HARD" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    /// Id from the source data set, used to upsert on re-import.
    #[serde(default)]
    pub external_id: Option<String>,
    pub subject: String,
    pub chapter: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_pyq: bool,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A question as it appears in an import file, before it has a row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    #[serde(default)]
    pub external_id: Option<String>,
    pub subject: String,
    pub chapter: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_pyq: bool,
    #[serde(default)]
    pub year: Option<i32>,
}

impl NewQuestion {
    /// Reject questions whose answer index does not name an option.
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        if self.options.is_empty() {
            return Err(crate::error::ValidationError::MissingField("options"));
        }
        if self.correct_index as usize >= self.options.len() {
            return Err(crate::error::ValidationError::InvalidValue {
                field: "correct_index".into(),
                message: format!(
                    "{} is out of range for {} options",
                    self.correct_index,
                    self.options.len()
                ),
            });
        }
        Ok(())
    }

    /// Parse an import file holding either one question or an array of them.
    pub fn parse_batch(json: &str) -> serde_json::Result<Vec<NewQuestion>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Batch {
            Many(Vec<NewQuestion>),
            One(Box<NewQuestion>),
        }

        Ok(match serde_json::from_str(json)? {
            Batch::Many(questions) => questions,
            Batch::One(question) => vec![*question],
        })
    }
}

/// Whether list payloads carry the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerVisibility {
    Hidden,
    Exposed,
}

/// List-view payload for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub subject: String,
    pub chapter: String,
    pub difficulty: Difficulty,
    pub text: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub tags: Vec<String>,
    pub is_premium: bool,
    pub is_pyq: bool,
    pub year: Option<i32>,
}

impl QuestionSummary {
    pub fn from_question(question: &Question, visibility: AnswerVisibility) -> Self {
        let exposed = visibility == AnswerVisibility::Exposed;
        Self {
            id: question.id,
            subject: question.subject.clone(),
            chapter: question.chapter.clone(),
            difficulty: question.difficulty,
            text: question.text.clone(),
            options: question.options.clone(),
            correct_index: exposed.then_some(question.correct_index),
            explanation: exposed.then(|| question.explanation.clone()),
            tags: question.tags.clone(),
            is_premium: question.is_premium,
            is_pyq: question.is_pyq,
            year: question.year,
        }
    }
}

/// Read-only question lookup.
pub trait QuestionPool {
    /// Ids of every question in `subject`, matched case-insensitively, in
    /// ascending id order.
    fn question_ids_by_subject(&self, subject: &str) -> Result<Vec<i64>, DatabaseError>;

    /// Full records for `ids`. Unknown ids are skipped.
    fn questions_by_ids(&self, ids: &[i64]) -> Result<Vec<Question>, DatabaseError>;
}
