//! Per-day practice attempts. One record per (user, date, size); the stored
//! score only ever goes up.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::PracticeSize;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPracticeAttempt {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub practice_type: PracticeSize,
    pub is_completed: bool,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

impl DailyPracticeAttempt {
    /// The score to store after a new submission, or `None` when the
    /// submission does not beat the stored best.
    pub fn improved_score(&self, submitted: i32) -> Option<i32> {
        (submitted > self.score).then_some(submitted)
    }
}

/// A completed paper as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSubmission {
    #[serde(rename = "type")]
    pub size: Option<i64>,
    /// Marks scored; negative when wrong answers are penalized.
    pub score: Option<i32>,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub correct_answers: u32,
}

impl AttemptSubmission {
    pub fn new(size: i64, score: i32, total_questions: u32, correct_answers: u32) -> Self {
        Self {
            size: Some(size),
            score: Some(score),
            total_questions,
            correct_answers,
        }
    }

    /// Check required fields and return the paper size and score.
    pub fn validate(&self) -> Result<(PracticeSize, i32), ValidationError> {
        let size = self.size.ok_or(ValidationError::MissingField("type"))?;
        let size = PracticeSize::try_from(size)?;
        let score = self.score.ok_or(ValidationError::MissingField("score"))?;
        if self.correct_answers > self.total_questions {
            return Err(ValidationError::InvalidValue {
                field: "correct_answers".into(),
                message: format!(
                    "{} correct out of {} questions",
                    self.correct_answers, self.total_questions
                ),
            });
        }
        if self.total_questions > size.question_count() {
            return Err(ValidationError::InvalidValue {
                field: "total_questions".into(),
                message: format!(
                    "{} exceeds paper size {}",
                    self.total_questions,
                    size.question_count()
                ),
            });
        }
        Ok((size, score))
    }
}

/// Result of recording one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// First submission for this (user, date, size).
    pub created: bool,
    /// Best score stored after this submission.
    pub best_score: i32,
}
