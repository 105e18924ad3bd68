//! Daily practice: shared date-keyed papers, best-score attempts and the
//! consecutive-day streak.

pub mod attempt;
pub mod paper;
mod service;
pub mod streak;

pub use attempt::{AttemptSubmission, DailyPracticeAttempt, RecordOutcome};
pub use paper::{bucket_sizes, get_or_create_paper, PaperOutcome, PaperSource, PaperStore};
pub use service::{DailyPractice, DailyStatus, SubmitOutcome};
pub use streak::{StreakState, StreakTransition};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub enum PracticeSize {
    Daily25,
    Daily50,
}

impl PracticeSize {
    pub const ALL: [PracticeSize; 2] = [PracticeSize::Daily25, PracticeSize::Daily50];

    pub fn question_count(self) -> u32 {
        match self {
            PracticeSize::Daily25 => 25,
            PracticeSize::Daily50 => 50,
        }
    }
}

impl TryFrom<i64> for PracticeSize {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            25 => Ok(PracticeSize::Daily25),
            50 => Ok(PracticeSize::Daily50),
            other => Err(ValidationError::InvalidPracticeSize(other)),
        }
    }
}

impl From<PracticeSize> for u32 {
    fn from(size: PracticeSize) -> Self {
        size.question_count()
    }
}

impl fmt::Display for PracticeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Daily {}", self.question_count())
    }
}
