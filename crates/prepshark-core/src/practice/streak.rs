//! Consecutive-day practice streak.
//!
//! The only state is `last_practice_date`. Advancing to the day after it
//! continues the streak; advancing to any other day restarts it at 1;
//! advancing to the same day again changes nothing.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub max_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
}

/// What an [`StreakState::advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// Already practiced on this date.
    Unchanged,
    Continued,
    Reset,
}

impl StreakState {
    /// Record practice on `date`.
    pub fn advance(&mut self, date: NaiveDate) -> StreakTransition {
        if self.last_practice_date == Some(date) {
            return StreakTransition::Unchanged;
        }

        let yesterday = date - Duration::days(1);
        let transition = if self.last_practice_date == Some(yesterday) {
            self.current_streak = self.current_streak.saturating_add(1);
            StreakTransition::Continued
        } else {
            self.current_streak = 1;
            StreakTransition::Reset
        };

        self.max_streak = self.max_streak.max(self.current_streak);
        self.last_practice_date = Some(date);
        transition
    }
}
