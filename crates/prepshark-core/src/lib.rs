//! # PrepShark Core Library
//!
//! The daily practice and entitlement engine behind PrepShark's exam-prep
//! platform. Every operation is available through the standalone CLI; any
//! other front end is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Entitlements**: active plan keys are computed from purchase records and
//!   an explicit instant, then expanded into capabilities through one table
//! - **Daily papers**: one shared, date-seeded question set per (date, size),
//!   generated on first request and pinned in storage
//! - **Attempts and streaks**: best-score-wins attempt records and a
//!   consecutive-day streak advanced once per practice day
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`DailyPractice`]: paper, submission and status flow
//! - [`Subscriptions`]: plan catalog, activation and entitlement lookups
//! - [`Database`]: persistence for every record the engine owns
//! - [`Config`]: engine configuration management
//!
//! Nothing in the library reads the wall clock; callers pass `now` in.

pub mod clock;
pub mod error;
pub mod practice;
pub mod question;
pub mod storage;
pub mod subscription;
pub mod user;

pub use clock::PracticeClock;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use practice::{
    AttemptSubmission, DailyPractice, DailyStatus, PaperOutcome, PracticeSize, StreakState,
    SubmitOutcome,
};
pub use question::{NewQuestion, Question, QuestionPool, QuestionSummary};
pub use storage::{Config, Database};
pub use subscription::{Capability, EntitlementReport, Entitlements, PlanKey, Subscriptions};
pub use user::{ExamType, NewUser, User};
