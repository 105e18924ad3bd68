//! Daily paper generation.
//!
//! A paper is keyed by (date, size) and generated at most once. The question
//! count is split across the configured subject buckets as evenly as
//! possible, the first `size % buckets` buckets taking one extra question.
//! Within a bucket, subject question ids are shuffled by a generator seeded
//! from the date and the bucket index, so regeneration for the same pool and
//! date yields the same paper even before persistence is consulted.
//!
//! Persistence is the primary consistency mechanism: the store inserts only
//! if no paper exists for the key, and a writer that loses that race
//! discards its own selection and reads the winner's.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::PracticeSize;
use crate::clock::date_seed;
use crate::error::DatabaseError;
use crate::question::QuestionPool;

/// Persistence for pinned papers.
pub trait PaperStore {
    /// Question ids of the paper for (date, size), in paper order.
    fn find_paper(
        &self,
        date: NaiveDate,
        size: PracticeSize,
    ) -> Result<Option<Vec<i64>>, DatabaseError>;

    /// Persist a paper unless one already exists for (date, size).
    ///
    /// Returns `false` when an existing paper was left in place.
    fn insert_paper_if_absent(
        &self,
        date: NaiveDate,
        size: PracticeSize,
        question_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;
}

/// How a paper was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSource {
    /// Read back from storage.
    Existing,
    /// Generated and persisted by this call.
    Generated,
    /// Generated, but another writer persisted first; the winner was read.
    RaceLost,
    /// Nothing to persist: every subject bucket was empty.
    Unpersisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperOutcome {
    pub date: NaiveDate,
    pub size: PracticeSize,
    pub question_ids: Vec<i64>,
    pub source: PaperSource,
}

/// Split `size` into `buckets` near-equal parts, larger parts first.
pub fn bucket_sizes(size: usize, buckets: usize) -> Vec<usize> {
    if buckets == 0 {
        return Vec::new();
    }
    let base = size / buckets;
    let remainder = size % buckets;
    (0..buckets)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// Seed for one subject bucket. The low half is the YYYYMMDD date seed and
/// the high half carries the bucket index.
fn bucket_seed(date: NaiveDate, bucket: usize) -> u64 {
    date_seed(date) ^ ((bucket as u64) << 32)
}

/// Trimmed subject names with blanks and case-insensitive repeats removed,
/// keeping the first spelling of each.
fn distinct_subjects(subjects: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    subjects
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

/// Deterministically select question ids for a fresh paper.
///
/// Buckets with fewer questions than their quota contribute all they have.
pub fn select_questions<P: QuestionPool + ?Sized>(
    pool: &P,
    subjects: &[String],
    date: NaiveDate,
    size: PracticeSize,
) -> Result<Vec<i64>, DatabaseError> {
    let subjects = distinct_subjects(subjects);
    let quotas = bucket_sizes(size.question_count() as usize, subjects.len());
    let mut selected = Vec::with_capacity(size.question_count() as usize);

    for (bucket, (subject, quota)) in subjects.into_iter().zip(quotas).enumerate() {
        let mut ids = pool.question_ids_by_subject(subject)?;
        if ids.len() < quota {
            tracing::warn!(
                %date,
                subject,
                wanted = quota,
                available = ids.len(),
                "subject bucket short of questions"
            );
        }

        let mut rng = Mcg128Xsl64::seed_from_u64(bucket_seed(date, bucket));
        ids.shuffle(&mut rng);
        ids.truncate(quota);
        selected.extend(ids);
    }

    Ok(selected)
}

/// Return the paper for (date, size), generating and persisting it if this
/// is the first request for that key.
pub fn get_or_create_paper<S, P>(
    store: &S,
    pool: &P,
    subjects: &[String],
    date: NaiveDate,
    size: PracticeSize,
    now: DateTime<Utc>,
) -> Result<PaperOutcome, DatabaseError>
where
    S: PaperStore + ?Sized,
    P: QuestionPool + ?Sized,
{
    if let Some(question_ids) = store.find_paper(date, size)? {
        tracing::debug!(%date, %size, "reusing pinned paper");
        return Ok(PaperOutcome {
            date,
            size,
            question_ids,
            source: PaperSource::Existing,
        });
    }

    let generated = select_questions(pool, subjects, date, size)?;
    if generated.is_empty() {
        tracing::warn!(%date, %size, "no questions available; paper not persisted");
        return Ok(PaperOutcome {
            date,
            size,
            question_ids: generated,
            source: PaperSource::Unpersisted,
        });
    }

    if store.insert_paper_if_absent(date, size, &generated, now)? {
        tracing::info!(%date, %size, questions = generated.len(), "generated daily paper");
        return Ok(PaperOutcome {
            date,
            size,
            question_ids: generated,
            source: PaperSource::Generated,
        });
    }

    tracing::debug!(%date, %size, "paper insert lost the race; reading winner");
    match store.find_paper(date, size)? {
        Some(question_ids) => Ok(PaperOutcome {
            date,
            size,
            question_ids,
            source: PaperSource::RaceLost,
        }),
        // The winner vanished between insert and read; the local selection
        // is what the winner would have generated from the same seed.
        None => Ok(PaperOutcome {
            date,
            size,
            question_ids: generated,
            source: PaperSource::RaceLost,
        }),
    }
}
