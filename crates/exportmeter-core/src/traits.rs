//! Collaborator trait definitions for question sources and score stores.
//!
//! These async traits are implemented by the `exportmeter-store` crate. The
//! core never fetches or caches on its own; it receives questions already
//! materialized and hands finished results to the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FormSummary, Question};
use crate::scoring::ReadinessLevel;

// ---------------------------------------------------------------------------
// Question source trait
// ---------------------------------------------------------------------------

/// Supplier of form definitions and their questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// List the active forms.
    async fn forms(&self) -> anyhow::Result<Vec<FormSummary>>;

    /// Questions for a form, ordered by their display index.
    async fn questions(&self, form_id: &str) -> anyhow::Result<Vec<Question>>;
}

// ---------------------------------------------------------------------------
// Score store trait
// ---------------------------------------------------------------------------

/// The persisted aggregate score for one (user, form) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Opaque authenticated user id; the core performs no authentication.
    pub user_id: String,
    /// The form this score belongs to.
    pub form_id: String,
    /// Sum of points earned.
    pub total_score: f64,
    /// Sum of weights of the answered questions.
    pub max_possible_score: f64,
    /// Percentage score, 2 decimal places.
    pub percentage: f64,
    /// Readiness band for the percentage.
    pub level: ReadinessLevel,
    /// Whether the band qualifies as export-ready.
    pub export_ready: bool,
    /// When the submission completed.
    pub completed_at: DateTime<Utc>,
}

/// One persisted answer row, keyed by (user, question).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user_id: String,
    pub form_id: String,
    pub question_id: String,
    /// Normalized response string.
    pub response: String,
    /// Points earned.
    pub points: f64,
}

/// Persistence sink for computed scores, with upsert semantics.
///
/// Aggregates are keyed by (user id, form id) and individual answers by
/// (user id, question id); the last write for a given key wins. Conflict
/// resolution is the backend's responsibility.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Upsert the per-answer rows of a submission.
    async fn upsert_answers(&self, records: &[AnswerRecord]) -> anyhow::Result<()>;

    /// Upsert the aggregate score of a submission.
    async fn upsert_score(&self, record: &ScoreRecord) -> anyhow::Result<()>;

    /// The stored score for a (user, form) pair, if the user has submitted.
    async fn score(&self, user_id: &str, form_id: &str) -> anyhow::Result<Option<ScoreRecord>>;

    /// All stored scores for a user, across forms.
    async fn scores(&self, user_id: &str) -> anyhow::Result<Vec<ScoreRecord>>;
}

/// A backend that can both supply questions and persist scores.
pub trait Backend: QuestionSource + ScoreStore {}

impl<T: QuestionSource + ScoreStore> Backend for T {}
