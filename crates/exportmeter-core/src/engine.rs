//! Submission engine orchestrator.
//!
//! Wires the pure scoring core to the question source and score store,
//! with retries on transient storage errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use crate::error::StoreError;
use crate::model::Answer;
use crate::report::SubmissionReceipt;
use crate::scoring::{aggregate, index_questions, ReadinessBands};
use crate::traits::{AnswerRecord, Backend, ScoreRecord};

/// Configuration for the submission engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Band thresholds for the readiness classifier.
    pub bands: ReadinessBands,
    /// Retries on transient store errors (not client errors).
    pub max_retries: u32,
    /// Initial delay between retries; doubles per attempt, capped at 60s.
    pub retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bands: ReadinessBands::default(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// The submission engine.
pub struct SubmissionEngine {
    backend: Arc<dyn Backend>,
    config: EngineConfig,
}

impl SubmissionEngine {
    pub fn new(backend: Arc<dyn Backend>, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    /// Score a batch of answers for one (user, form) pair and persist the
    /// result.
    ///
    /// The two persistence writes are independent tables and run
    /// concurrently. Resubmitting overwrites the previous state through the
    /// store's upsert semantics.
    pub async fn submit(
        &self,
        user_id: &str,
        form_id: &str,
        answers: &[Answer],
    ) -> Result<SubmissionReceipt> {
        anyhow::ensure!(!answers.is_empty(), "a submission requires at least one answer");

        let questions = self.with_retry(|| self.backend.questions(form_id)).await?;
        if questions.is_empty() {
            tracing::warn!("form '{form_id}' has no questions; submission will score 0");
        }

        let questions_by_id = index_questions(questions);
        let outcome = aggregate(&questions_by_id, answers, &self.config.bands);
        let completed_at = Utc::now();

        let answer_records: Vec<AnswerRecord> = outcome
            .answers
            .iter()
            .map(|a| AnswerRecord {
                user_id: user_id.to_string(),
                form_id: form_id.to_string(),
                question_id: a.question_id.clone(),
                response: a.response.clone(),
                points: a.points,
            })
            .collect();

        let score_record = ScoreRecord {
            user_id: user_id.to_string(),
            form_id: form_id.to_string(),
            total_score: outcome.total_score,
            max_possible_score: outcome.max_possible_score,
            percentage: outcome.percentage,
            level: outcome.level,
            export_ready: outcome.level.export_ready(),
            completed_at,
        };

        // Answers referencing only unknown questions leave nothing to store
        // on the per-answer table; the aggregate row is still written.
        let store_answers = async {
            if answer_records.is_empty() {
                return Ok(());
            }
            self.with_retry(|| self.backend.upsert_answers(&answer_records))
                .await
        };
        let store_score = self.with_retry(|| self.backend.upsert_score(&score_record));
        futures::try_join!(store_answers, store_score)?;

        tracing::info!(
            user = user_id,
            form = form_id,
            percentage = score_record.percentage,
            level = %score_record.level,
            "submission stored"
        );

        Ok(SubmissionReceipt::new(user_id, form_id, outcome, completed_at))
    }

    /// The stored thermometer state for a (user, form) pair.
    ///
    /// `None` means the user has not completed the questionnaire yet.
    pub async fn status(&self, user_id: &str, form_id: &str) -> Result<Option<ScoreRecord>> {
        self.with_retry(|| self.backend.score(user_id, form_id))
            .await
    }

    /// All stored scores for a user, across forms.
    pub async fn results(&self, user_id: &str) -> Result<Vec<ScoreRecord>> {
        self.with_retry(|| self.backend.scores(user_id)).await
    }

    /// Retry a store operation with exponential backoff.
    ///
    /// Permanent errors abort immediately; a rate-limit retry-after hint
    /// overrides the current delay.
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.config.retry_delay;
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(60));
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if let Some(store_err) = e.downcast_ref::<StoreError>() {
                        if store_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = store_err.retry_after_ms() {
                            delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::warn!("store operation failed (attempt {}): {e:#}", attempt + 1);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("retries exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use crate::scoring::ReadinessLevel;
    use crate::traits::{QuestionSource, ScoreStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Backend stub whose score upserts fail a configurable number of times.
    struct FlakyBackend {
        questions: Vec<Question>,
        score_failures: AtomicU32,
        permanent: bool,
        stored_scores: Mutex<Vec<ScoreRecord>>,
        stored_answers: Mutex<Vec<AnswerRecord>>,
    }

    impl FlakyBackend {
        fn new(questions: Vec<Question>, score_failures: u32, permanent: bool) -> Self {
            Self {
                questions,
                score_failures: AtomicU32::new(score_failures),
                permanent,
                stored_scores: Mutex::new(Vec::new()),
                stored_answers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionSource for FlakyBackend {
        async fn forms(&self) -> Result<Vec<crate::model::FormSummary>> {
            Ok(vec![])
        }

        async fn questions(&self, _form_id: &str) -> Result<Vec<Question>> {
            Ok(self.questions.clone())
        }
    }

    #[async_trait]
    impl ScoreStore for FlakyBackend {
        async fn upsert_answers(&self, records: &[AnswerRecord]) -> Result<()> {
            self.stored_answers.lock().unwrap().extend_from_slice(records);
            Ok(())
        }

        async fn upsert_score(&self, record: &ScoreRecord) -> Result<()> {
            if self.score_failures.load(Ordering::SeqCst) > 0 {
                self.score_failures.fetch_sub(1, Ordering::SeqCst);
                let err = if self.permanent {
                    StoreError::AuthenticationFailed("bad token".into())
                } else {
                    StoreError::NetworkError("connection reset".into())
                };
                return Err(err.into());
            }
            self.stored_scores.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn score(&self, user_id: &str, form_id: &str) -> Result<Option<ScoreRecord>> {
            Ok(self
                .stored_scores
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id && r.form_id == form_id)
                .cloned())
        }

        async fn scores(&self, user_id: &str) -> Result<Vec<ScoreRecord>> {
            Ok(self
                .stored_scores
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    fn sample_questions() -> Vec<Question> {
        vec![
            Question {
                id: "q1".into(),
                text: String::new(),
                category: "documentation".into(),
                weight: 2.0,
                points_for_yes: 1.0,
                points_for_no: 0.0,
                order_index: 1,
            },
            Question {
                id: "q2".into(),
                text: String::new(),
                category: "logistics".into(),
                weight: 1.0,
                points_for_yes: 1.0,
                points_for_no: 0.0,
                order_index: 2,
            },
        ]
    }

    #[tokio::test]
    async fn submit_persists_answers_and_score() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 0, false));
        let engine = SubmissionEngine::new(backend.clone(), EngineConfig::default());

        let answers = vec![
            Answer::new("q1", json!("yes")),
            Answer::new("q2", json!("no")),
        ];
        let receipt = engine.submit("user-1", "form-1", &answers).await.unwrap();

        assert_eq!(receipt.percentage, 66.67);
        assert_eq!(receipt.level, ReadinessLevel::Moderate);
        assert_eq!(backend.stored_answers.lock().unwrap().len(), 2);

        let stored = engine.status("user-1", "form-1").await.unwrap().unwrap();
        assert_eq!(stored.percentage, 66.67);
        assert!(!stored.export_ready);
    }

    #[tokio::test]
    async fn submit_rejects_empty_batch() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 0, false));
        let engine = SubmissionEngine::new(backend, EngineConfig::default());

        let err = engine.submit("user-1", "form-1", &[]).await.unwrap_err();
        assert!(err.to_string().contains("at least one answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_store_errors_are_retried() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 2, false));
        let engine = SubmissionEngine::new(backend.clone(), EngineConfig::default());

        let answers = vec![Answer::new("q1", json!("yes"))];
        engine.submit("user-1", "form-1", &answers).await.unwrap();
        assert_eq!(backend.stored_scores.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_store_errors_abort() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 1, true));
        let engine = SubmissionEngine::new(backend.clone(), EngineConfig::default());

        let answers = vec![Answer::new("q1", json!("yes"))];
        let err = engine.submit("user-1", "form-1", &answers).await.unwrap_err();
        assert!(err.to_string().contains("authentication"));
        assert!(backend.stored_scores.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_exhaust_eventually() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 10, false));
        let engine = SubmissionEngine::new(
            backend,
            EngineConfig {
                max_retries: 2,
                ..EngineConfig::default()
            },
        );

        let answers = vec![Answer::new("q1", json!("yes"))];
        let err = engine.submit("user-1", "form-1", &answers).await.unwrap_err();
        assert!(err.to_string().contains("network error"));
    }

    #[tokio::test]
    async fn status_reports_not_evaluated() {
        let backend = Arc::new(FlakyBackend::new(sample_questions(), 0, false));
        let engine = SubmissionEngine::new(backend, EngineConfig::default());

        let status = engine.status("user-1", "form-1").await.unwrap();
        assert!(status.is_none());
    }
}
