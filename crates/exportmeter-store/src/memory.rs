//! In-memory backend for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use exportmeter_core::model::{Form, FormSummary, Question};
use exportmeter_core::traits::{AnswerRecord, QuestionSource, ScoreRecord, ScoreStore};

/// An in-memory backend for testing the submission engine without a real
/// storage service.
///
/// Seed forms with [`MemoryStore::with_form`]; upsert counters expose how
/// often the store was written to.
#[derive(Default)]
pub struct MemoryStore {
    forms: Vec<Form>,
    /// Scores keyed by (user id, form id).
    scores: Mutex<HashMap<(String, String), ScoreRecord>>,
    /// Answers keyed by (user id, question id).
    answers: Mutex<HashMap<(String, String), AnswerRecord>>,
    score_upserts: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a form into the store.
    pub fn with_form(mut self, form: Form) -> Self {
        self.forms.push(form);
        self
    }

    /// Number of aggregate-score upserts performed.
    pub fn score_upserts(&self) -> u32 {
        self.score_upserts.load(Ordering::Relaxed)
    }

    /// Number of answer rows currently stored.
    pub fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl QuestionSource for MemoryStore {
    async fn forms(&self) -> anyhow::Result<Vec<FormSummary>> {
        Ok(self
            .forms
            .iter()
            .filter(|f| f.is_active)
            .map(Form::summary)
            .collect())
    }

    async fn questions(&self, form_id: &str) -> anyhow::Result<Vec<Question>> {
        Ok(self
            .forms
            .iter()
            .find(|f| f.id == form_id)
            .map(|f| f.questions.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn upsert_answers(&self, records: &[AnswerRecord]) -> anyhow::Result<()> {
        let mut answers = self.answers.lock().unwrap();
        for record in records {
            answers.insert(
                (record.user_id.clone(), record.question_id.clone()),
                record.clone(),
            );
        }
        Ok(())
    }

    async fn upsert_score(&self, record: &ScoreRecord) -> anyhow::Result<()> {
        self.score_upserts.fetch_add(1, Ordering::Relaxed);
        self.scores.lock().unwrap().insert(
            (record.user_id.clone(), record.form_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn score(&self, user_id: &str, form_id: &str) -> anyhow::Result<Option<ScoreRecord>> {
        Ok(self
            .scores
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), form_id.to_string()))
            .cloned())
    }

    async fn scores(&self, user_id: &str) -> anyhow::Result<Vec<ScoreRecord>> {
        let mut scores: Vec<ScoreRecord> = self
            .scores
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(scores)
    }
}
