//! File-backed local backend.
//!
//! Forms come from a directory of TOML definitions; scores and answers
//! persist to a single JSON data file so state survives across runs.
//! Within one process the state file is guarded by a mutex; across
//! processes the last writer wins, matching the upsert contract.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use exportmeter_core::model::{Form, FormSummary, Question};
use exportmeter_core::parser::load_forms_directory;
use exportmeter_core::traits::{AnswerRecord, QuestionSource, ScoreRecord, ScoreStore};

/// Local file-backed storage backend.
pub struct LocalStore {
    forms: Vec<Form>,
    data_path: PathBuf,
    state: Mutex<LocalState>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalState {
    #[serde(default)]
    scores: Vec<ScoreRecord>,
    #[serde(default)]
    answers: Vec<AnswerRecord>,
}

impl LocalStore {
    /// Open a local store over a forms directory and a JSON data file.
    ///
    /// A missing data file starts empty; it is created on first write.
    pub fn open(forms_dir: &Path, data_path: &Path) -> Result<Self> {
        let forms = load_forms_directory(forms_dir)?;

        let state = if data_path.exists() {
            let content = std::fs::read_to_string(data_path)
                .with_context(|| format!("failed to read data file: {}", data_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse data file: {}", data_path.display()))?
        } else {
            LocalState::default()
        };

        Ok(Self {
            forms,
            data_path: data_path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &LocalState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("failed to serialize store state")?;
        if let Some(parent) = self.data_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.data_path, json)
            .with_context(|| format!("failed to write data file: {}", self.data_path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for LocalStore {
    async fn forms(&self) -> Result<Vec<FormSummary>> {
        Ok(self
            .forms
            .iter()
            .filter(|f| f.is_active)
            .map(Form::summary)
            .collect())
    }

    async fn questions(&self, form_id: &str) -> Result<Vec<Question>> {
        // An unknown form yields no questions; the aggregator's lenience
        // handles the rest.
        Ok(self
            .forms
            .iter()
            .find(|f| f.id == form_id)
            .map(|f| f.questions.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ScoreStore for LocalStore {
    async fn upsert_answers(&self, records: &[AnswerRecord]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for record in records {
            let existing = state
                .answers
                .iter()
                .position(|a| a.user_id == record.user_id && a.question_id == record.question_id);
            match existing {
                Some(pos) => state.answers[pos] = record.clone(),
                None => state.answers.push(record.clone()),
            }
        }
        self.persist(&state)
    }

    async fn upsert_score(&self, record: &ScoreRecord) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .scores
            .iter()
            .position(|s| s.user_id == record.user_id && s.form_id == record.form_id);
        match existing {
            Some(pos) => state.scores[pos] = record.clone(),
            None => state.scores.push(record.clone()),
        }
        self.persist(&state)
    }

    async fn score(&self, user_id: &str, form_id: &str) -> Result<Option<ScoreRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .scores
            .iter()
            .find(|s| s.user_id == user_id && s.form_id == form_id)
            .cloned())
    }

    async fn scores(&self, user_id: &str) -> Result<Vec<ScoreRecord>> {
        let state = self.state.lock().unwrap();
        let mut scores: Vec<ScoreRecord> = state
            .scores
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use exportmeter_core::scoring::ReadinessLevel;

    const FORM_TOML: &str = r#"
[form]
id = "export-readiness"
title = "Export Readiness Assessment"

[[questions]]
id = "q1"
text = "Registered entity?"
category = "legal"
weight = 2.0
"#;

    fn record(user: &str, form: &str, percentage: f64) -> ScoreRecord {
        ScoreRecord {
            user_id: user.into(),
            form_id: form.into(),
            total_score: percentage,
            max_possible_score: 100.0,
            percentage,
            level: ReadinessLevel::Moderate,
            export_ready: false,
            completed_at: Utc::now(),
        }
    }

    fn setup() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let forms_dir = dir.path().join("forms");
        std::fs::create_dir_all(&forms_dir).unwrap();
        std::fs::write(forms_dir.join("form.toml"), FORM_TOML).unwrap();

        let store = LocalStore::open(&forms_dir, &dir.path().join("data/scores.json")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn loads_forms_from_directory() {
        let (_dir, store) = setup();
        let forms = store.forms().await.unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, "export-readiness");

        let questions = store.questions("export-readiness").await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].weight, 2.0);
    }

    #[tokio::test]
    async fn unknown_form_has_no_questions() {
        let (_dir, store) = setup();
        let questions = store.questions("nope").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_score() {
        let (_dir, store) = setup();

        store
            .upsert_score(&record("user-1", "export-readiness", 40.0))
            .await
            .unwrap();
        store
            .upsert_score(&record("user-1", "export-readiness", 80.0))
            .await
            .unwrap();

        let stored = store.score("user-1", "export-readiness").await.unwrap().unwrap();
        assert_eq!(stored.percentage, 80.0);
        assert_eq!(store.scores("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let (dir, store) = setup();
        store
            .upsert_score(&record("user-1", "export-readiness", 66.67))
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(
            &dir.path().join("forms"),
            &dir.path().join("data/scores.json"),
        )
        .unwrap();
        let stored = reopened
            .score("user-1", "export-readiness")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.percentage, 66.67);
    }

    #[tokio::test]
    async fn upsert_answers_keyed_by_question() {
        let (_dir, store) = setup();

        let first = AnswerRecord {
            user_id: "user-1".into(),
            form_id: "export-readiness".into(),
            question_id: "q1".into(),
            response: "no".into(),
            points: 0.0,
        };
        let second = AnswerRecord {
            response: "yes".into(),
            points: 2.0,
            ..first.clone()
        };

        store.upsert_answers(&[first]).await.unwrap();
        store.upsert_answers(&[second]).await.unwrap();

        let state = store.state.lock().unwrap();
        assert_eq!(state.answers.len(), 1);
        assert_eq!(state.answers[0].response, "yes");
    }
}
