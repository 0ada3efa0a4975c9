//! Supabase-style REST backend.
//!
//! Talks PostgREST conventions: filter query params (`form_id=eq.{id}`),
//! `on_conflict` upserts with a merge-duplicates `Prefer` header, and an
//! `apikey` plus bearer-token header pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use exportmeter_core::error::StoreError;
use exportmeter_core::model::{FormSummary, Question};
use exportmeter_core::scoring::classify;
use exportmeter_core::traits::{AnswerRecord, QuestionSource, ScoreRecord, ScoreStore};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// REST storage backend.
pub struct RestStore {
    base_url: String,
    api_key: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, auth_token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            auth_token,
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// The bearer token is the user's token when configured, otherwise the
    /// service API key (the key fills both header roles, as Supabase allows).
    fn bearer(&self) -> &str {
        self.auth_token.as_deref().unwrap_or(&self.api_key)
    }

    fn apply_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    fn map_send_error(e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
        } else {
            StoreError::NetworkError(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(StoreError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(StoreError::ApiError { status, message });
        }
        Ok(response)
    }
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

/// Wire shape of a `questions` row. Missing scoring fields fall back to
/// their defaults rather than failing the whole fetch.
#[derive(Debug, Deserialize)]
struct QuestionRow {
    id: String,
    #[serde(default, alias = "text")]
    question_text: String,
    #[serde(default)]
    category: String,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default = "default_points_for_yes")]
    points_for_yes: f64,
    #[serde(default)]
    points_for_no: f64,
    #[serde(default)]
    order_index: u32,
}

fn default_weight() -> f64 {
    1.0
}

fn default_points_for_yes() -> f64 {
    1.0
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            text: row.question_text,
            category: row.category,
            weight: row.weight,
            points_for_yes: row.points_for_yes,
            points_for_no: row.points_for_no,
            order_index: row.order_index,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FormRow {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
}

impl From<FormRow> for FormSummary {
    fn from(row: FormRow) -> Self {
        FormSummary {
            id: row.id,
            title: row.title,
            description: row.description,
            question_count: 0,
        }
    }
}

/// Wire shape of a `user_form_scores` row.
#[derive(Debug, Serialize, Deserialize)]
struct ScoreRow {
    user_id: String,
    form_id: String,
    total_score: f64,
    max_possible_score: f64,
    percentage: f64,
    readiness_level: String,
    readiness_color: String,
    can_export: bool,
    completed_at: DateTime<Utc>,
}

impl From<&ScoreRecord> for ScoreRow {
    fn from(record: &ScoreRecord) -> Self {
        ScoreRow {
            user_id: record.user_id.clone(),
            form_id: record.form_id.clone(),
            total_score: record.total_score,
            max_possible_score: record.max_possible_score,
            percentage: record.percentage,
            readiness_level: record.level.to_string(),
            readiness_color: record.level.color().to_string(),
            can_export: record.export_ready,
            completed_at: record.completed_at,
        }
    }
}

impl ScoreRow {
    /// An unrecognized stored level label falls back to reclassifying the
    /// stored percentage rather than failing the read.
    fn into_record(self) -> ScoreRecord {
        let level = self
            .readiness_level
            .parse()
            .unwrap_or_else(|_| classify(self.percentage));
        ScoreRecord {
            user_id: self.user_id,
            form_id: self.form_id,
            total_score: self.total_score,
            max_possible_score: self.max_possible_score,
            percentage: self.percentage,
            level,
            export_ready: self.can_export,
            completed_at: self.completed_at,
        }
    }
}

/// Wire shape of a `user_responses` row.
#[derive(Debug, Serialize, Deserialize)]
struct AnswerRow {
    user_id: String,
    form_id: String,
    question_id: String,
    response_value: String,
    score: f64,
}

impl From<&AnswerRecord> for AnswerRow {
    fn from(record: &AnswerRecord) -> Self {
        AnswerRow {
            user_id: record.user_id.clone(),
            form_id: record.form_id.clone(),
            question_id: record.question_id.clone(),
            response_value: record.response.clone(),
            score: record.points,
        }
    }
}

#[async_trait]
impl QuestionSource for RestStore {
    async fn forms(&self) -> anyhow::Result<Vec<FormSummary>> {
        let request = self
            .client
            .get(self.table_url("forms"))
            .query(&[("select", "*"), ("is_active", "eq.true")]);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let rows: Vec<FormRow> = response.json().await.map_err(|e| StoreError::ApiError {
            status: 0,
            message: format!("failed to parse forms response: {e}"),
        })?;
        Ok(rows.into_iter().map(FormSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn questions(&self, form_id: &str) -> anyhow::Result<Vec<Question>> {
        let form_filter = format!("eq.{form_id}");
        let request = self.client.get(self.table_url("questions")).query(&[
            ("select", "*"),
            ("form_id", form_filter.as_str()),
            ("order", "order_index.asc"),
        ]);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let rows: Vec<QuestionRow> = response.json().await.map_err(|e| StoreError::ApiError {
            status: 0,
            message: format!("failed to parse questions response: {e}"),
        })?;
        Ok(rows.into_iter().map(Question::from).collect())
    }
}

#[async_trait]
impl ScoreStore for RestStore {
    async fn upsert_answers(&self, records: &[AnswerRecord]) -> anyhow::Result<()> {
        let rows: Vec<AnswerRow> = records.iter().map(AnswerRow::from).collect();
        let request = self
            .client
            .post(self.table_url("user_responses"))
            .query(&[("on_conflict", "user_id,question_id")])
            .header("Prefer", UPSERT_PREFER)
            .json(&rows);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(user = %record.user_id, form = %record.form_id))]
    async fn upsert_score(&self, record: &ScoreRecord) -> anyhow::Result<()> {
        let row = ScoreRow::from(record);
        let request = self
            .client
            .post(self.table_url("user_form_scores"))
            .query(&[("on_conflict", "user_id,form_id")])
            .header("Prefer", UPSERT_PREFER)
            .json(&row);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn score(&self, user_id: &str, form_id: &str) -> anyhow::Result<Option<ScoreRecord>> {
        let user_filter = format!("eq.{user_id}");
        let form_filter = format!("eq.{form_id}");
        let request = self.client.get(self.table_url("user_form_scores")).query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("form_id", form_filter.as_str()),
        ]);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let rows: Vec<ScoreRow> = response.json().await.map_err(|e| StoreError::ApiError {
            status: 0,
            message: format!("failed to parse score response: {e}"),
        })?;
        Ok(rows.into_iter().next().map(ScoreRow::into_record))
    }

    async fn scores(&self, user_id: &str) -> anyhow::Result<Vec<ScoreRecord>> {
        let user_filter = format!("eq.{user_id}");
        let request = self.client.get(self.table_url("user_form_scores")).query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("order", "completed_at.desc"),
        ]);
        let response = self
            .apply_headers(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let rows: Vec<ScoreRow> = response.json().await.map_err(|e| StoreError::ApiError {
            status: 0,
            message: format!("failed to parse scores response: {e}"),
        })?;
        Ok(rows.into_iter().map(ScoreRow::into_record).collect())
    }
}
