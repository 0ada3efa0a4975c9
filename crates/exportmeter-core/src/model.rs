//! Core data model types for exportmeter.
//!
//! These are the fundamental types the entire exportmeter system uses to
//! represent questionnaires, answers, and scored results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single yes/no questionnaire item with its scoring parameters.
///
/// Missing weight/points fields fall back to their defaults when
/// deserializing; a malformed question definition is never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: String,
    /// The question wording shown to the user.
    #[serde(default)]
    pub text: String,
    /// Category used for grouping and improvement recommendations.
    #[serde(default)]
    pub category: String,
    /// Contribution of this question to the maximum possible score.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Points earned when the answer is "yes".
    #[serde(default = "default_points_for_yes")]
    pub points_for_yes: f64,
    /// Points earned for any other answer.
    #[serde(default = "default_points_for_no")]
    pub points_for_no: f64,
    /// Display order within the form.
    #[serde(default)]
    pub order_index: u32,
}

fn default_weight() -> f64 {
    1.0
}

fn default_points_for_yes() -> f64 {
    1.0
}

fn default_points_for_no() -> f64 {
    0.0
}

/// A named questionnaire composed of ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    /// Unique identifier for this form.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Description of what this form assesses.
    #[serde(default)]
    pub description: String,
    /// Whether the form is currently offered to users.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// The questions in this form.
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_active() -> bool {
    true
}

impl Form {
    /// Summary view without the question definitions.
    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            question_count: self.questions.len(),
        }
    }
}

/// A form without its questions, as returned by form listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub question_count: usize,
}

/// One raw answer in a submission.
///
/// The value is kept as arbitrary JSON; non-string values are coerced to
/// their string form at scoring time and never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The question this answer refers to.
    pub question_id: String,
    /// The raw response value as supplied by the caller.
    #[serde(default)]
    pub value: Value,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
        }
    }
}

/// A scored answer, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// The question that was answered.
    pub question_id: String,
    /// The normalized (lowercased, trimmed) response string.
    pub response: String,
    /// Points earned for this answer.
    pub points: f64,
}
