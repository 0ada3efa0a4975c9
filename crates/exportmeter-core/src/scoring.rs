//! Question scoring, readiness classification, and submission aggregation.
//!
//! All three operations are pure, synchronous computations over their inputs:
//! recomputing with the same inputs always yields the same result, which the
//! surrounding upsert semantics rely on.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Answer, Question, ScoredAnswer};

/// Discrete readiness band over a percentage score.
///
/// Ordered from worst to best, so `Ord` reflects the readiness ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessLevel {
    Critical,
    Low,
    Moderate,
    Good,
    Excellent,
}

impl ReadinessLevel {
    /// Color tag associated with this band.
    pub fn color(&self) -> &'static str {
        match self {
            ReadinessLevel::Excellent => "green",
            ReadinessLevel::Good => "light-green",
            ReadinessLevel::Moderate => "yellow",
            ReadinessLevel::Low => "orange",
            ReadinessLevel::Critical => "red",
        }
    }

    /// Whether this band qualifies the user as ready to export.
    pub fn export_ready(&self) -> bool {
        matches!(self, ReadinessLevel::Excellent | ReadinessLevel::Good)
    }

    /// Short headline shown with the result.
    pub fn message(&self) -> &'static str {
        match self {
            ReadinessLevel::Excellent => "Ready to export! You have all the capabilities",
            ReadinessLevel::Good => "Almost there - only a few details left to improve",
            ReadinessLevel::Moderate => "Several areas need improvement",
            ReadinessLevel::Low => "Considerable preparation still required",
            ReadinessLevel::Critical => "Not prepared to export yet",
        }
    }

    /// Longer explanation of what the band means.
    pub fn description(&self) -> &'static str {
        match self {
            ReadinessLevel::Excellent => "You meet all the necessary requirements",
            ReadinessLevel::Good => "You have most of the requirements covered",
            ReadinessLevel::Moderate => "You are on the right track but important pieces are missing",
            ReadinessLevel::Low => "You need to work on many basic aspects",
            ReadinessLevel::Critical => "You are missing most of the fundamental requirements",
        }
    }
}

impl fmt::Display for ReadinessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessLevel::Critical => write!(f, "critical"),
            ReadinessLevel::Low => write!(f, "low"),
            ReadinessLevel::Moderate => write!(f, "moderate"),
            ReadinessLevel::Good => write!(f, "good"),
            ReadinessLevel::Excellent => write!(f, "excellent"),
        }
    }
}

impl FromStr for ReadinessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(ReadinessLevel::Critical),
            "low" => Ok(ReadinessLevel::Low),
            "moderate" => Ok(ReadinessLevel::Moderate),
            "good" => Ok(ReadinessLevel::Good),
            "excellent" => Ok(ReadinessLevel::Excellent),
            other => Err(format!("unknown readiness level: {other}")),
        }
    }
}

/// Band thresholds for the readiness classifier.
///
/// Each field is the inclusive lower bound of its band; anything below
/// `low` is critical. Thresholds are plain configuration data so deployments
/// can tune them without touching the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadinessBands {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_good")]
    pub good: f64,
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_low")]
    pub low: f64,
}

fn default_excellent() -> f64 {
    85.0
}
fn default_good() -> f64 {
    70.0
}
fn default_moderate() -> f64 {
    50.0
}
fn default_low() -> f64 {
    30.0
}

impl Default for ReadinessBands {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            moderate: default_moderate(),
            low: default_low(),
        }
    }
}

impl ReadinessBands {
    /// Map a percentage to its readiness band. Total over all real inputs.
    pub fn classify(&self, percentage: f64) -> ReadinessLevel {
        if percentage >= self.excellent {
            ReadinessLevel::Excellent
        } else if percentage >= self.good {
            ReadinessLevel::Good
        } else if percentage >= self.moderate {
            ReadinessLevel::Moderate
        } else if percentage >= self.low {
            ReadinessLevel::Low
        } else {
            ReadinessLevel::Critical
        }
    }
}

/// Classify a percentage with the default band thresholds.
pub fn classify(percentage: f64) -> ReadinessLevel {
    ReadinessBands::default().classify(percentage)
}

/// Normalize a raw response value for comparison against `"yes"`.
///
/// Strings are trimmed and lowercased; any other JSON value is coerced to
/// its string form. Null becomes the empty string.
pub fn normalize_response(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Points earned for an already-normalized response.
fn points_for(question: &Question, response: &str) -> f64 {
    if response == "yes" {
        question.points_for_yes * question.weight
    } else {
        question.points_for_no * question.weight
    }
}

/// Score one question against one raw answer.
pub fn score_question(question: &Question, raw_answer: &Value) -> f64 {
    points_for(question, &normalize_response(raw_answer))
}

/// Index questions by id for aggregation lookups.
pub fn index_questions(questions: Vec<Question>) -> HashMap<String, Question> {
    questions.into_iter().map(|q| (q.id.clone(), q)).collect()
}

/// Result of aggregating one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// Sum of points earned across matched answers.
    pub total_score: f64,
    /// Sum of weights across matched answers.
    pub max_possible_score: f64,
    /// total/max as a percentage, rounded to 2 decimal places; 0 when max is 0.
    pub percentage: f64,
    /// Readiness band for the percentage.
    pub level: ReadinessLevel,
    /// Per-answer score records for persistence.
    pub answers: Vec<ScoredAnswer>,
    /// Categories containing at least one matched question not answered "yes",
    /// deduplicated in first-occurrence order. Input for the external
    /// recommendation mapping.
    pub gap_categories: Vec<String>,
}

/// Aggregate a batch of answers against a question index.
///
/// Answers referencing an unknown question id are silently skipped; they
/// count toward neither the total nor the maximum score.
pub fn aggregate(
    questions_by_id: &HashMap<String, Question>,
    answers: &[Answer],
    bands: &ReadinessBands,
) -> SubmissionOutcome {
    let mut total_score = 0.0;
    let mut max_possible_score = 0.0;
    let mut scored = Vec::with_capacity(answers.len());
    let mut gap_categories: Vec<String> = Vec::new();

    for answer in answers {
        let Some(question) = questions_by_id.get(&answer.question_id) else {
            continue;
        };

        let response = normalize_response(&answer.value);
        let points = points_for(question, &response);

        max_possible_score += question.weight;
        total_score += points;

        if response != "yes"
            && !question.category.is_empty()
            && !gap_categories.contains(&question.category)
        {
            gap_categories.push(question.category.clone());
        }

        scored.push(ScoredAnswer {
            question_id: answer.question_id.clone(),
            response,
            points,
        });
    }

    let percentage = if max_possible_score > 0.0 {
        round2(total_score / max_possible_score * 100.0)
    } else {
        0.0
    };

    SubmissionOutcome {
        total_score,
        max_possible_score,
        percentage,
        level: bands.classify(percentage),
        answers: scored,
        gap_categories,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
