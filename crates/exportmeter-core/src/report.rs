//! Submission receipts with JSON persistence and progress comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{ReadinessLevel, SubmissionOutcome};

/// A complete record of one scored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Unique receipt identifier.
    pub id: Uuid,
    /// When the submission completed.
    pub created_at: DateTime<Utc>,
    /// Opaque user id the submission is attributed to.
    pub user_id: String,
    /// The form that was answered.
    pub form_id: String,
    /// Sum of points earned.
    pub total_score: f64,
    /// Sum of weights of the answered questions.
    pub max_possible_score: f64,
    /// Percentage score, 2 decimal places.
    pub percentage: f64,
    /// Readiness band.
    pub level: ReadinessLevel,
    /// Whether the band qualifies as export-ready.
    pub export_ready: bool,
    /// Headline for the band.
    pub message: String,
    /// Longer explanation of the band.
    pub description: String,
    /// Per-answer score records.
    pub answers: Vec<crate::model::ScoredAnswer>,
    /// Categories with at least one non-"yes" answer.
    pub gap_categories: Vec<String>,
}

impl SubmissionReceipt {
    /// Build a receipt from an aggregation outcome.
    pub fn new(
        user_id: &str,
        form_id: &str,
        outcome: SubmissionOutcome,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            user_id: user_id.to_string(),
            form_id: form_id.to_string(),
            total_score: outcome.total_score,
            max_possible_score: outcome.max_possible_score,
            percentage: outcome.percentage,
            level: outcome.level,
            export_ready: outcome.level.export_ready(),
            message: outcome.level.message().to_string(),
            description: outcome.level.description().to_string(),
            answers: outcome.answers,
            gap_categories: outcome.gap_categories,
        }
    }

    /// Save the receipt as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize receipt")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write receipt to {}", path.display()))?;
        Ok(())
    }

    /// Load a receipt from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read receipt from {}", path.display()))?;
        let receipt: SubmissionReceipt =
            serde_json::from_str(&content).context("failed to parse receipt JSON")?;
        Ok(receipt)
    }

    /// Compare this receipt against an earlier one for the same form.
    ///
    /// Tracks which questions flipped to "yes" (improvements) and which
    /// flipped away from it (regressions) between the two submissions.
    pub fn compare(&self, baseline: &SubmissionReceipt) -> ProgressReport {
        use std::collections::HashMap;

        let answered_yes = |receipt: &SubmissionReceipt| -> HashMap<String, bool> {
            receipt
                .answers
                .iter()
                .map(|a| (a.question_id.clone(), a.response == "yes"))
                .collect()
        };

        let baseline_yes = answered_yes(baseline);
        let current_yes = answered_yes(self);

        let mut improved = Vec::new();
        let mut regressed = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for (question_id, &now_yes) in &current_yes {
            match baseline_yes.get(question_id) {
                Some(&was_yes) => {
                    if now_yes && !was_yes {
                        improved.push(question_id.clone());
                    } else if !now_yes && was_yes {
                        regressed.push(question_id.clone());
                    } else {
                        unchanged += 1;
                    }
                }
                None => new_questions += 1,
            }
        }
        improved.sort();
        regressed.sort();

        let removed_questions = baseline_yes
            .keys()
            .filter(|id| !current_yes.contains_key(*id))
            .count();

        ProgressReport {
            baseline_percentage: baseline.percentage,
            current_percentage: self.percentage,
            delta: self.percentage - baseline.percentage,
            baseline_level: baseline.level,
            current_level: self.level,
            improved,
            regressed,
            unchanged,
            new_questions,
            removed_questions,
        }
    }
}

/// Result of comparing two submissions of the same form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_percentage: f64,
    pub current_percentage: f64,
    /// Percentage-point change from baseline to current.
    pub delta: f64,
    pub baseline_level: ReadinessLevel,
    pub current_level: ReadinessLevel,
    /// Questions that flipped to "yes".
    pub improved: Vec<String>,
    /// Questions that flipped away from "yes".
    pub regressed: Vec<String>,
    /// Questions answered the same way in both submissions.
    pub unchanged: usize,
    /// Questions answered only in the current submission.
    pub new_questions: usize,
    /// Questions answered only in the baseline submission.
    pub removed_questions: usize,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {:.2}% -> {:.2}% ({:+.2}), level {} -> {}\n\n",
            self.baseline_percentage,
            self.current_percentage,
            self.delta,
            self.baseline_level,
            self.current_level,
        ));

        if !self.regressed.is_empty() {
            md.push_str("### Regressions\n\n");
            for id in &self.regressed {
                md.push_str(&format!("- {id}\n"));
            }
            md.push('\n');
        }

        if !self.improved.is_empty() {
            md.push_str("### Improvements\n\n");
            for id in &self.improved {
                md.push_str(&format!("- {id}\n"));
            }
            md.push('\n');
        }

        md.push_str(&format!(
            "{} unchanged, {} new, {} removed\n",
            self.unchanged, self.new_questions, self.removed_questions
        ));

        md
    }

    /// Returns true if any question flipped away from "yes".
    pub fn has_regressions(&self) -> bool {
        !self.regressed.is_empty()
    }
}
