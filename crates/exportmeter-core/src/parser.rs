//! TOML form-definition parser and answer-file loading.
//!
//! Loads forms from TOML files and directories, validates them, and parses
//! answer batches from TOML or JSON files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Answer, Form, Question};

/// Intermediate TOML structure for parsing form files.
#[derive(Debug, Deserialize)]
struct TomlFormFile {
    form: TomlFormHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlFormHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Parse a single TOML file into a `Form`.
pub fn parse_form(path: &Path) -> Result<Form> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form file: {}", path.display()))?;

    parse_form_str(&content, path)
}

/// Parse a TOML string into a `Form` (useful for testing).
pub fn parse_form_str(content: &str, source_path: &Path) -> Result<Form> {
    let parsed: TomlFormFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut questions = parsed.questions;
    // Stable sort keeps file order for equal indices.
    questions.sort_by_key(|q| q.order_index);

    Ok(Form {
        id: parsed.form.id,
        title: parsed.form.title,
        description: parsed.form.description,
        is_active: parsed.form.is_active,
        questions,
    })
}

/// Recursively load all `.toml` form files from a directory.
pub fn load_forms_directory(dir: &Path) -> Result<Vec<Form>> {
    let mut forms = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            forms.extend(load_forms_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_form(&path) {
                Ok(form) => forms.push(form),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(forms)
}

/// A warning from form validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a form for common issues. Warnings are never fatal.
pub fn validate_form(form: &Form) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if form.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "form has no questions".into(),
        });
    }

    if !form.is_active {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "form is marked inactive and will not be offered".into(),
        });
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for question in &form.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    // Check for empty question text
    for question in &form.questions {
        if question.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "question text is empty".into(),
            });
        }
    }

    // Negative weights break the percentage invariant
    for question in &form.questions {
        if question.weight < 0.0 {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("negative weight: {}", question.weight),
            });
        }
    }

    // Flag questions no answer can earn points on
    for question in &form.questions {
        if question.points_for_yes == 0.0 && question.points_for_no == 0.0 && question.weight > 0.0
        {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "question awards no points for any answer".into(),
            });
        }
    }

    warnings
}

#[derive(Debug, Deserialize)]
struct TomlAnswersFile {
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonAnswers {
    List(Vec<Answer>),
    Wrapped { answers: Vec<Answer> },
}

/// Parse an answer batch from a TOML or JSON file, by extension.
pub fn parse_answers(path: &Path) -> Result<Vec<Answer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;

    parse_answers_str(&content, path)
}

/// Parse an answer batch from a string (useful for testing).
pub fn parse_answers_str(content: &str, source_path: &Path) -> Result<Vec<Answer>> {
    if source_path.extension().is_some_and(|ext| ext == "json") {
        let parsed: JsonAnswers = serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
        Ok(match parsed {
            JsonAnswers::List(answers) => answers,
            JsonAnswers::Wrapped { answers } => answers,
        })
    } else {
        let parsed: TomlAnswersFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
        Ok(parsed.answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[form]
id = "export-readiness"
title = "Export Readiness Assessment"
description = "Weighted yes/no questionnaire"

[[questions]]
id = "q-legal"
text = "Is your business a registered legal entity?"
category = "legal"
weight = 2.0
order_index = 1

[[questions]]
id = "q-capacity"
text = "Can your production scale to meet foreign demand?"
category = "product"
order_index = 2
"#;

    #[test]
    fn parse_valid_toml() {
        let form = parse_form_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(form.id, "export-readiness");
        assert_eq!(form.title, "Export Readiness Assessment");
        assert_eq!(form.questions.len(), 2);
        assert_eq!(form.questions[0].id, "q-legal");
        assert_eq!(form.questions[0].weight, 2.0);
        assert!(form.is_active);
    }

    #[test]
    fn parse_applies_question_defaults() {
        let form = parse_form_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        let q = &form.questions[1];
        assert_eq!(q.weight, 1.0);
        assert_eq!(q.points_for_yes, 1.0);
        assert_eq!(q.points_for_no, 0.0);
    }

    #[test]
    fn parse_sorts_by_order_index() {
        let toml = r#"
[form]
id = "f"
title = "F"

[[questions]]
id = "second"
text = "b"
order_index = 2

[[questions]]
id = "first"
text = "a"
order_index = 1
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(form.questions[0].id, "first");
        assert_eq!(form.questions[1].id, "second");
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_form_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_duplicate_ids() {
        let toml = r#"
[form]
id = "dupes"
title = "Dupes"

[[questions]]
id = "same"
text = "First"

[[questions]]
id = "same"
text = "Second"
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_form(&form);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_empty_text_and_negative_weight() {
        let toml = r#"
[form]
id = "odd"
title = "Odd"

[[questions]]
id = "q1"
text = ""
weight = -1.0
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_form(&form);
        assert!(warnings.iter().any(|w| w.message.contains("empty")));
        assert!(warnings.iter().any(|w| w.message.contains("negative weight")));
    }

    #[test]
    fn validate_pointless_question() {
        let toml = r#"
[form]
id = "zero"
title = "Zero"

[[questions]]
id = "q1"
text = "Scored by nothing?"
points_for_yes = 0.0
points_for_no = 0.0
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_form(&form);
        assert!(warnings.iter().any(|w| w.message.contains("no points")));
    }

    #[test]
    fn validate_inactive_form() {
        let toml = r#"
[form]
id = "off"
title = "Off"
is_active = false

[[questions]]
id = "q1"
text = "Anyone there?"
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_form(&form);
        assert!(warnings.iter().any(|w| w.message.contains("inactive")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("form.toml");
        std::fs::write(&file_path, VALID_TOML).unwrap();

        let forms = load_forms_directory(dir.path()).unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, "export-readiness");
    }

    #[test]
    fn parse_answers_toml() {
        let toml = r#"
[[answers]]
question_id = "q-legal"
value = "yes"

[[answers]]
question_id = "q-capacity"
value = "no"
"#;
        let answers = parse_answers_str(toml, &PathBuf::from("answers.toml")).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_id, "q-legal");
        assert_eq!(answers[0].value, serde_json::json!("yes"));
    }

    #[test]
    fn parse_answers_json_list() {
        let json = r#"[{"question_id": "q1", "value": "yes"}, {"question_id": "q2", "value": true}]"#;
        let answers = parse_answers_str(json, &PathBuf::from("answers.json")).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].value, serde_json::json!(true));
    }

    #[test]
    fn parse_answers_json_wrapped() {
        let json = r#"{"answers": [{"question_id": "q1", "value": "no"}]}"#;
        let answers = parse_answers_str(json, &PathBuf::from("answers.json")).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].question_id, "q1");
    }
}
