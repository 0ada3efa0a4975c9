//! The `exportmeter validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(forms_path: PathBuf) -> Result<()> {
    let forms = if forms_path.is_dir() {
        exportmeter_core::parser::load_forms_directory(&forms_path)?
    } else {
        vec![exportmeter_core::parser::parse_form(&forms_path)?]
    };

    let mut total_warnings = 0;

    for form in &forms {
        println!("Form: {} ({} questions)", form.title, form.questions.len());

        let warnings = exportmeter_core::parser::validate_form(form);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All forms valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
