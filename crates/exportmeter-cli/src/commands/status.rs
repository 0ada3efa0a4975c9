//! The `exportmeter status` command.

use std::path::PathBuf;

use anyhow::Result;

use exportmeter_core::engine::SubmissionEngine;
use exportmeter_store::config::load_config_from;
use exportmeter_store::create_backend;

pub async fn execute(
    form: Option<String>,
    user: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let form_id = super::resolve_form(form, &config)?;

    let backend = create_backend(&config.backend)?;
    let engine = SubmissionEngine::new(backend, config.engine_config());

    match engine.status(&user, &form_id).await? {
        Some(record) => {
            use comfy_table::{Cell, Table};

            let mut table = Table::new();
            table.set_header(vec![
                "Form",
                "Score",
                "Percentage",
                "Level",
                "Export ready",
                "Completed at",
            ]);
            table.add_row(vec![
                Cell::new(&record.form_id),
                Cell::new(format!(
                    "{} / {}",
                    record.total_score, record.max_possible_score
                )),
                Cell::new(format!("{:.2}%", record.percentage)),
                Cell::new(record.level),
                Cell::new(if record.export_ready { "yes" } else { "no" }),
                Cell::new(record.completed_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ]);
            println!("{table}");
        }
        None => {
            println!("Not evaluated yet.");
            println!("Complete the questionnaire to see your export readiness level.");
        }
    }

    Ok(())
}
