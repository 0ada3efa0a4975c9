//! The `exportmeter submit` command.

use std::path::PathBuf;

use anyhow::Result;

use exportmeter_core::engine::SubmissionEngine;
use exportmeter_core::parser;
use exportmeter_core::recommend::RecommendationMap;
use exportmeter_core::report::SubmissionReceipt;
use exportmeter_report::write_html_report;
use exportmeter_store::config::load_config_from;
use exportmeter_store::create_backend;

pub async fn execute(
    form: Option<String>,
    answers_path: PathBuf,
    user: String,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let form_id = super::resolve_form(form, &config)?;

    let answers = parser::parse_answers(&answers_path)?;
    let backend = create_backend(&config.backend)?;
    let engine = SubmissionEngine::new(backend, config.engine_config());

    let receipt = engine.submit(&user, &form_id, &answers).await?;

    print_summary(&receipt);
    print_recommendations(&receipt, &config.recommendations);

    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = receipt.created_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "text" => {}
            "json" => {
                let path = output_dir.join(format!("receipt-{timestamp}.json"));
                receipt.save_json(&path)?;
                eprintln!("Receipt saved to: {}", path.display());
            }
            "html" => {
                let path = output_dir.join(format!("report-{timestamp}.html"));
                write_html_report(&receipt, &config.recommendations, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(receipt: &SubmissionReceipt) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Form", "Score", "Percentage", "Level", "Export ready"]);
    table.add_row(vec![
        Cell::new(&receipt.form_id),
        Cell::new(format!(
            "{} / {}",
            receipt.total_score, receipt.max_possible_score
        )),
        Cell::new(format!("{:.2}%", receipt.percentage)),
        Cell::new(receipt.level),
        Cell::new(if receipt.export_ready { "yes" } else { "no" }),
    ]);

    println!("{table}");
    println!("\n{}", receipt.message);
    println!("{}", receipt.description);
}

fn print_recommendations(receipt: &SubmissionReceipt, recommendations: &RecommendationMap) {
    let suggestions = recommendations.suggestions_for(&receipt.gap_categories);
    if suggestions.is_empty() {
        return;
    }

    println!("\nRecommended next steps:");
    for (category, items) in suggestions {
        println!("  [{category}]");
        for item in items {
            println!("    - {item}");
        }
    }
}
