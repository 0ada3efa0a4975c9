//! The `exportmeter compare` command.

use std::path::PathBuf;

use anyhow::Result;

use exportmeter_core::report::SubmissionReceipt;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = SubmissionReceipt::load_json(&baseline_path)?;
    let current = SubmissionReceipt::load_json(&current_path)?;

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Progress: {:.2}% -> {:.2}% ({:+.2}), level {} -> {}",
                report.baseline_percentage,
                report.current_percentage,
                report.delta,
                report.baseline_level,
                report.current_level,
            );
            println!(
                "{} regression(s), {} improvement(s), {} unchanged",
                report.regressed.len(),
                report.improved.len(),
                report.unchanged
            );

            if !report.regressed.is_empty() {
                println!("\nRegressions (flipped away from yes):");
                for id in &report.regressed {
                    println!("  {id}");
                }
            }

            if !report.improved.is_empty() {
                println!("\nImprovements (flipped to yes):");
                for id in &report.improved {
                    println!("  {id}");
                }
            }

            if report.new_questions > 0 {
                println!("\n{} new question(s)", report.new_questions);
            }
            if report.removed_questions > 0 {
                println!("{} removed question(s)", report.removed_questions);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
