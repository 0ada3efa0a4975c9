//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use exportmeter_core::recommend::RecommendationMap;
use exportmeter_core::report::SubmissionReceipt;
use exportmeter_core::scoring::ReadinessLevel;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Hex color for a readiness band.
fn level_hex(level: ReadinessLevel) -> &'static str {
    match level {
        ReadinessLevel::Excellent => "#388e3c",
        ReadinessLevel::Good => "#7cb342",
        ReadinessLevel::Moderate => "#fdd835",
        ReadinessLevel::Low => "#fb8c00",
        ReadinessLevel::Critical => "#e53935",
    }
}

/// Generate an HTML report for a scored submission.
pub fn generate_html(receipt: &SubmissionReceipt, recommendations: &RecommendationMap) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>exportmeter report — {}</title>\n",
        html_escape(&receipt.form_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Export readiness report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Form: <strong>{}</strong> | User: {} | {}</p>\n",
        html_escape(&receipt.form_id),
        html_escape(&receipt.user_id),
        receipt.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Thermometer gauge + verdict
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Result</h2>\n");
    html.push_str("<div class=\"verdict\">\n");
    html.push_str(&generate_thermometer(receipt.percentage, receipt.level));
    html.push_str(&format!(
        "<div class=\"verdict-text\">\
         <p class=\"percentage\" style=\"color: {}\">{:.2}%</p>\
         <p class=\"level\">{}</p>\
         <p class=\"message\">{}</p>\
         <p class=\"description\">{}</p>\
         </div>\n",
        level_hex(receipt.level),
        receipt.percentage,
        receipt.level,
        html_escape(&receipt.message),
        html_escape(&receipt.description),
    ));
    html.push_str("</div>\n");

    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Total score</th><th>Max possible</th><th>Percentage</th><th>Level</th><th>Export ready</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{:.2}%</td><td>{}</td><td>{}</td></tr></tbody>\n",
        receipt.total_score,
        receipt.max_possible_score,
        receipt.percentage,
        receipt.level,
        if receipt.export_ready { "yes" } else { "no" },
    ));
    html.push_str("</table>\n");
    html.push_str("</section>\n");

    // Per-answer breakdown
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Answers</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"answers\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Response</th><th onclick=\"sortTable(2)\">Points</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for answer in &receipt.answers {
        let row_class = if answer.response == "yes" { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row_class,
            html_escape(&answer.question_id),
            html_escape(&answer.response),
            answer.points,
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Recommendations for gap categories
    let suggestions = recommendations.suggestions_for(&receipt.gap_categories);
    if !suggestions.is_empty() {
        html.push_str("<section class=\"recommendations\">\n");
        html.push_str("<h2>Recommendations</h2>\n");
        for (category, items) in suggestions {
            html.push_str(&format!("<h3>{}</h3>\n<ul>\n", html_escape(category)));
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", html_escape(item)));
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(receipt)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(
    receipt: &SubmissionReceipt,
    recommendations: &RecommendationMap,
    path: &Path,
) -> Result<()> {
    let html = generate_html(receipt, recommendations);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// SVG thermometer gauge filled to the given percentage.
fn generate_thermometer(percentage: f64, level: ReadinessLevel) -> String {
    let tube_width = 48;
    let tube_height = 220;
    let fill = (percentage.clamp(0.0, 100.0) / 100.0 * tube_height as f64) as usize;
    let fill_y = tube_height - fill;
    let color = level_hex(level);

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        tube_width + 20,
        tube_height + 20
    );
    svg.push_str(&format!(
        "  <rect x=\"10\" y=\"10\" width=\"{tube_width}\" height=\"{tube_height}\" fill=\"#e5e7eb\" rx=\"24\"/>\n"
    ));
    svg.push_str(&format!(
        "  <rect x=\"10\" y=\"{}\" width=\"{tube_width}\" height=\"{fill}\" fill=\"{color}\" rx=\"24\"/>\n",
        fill_y + 10,
    ));
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.verdict { display: flex; align-items: center; gap: 2rem; }
.verdict-text .percentage { font-size: 2.5rem; font-weight: bold; margin: 0; }
.verdict-text .level { font-size: 1.25rem; text-transform: uppercase; letter-spacing: 0.05em; margin: 0.25rem 0; }
.verdict-text .description { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('answers');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
