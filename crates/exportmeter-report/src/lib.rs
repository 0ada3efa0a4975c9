//! exportmeter-report — HTML report generation.
//!
//! Renders a scored submission as a self-contained HTML page with a
//! thermometer gauge, per-answer breakdown, and improvement
//! recommendations.

pub mod html;

pub use html::{generate_html, write_html_report};
