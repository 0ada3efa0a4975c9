//! The `exportmeter init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create exportmeter.toml
    if std::path::Path::new("exportmeter.toml").exists() {
        println!("exportmeter.toml already exists, skipping.");
    } else {
        std::fs::write("exportmeter.toml", SAMPLE_CONFIG)?;
        println!("Created exportmeter.toml");
    }

    // Create example form
    std::fs::create_dir_all("forms")?;
    let form_path = std::path::Path::new("forms/example.toml");
    if form_path.exists() {
        println!("forms/example.toml already exists, skipping.");
    } else {
        std::fs::write(form_path, EXAMPLE_FORM)?;
        println!("Created forms/example.toml");
    }

    // Create example answers
    let answers_path = std::path::Path::new("answers-example.toml");
    if answers_path.exists() {
        println!("answers-example.toml already exists, skipping.");
    } else {
        std::fs::write(answers_path, EXAMPLE_ANSWERS)?;
        println!("Created answers-example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit forms/example.toml with your questionnaire");
    println!("  2. Run: exportmeter validate --forms forms/example.toml");
    println!("  3. Run: exportmeter submit --answers answers-example.toml --user you@example.com");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# exportmeter configuration

default_form = "example"

[backend]
type = "local"
forms_dir = "forms"
data_path = "exportmeter-data/scores.json"

# For a hosted Supabase-style backend instead:
# [backend]
# type = "rest"
# base_url = "${EXPORTMETER_BASE_URL}"
# api_key = "${EXPORTMETER_API_KEY}"

[bands]
excellent = 85.0
good = 70.0
moderate = 50.0
low = 30.0

[recommendations]
documentation = [
    "Prepare a certificate of origin",
    "Review the customs paperwork required by your target market",
]
finance = [
    "Open a foreign-currency account",
    "Evaluate export credit insurance",
]
product = [
    "Check certification requirements for your target market",
]
"#;

const EXAMPLE_FORM: &str = r#"[form]
id = "example"
title = "Example Export Readiness Form"
description = "A short starter questionnaire"

[[questions]]
id = "q-entity"
text = "Is your business a registered legal entity?"
category = "documentation"
weight = 2.0
order_index = 1

[[questions]]
id = "q-capacity"
text = "Can your production scale to meet foreign demand?"
category = "product"
weight = 1.0
order_index = 2

[[questions]]
id = "q-finance"
text = "Do you have financing available for export operations?"
category = "finance"
weight = 1.0
order_index = 3
"#;

const EXAMPLE_ANSWERS: &str = r#"[[answers]]
question_id = "q-entity"
value = "yes"

[[answers]]
question_id = "q-capacity"
value = "yes"

[[answers]]
question_id = "q-finance"
value = "no"
"#;
