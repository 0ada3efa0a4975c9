//! The `exportmeter forms` command.

use std::path::PathBuf;

use anyhow::Result;

use exportmeter_core::traits::QuestionSource;
use exportmeter_store::config::load_config_from;
use exportmeter_store::create_backend;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config.backend)?;

    let forms = backend.forms().await?;
    if forms.is_empty() {
        println!("No active forms. Run `exportmeter init` to create an example form.");
        return Ok(());
    }

    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Description"]);
    for form in &forms {
        table.add_row(vec![
            Cell::new(&form.id),
            Cell::new(&form.title),
            Cell::new(&form.description),
        ]);
    }
    println!("{table}");

    Ok(())
}
