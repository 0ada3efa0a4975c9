pub mod compare;
pub mod forms;
pub mod init;
pub mod results;
pub mod status;
pub mod submit;
pub mod validate;

use anyhow::Result;
use exportmeter_store::ExportmeterConfig;

/// Resolve the form id from the CLI argument or the configured default.
pub(crate) fn resolve_form(arg: Option<String>, config: &ExportmeterConfig) -> Result<String> {
    arg.or_else(|| config.default_form.clone()).ok_or_else(|| {
        anyhow::anyhow!("no form specified (use --form or set default_form in exportmeter.toml)")
    })
}
