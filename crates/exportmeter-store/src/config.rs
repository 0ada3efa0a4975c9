//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use exportmeter_core::engine::EngineConfig;
use exportmeter_core::recommend::RecommendationMap;
use exportmeter_core::scoring::ReadinessBands;
use exportmeter_core::traits::Backend;

use crate::local::LocalStore;
use crate::rest::RestStore;

/// Configuration for a storage backend.
///
/// Note: Custom Debug impl masks credentials to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Rest {
        base_url: String,
        api_key: String,
        /// Optional per-user bearer token; defaults to the API key.
        #[serde(default)]
        auth_token: Option<String>,
    },
    Local {
        #[serde(default = "default_forms_dir")]
        forms_dir: PathBuf,
        #[serde(default = "default_data_path")]
        data_path: PathBuf,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Rest {
                api_key: _,
                auth_token,
                base_url,
            } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .field("auth_token", &auth_token.as_ref().map(|_| "***"))
                .finish(),
            BackendConfig::Local {
                forms_dir,
                data_path,
            } => f
                .debug_struct("Local")
                .field("forms_dir", forms_dir)
                .field("data_path", data_path)
                .finish(),
        }
    }
}

fn default_forms_dir() -> PathBuf {
    PathBuf::from("./forms")
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./exportmeter-data/scores.json")
}

fn default_backend() -> BackendConfig {
    BackendConfig::Local {
        forms_dir: default_forms_dir(),
        data_path: default_data_path(),
    }
}

/// Top-level exportmeter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportmeterConfig {
    /// Storage backend to use.
    #[serde(default = "default_backend")]
    pub backend: BackendConfig,
    /// Form submitted when the CLI is invoked without `--form`.
    #[serde(default)]
    pub default_form: Option<String>,
    /// Readiness band thresholds.
    #[serde(default)]
    pub bands: ReadinessBands,
    /// Improvement suggestions per question category.
    #[serde(default)]
    pub recommendations: RecommendationMap,
    /// Max retries on transient store errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Output directory for receipts and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./exportmeter-results")
}

impl Default for ExportmeterConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            default_form: None,
            bands: ReadinessBands::default(),
            recommendations: RecommendationMap::default(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
        }
    }
}

impl ExportmeterConfig {
    /// Engine configuration derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            bands: self.bands,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Resolve env vars in a backend config.
fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Rest {
            base_url,
            api_key,
            auth_token,
        } => BackendConfig::Rest {
            base_url: resolve_env_vars(base_url),
            api_key: resolve_env_vars(api_key),
            auth_token: auth_token.as_ref().map(|t| resolve_env_vars(t)),
        },
        BackendConfig::Local { .. } => config.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `exportmeter.toml` in the current directory
/// 2. `~/.config/exportmeter/config.toml`
///
/// Environment variable overrides: `EXPORTMETER_BASE_URL`,
/// `EXPORTMETER_API_KEY`.
pub fn load_config() -> Result<ExportmeterConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExportmeterConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("exportmeter.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExportmeterConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExportmeterConfig::default(),
    };

    // Apply env var overrides. A base URL from the environment promotes a
    // local backend to the REST one.
    if let Ok(url) = std::env::var("EXPORTMETER_BASE_URL") {
        config.backend = match config.backend {
            BackendConfig::Rest {
                api_key,
                auth_token,
                ..
            } => BackendConfig::Rest {
                base_url: url,
                api_key,
                auth_token,
            },
            BackendConfig::Local { .. } => BackendConfig::Rest {
                base_url: url,
                api_key: String::new(),
                auth_token: None,
            },
        };
    }
    if let Ok(key) = std::env::var("EXPORTMETER_API_KEY") {
        if let BackendConfig::Rest { api_key, .. } = &mut config.backend {
            *api_key = key;
        }
    }

    config.backend = resolve_backend_config(&config.backend);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("exportmeter"))
}

/// Create a backend instance from its configuration.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    match config {
        BackendConfig::Rest {
            base_url,
            api_key,
            auth_token,
        } => Ok(Arc::new(RestStore::new(
            base_url,
            api_key,
            auth_token.clone(),
        ))),
        BackendConfig::Local {
            forms_dir,
            data_path,
        } => Ok(Arc::new(LocalStore::open(forms_dir, data_path)?)),
    }
}
