//! Typegen configuration
//!
//! Configuration is read from the working directory, in order of precedence:
//! 1. `sanity.cli.toml` with a `[typegen]` table
//! 2. `sanity-typegen.json` (legacy)
//! 3. built-in defaults
//!
//! Every key is optional; missing keys fall back to the defaults below.

use crate::errors::{Result, TypegenError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CLI_CONFIG_FILE: &str = "sanity.cli.toml";
pub const LEGACY_CONFIG_FILE: &str = "sanity-typegen.json";
pub const DEFAULT_SCHEMA_PATH: &str = "./schema.json";
pub const DEFAULT_GENERATES_PATH: &str = "./sanity.types.ts";

fn default_search_path() -> SearchPath {
    SearchPath::Multiple(vec![
        "./src/**/*.{ts,tsx,js,jsx,mjs,cjs,astro}".to_string(),
        "./app/**/*.{ts,tsx,js,jsx,mjs,cjs}".to_string(),
        "./sanity/**/*.{ts,tsx,js,jsx,mjs,cjs}".to_string(),
    ])
}

fn default_schema() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEMA_PATH)
}

fn default_generates() -> PathBuf {
    PathBuf::from(DEFAULT_GENERATES_PATH)
}

fn default_true() -> bool {
    true
}

/// A single glob or a list of globs for query source files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchPath {
    Single(String),
    Multiple(Vec<String>),
}

impl SearchPath {
    pub fn patterns(&self) -> Vec<String> {
        match self {
            SearchPath::Single(pattern) => vec![pattern.clone()],
            SearchPath::Multiple(patterns) => patterns.clone(),
        }
    }
}

/// Resolved typegen configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGenConfig {
    #[serde(default = "default_schema")]
    pub schema: PathBuf,

    #[serde(default = "default_search_path")]
    pub path: SearchPath,

    #[serde(default = "default_generates")]
    pub generates: PathBuf,

    #[serde(default = "default_true")]
    pub overload_client_methods: bool,

    #[serde(default = "default_true")]
    pub format_generated_code: bool,
}

impl Default for TypeGenConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            path: default_search_path(),
            generates: default_generates(),
            overload_client_methods: true,
            format_generated_code: true,
        }
    }
}

/// Where the configuration came from, reported with telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigMethod {
    Cli,
    Legacy,
    Default,
}

impl fmt::Display for ConfigMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigMethod::Cli => "cli",
            ConfigMethod::Legacy => "legacy",
            ConfigMethod::Default => "default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TypeGenConfig,
    pub method: ConfigMethod,
    /// File the config was read from; `None` for defaults
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CliConfigFile {
    typegen: Option<TypeGenConfig>,
}

/// Resolve configuration for `work_dir`, or from an explicit file
pub async fn resolve_config(work_dir: &Path, explicit: Option<&Path>) -> Result<ResolvedConfig> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            work_dir.join(path)
        };
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let (config, method) = if is_toml {
            (read_cli_config(&path).await?, ConfigMethod::Cli)
        } else {
            (read_legacy_config(&path).await?, ConfigMethod::Legacy)
        };
        return Ok(ResolvedConfig {
            config,
            method,
            path: Some(path),
        });
    }

    let cli_path = work_dir.join(CLI_CONFIG_FILE);
    if tokio::fs::try_exists(&cli_path).await.unwrap_or(false) {
        return Ok(ResolvedConfig {
            config: read_cli_config(&cli_path).await?,
            method: ConfigMethod::Cli,
            path: Some(cli_path),
        });
    }

    let legacy_path = work_dir.join(LEGACY_CONFIG_FILE);
    if tokio::fs::try_exists(&legacy_path).await.unwrap_or(false) {
        return Ok(ResolvedConfig {
            config: read_legacy_config(&legacy_path).await?,
            method: ConfigMethod::Legacy,
            path: Some(legacy_path),
        });
    }

    debug!("No typegen config found in {}, using defaults", work_dir.display());
    Ok(ResolvedConfig {
        config: TypeGenConfig::default(),
        method: ConfigMethod::Default,
        path: None,
    })
}

async fn read_config_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        TypegenError::ConfigResolution(format!("Failed to read {}: {}", path.display(), e))
    })
}

async fn read_cli_config(path: &Path) -> Result<TypeGenConfig> {
    let content = read_config_file(path).await?;
    let file: CliConfigFile = toml::from_str(&content).map_err(|e| {
        TypegenError::ConfigResolution(format!("Error in config file {}: {}", path.display(), e))
    })?;
    debug!("Loaded typegen config from {}", path.display());
    Ok(file.typegen.unwrap_or_default())
}

async fn read_legacy_config(path: &Path) -> Result<TypeGenConfig> {
    let content = read_config_file(path).await?;
    let config = serde_json::from_str(&content).map_err(|e| {
        TypegenError::ConfigResolution(format!("Error in config file {}: {}", path.display(), e))
    })?;
    debug!("Loaded legacy typegen config from {}", path.display());
    Ok(config)
}
