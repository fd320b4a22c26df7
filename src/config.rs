use crate::error::BudgetResult;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "university-budget.toml";

/// Dashboard settings, all optional in the TOML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Where "Download CSV" writes the export
    pub export_dir: PathBuf,

    /// tracing EnvFilter directive, overridden by RUST_LOG
    pub log_filter: String,

    /// Log destination; the dashboard stays silent without one
    pub log_file: Option<PathBuf>,

    /// Bind address for the API server
    pub server_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            export_dir: PathBuf::from("."),
            log_filter: "info".to_string(),
            log_file: None,
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> BudgetResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load(path: &Path) -> BudgetResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn load_default() -> BudgetResult<Self> {
        Self::load(Path::new(CONFIG_FILE_NAME))
    }
}
