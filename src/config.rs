use crate::constants::*;
use crate::error::{ReportError, Result};
use crate::pipeline::output::OutputFormat;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const ENV_INPUT: &str = "SALES_REPORTS_INPUT";
pub const ENV_OUTPUT_DIR: &str = "SALES_REPORTS_OUTPUT_DIR";
pub const ENV_FORMAT: &str = "SALES_REPORTS_FORMAT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Workbook file or directory of `<sheet>.csv` files
    pub path: PathBuf,
    pub orders_sheet: String,
    pub returns_sheet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
    /// File name override; defaults to `Operational_Report.<ext>`
    pub operational_file: Option<String>,
    pub executive_file: Option<String>,
    pub write_manifest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub operational_rows: usize,
    pub executive_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/Superstore.xlsx"),
            orders_sheet: ORDERS_SHEET.to_string(),
            returns_sheet: RETURNS_SHEET.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: OutputFormat::Csv,
            operational_file: None,
            executive_file: None,
            write_manifest: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            operational_rows: DEFAULT_OPERATIONAL_ROWS,
            executive_rows: DEFAULT_EXECUTIVE_ROWS,
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; without one,
    /// `config.toml` is read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !config_path.exists() {
            if required {
                return Err(ReportError::Config(format!(
                    "config file '{}' does not exist",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ReportError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SALES_REPORTS_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; blank values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(input) = get(ENV_INPUT) {
            self.input.path = PathBuf::from(input);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(format) = get(ENV_FORMAT) {
            self.output.format = OutputFormat::from_str(format.trim(), true).map_err(|e| {
                ReportError::Config(format!("invalid {}: {}", ENV_FORMAT, e))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.orders_sheet.trim().is_empty() || self.input.returns_sheet.trim().is_empty() {
            return Err(ReportError::Config("sheet names must not be empty".to_string()));
        }
        if self.input.orders_sheet == self.input.returns_sheet {
            return Err(ReportError::Config(format!(
                "orders and returns must be different sheets (both are '{}')",
                self.input.orders_sheet
            )));
        }
        Ok(())
    }

    pub fn operational_path(&self) -> PathBuf {
        self.output_path(self.output.operational_file.as_deref(), OPERATIONAL_FILE_STEM)
    }

    pub fn executive_path(&self) -> PathBuf {
        self.output_path(self.output.executive_file.as_deref(), EXECUTIVE_FILE_STEM)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output.dir.join(MANIFEST_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.output.dir.join(METRICS_FILE)
    }

    fn output_path(&self, file: Option<&str>, stem: &str) -> PathBuf {
        match file {
            Some(name) => self.output.dir.join(name),
            None => self
                .output
                .dir
                .join(format!("{}.{}", stem, self.output.format.extension())),
        }
    }
}
