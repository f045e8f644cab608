use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::model::StockCode;
use crate::error::ConfigError;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "DTI_DASHBOARD_CONFIG";
/// Looked up in the working directory when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "dti-dashboard.json";

/// Inclusive range of years offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub index_path: PathBuf,
    pub industry_path: PathBuf,
    pub export_window: YearWindow,
    /// Supports `{start}`, `{end}` and `{code}` placeholders.
    pub export_file_name: String,
    /// Font with CJK glyphs for company and industry names.
    pub cjk_font: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("1999-2023数值化转型指数数据汇总表.xlsx"),
            industry_path: PathBuf::from("最终数据dta格式-上市公司年度行业代码至2021.xlsx"),
            export_window: YearWindow {
                start: 1999,
                end: 2023,
            },
            export_file_name: "{start}-{end}_数字化转型指数原始数据.csv".to_string(),
            cjk_font: None,
        }
    }
}

impl DashboardConfig {
    pub fn export_file_name_for(&self, code: &StockCode) -> String {
        self.export_file_name
            .replace("{start}", &self.export_window.start.to_string())
            .replace("{end}", &self.export_window.end.to_string())
            .replace("{code}", code.as_str())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let YearWindow { start, end } = self.export_window;
        if start > end {
            return Err(ConfigError::InvertedWindow { start, end });
        }
        Ok(self)
    }
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DashboardConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()
}

/// `$DTI_DASHBOARD_CONFIG`, else `./dti-dashboard.json` if present, else defaults.
pub fn resolve_config() -> Result<DashboardConfig, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        log::info!("Loading config from {} (set by {CONFIG_ENV})", path.display());
        return load_config(&path);
    }

    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        log::info!("Loading config from {}", local.display());
        return load_config(local);
    }

    log::info!("No config file found; using defaults");
    Ok(DashboardConfig::default())
}
