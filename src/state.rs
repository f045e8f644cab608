use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::data::cache::DatasetCache;
use crate::data::export::export_file;
use crate::data::model::StockCode;
use crate::data::query::{CompanyOption, CompanyView, Dataset};
use crate::error::{ExportError, QueryError};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One-line feedback shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    cache: DatasetCache,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// Blocking load failure; no dataset is served while set.
    pub load_error: Option<String>,

    pub selected_code: Option<StockCode>,
    pub selected_year: Option<i32>,

    /// Text typed into the company search box.
    pub company_search: String,

    /// Derived views for the current selection (cached).
    pub view: Option<Result<CompanyView, QueryError>>,

    /// Overlay technology and application dimensions on the trend chart.
    pub show_dimensions: bool,

    /// Status / error message shown in the top bar.
    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: DatasetCache::default(),
            dataset: None,
            load_error: None,
            selected_code: None,
            selected_year: None,
            company_search: String::new(),
            view: None,
            show_dimensions: false,
            status: None,
        }
    }

    /// Load (or re-use) the dataset from the configured paths. `force`
    /// drops the cached table first.
    pub fn reload(&mut self, force: bool) {
        if force {
            self.cache.invalidate();
        }
        match self
            .cache
            .load(&self.config.index_path, &self.config.industry_path)
        {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load dataset: {e}");
                self.dataset = None;
                self.view = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Ingest a newly loaded dataset. The previous selection survives when
    /// it is still present; otherwise the first company and year are chosen.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let keep_code = self
            .selected_code
            .as_ref()
            .is_some_and(|c| dataset.companies().iter().any(|o| &o.code == c));
        if !keep_code {
            self.selected_code = dataset.companies().first().map(|o| o.code.clone());
        }
        let keep_year = self
            .selected_year
            .is_some_and(|y| dataset.years().contains(&y));
        if !keep_year {
            self.selected_year = dataset.years().first().copied();
        }

        self.dataset = Some(dataset);
        self.load_error = None;
        self.status = None;
        self.refresh_view();
    }

    /// Recompute the derived views after a selection change.
    pub fn refresh_view(&mut self) {
        self.view = match (&self.dataset, &self.selected_code, self.selected_year) {
            (Some(ds), Some(code), Some(year)) => Some(ds.company_view(code, year)),
            _ => None,
        };
        if let Some(Err(e)) = &self.view {
            log::warn!("{e}");
        }
    }

    pub fn select_company(&mut self, code: StockCode) {
        if self.selected_code.as_ref() != Some(&code) {
            self.selected_code = Some(code);
            self.refresh_view();
        }
    }

    pub fn select_year(&mut self, year: i32) {
        if self.selected_year != Some(year) {
            self.selected_year = Some(year);
            self.refresh_view();
        }
    }

    /// Companies whose label contains the search text (case-insensitive).
    pub fn filtered_companies(&self) -> Vec<CompanyOption> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        let needle = self.company_search.trim().to_lowercase();
        ds.companies()
            .iter()
            .filter(|o| needle.is_empty() || o.label().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn export_file_name(&self) -> Option<String> {
        self.selected_code
            .as_ref()
            .map(|code| self.config.export_file_name_for(code))
    }

    /// Write the selected company's export window to `path`; returns the
    /// number of rows written.
    pub fn export_to(&self, path: &Path) -> Result<usize> {
        let dataset = self.dataset.as_ref().context("no dataset loaded")?;
        let code = self.selected_code.as_ref().context("no company selected")?;
        let window = self.config.export_window;

        let slice = dataset.company_bounded_range(code, window.start, window.end)?;
        if slice.is_empty() {
            return Err(ExportError::EmptySlice(code.clone()).into());
        }
        export_file(path, dataset.columns(), &slice)
            .with_context(|| format!("exporting {code} to {}", path.display()))?;
        Ok(slice.len())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::YearWindow;

    const INDEX: &str = "股票代码,企业名称,年份,数字化转型指数,技术维度,应用维度,词总,人工智能词频数,大数据词频数,云计算词频数\n\
                         2,万科A,2001,0.7,0.3,0.4,80,0,0,0\n\
                         1,平安银行,2000,0.1,0.05,0.05,100,1,1,1\n\
                         1,平安银行,2001,0.3,0.1,0.2,120,2,2,2\n";
    const INDUSTRY: &str = "股票代码全称,年度,行业代码,行业名称\n1,2001,J66,货币金融服务\n";

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.csv");
        let industry = dir.path().join("industry.csv");
        std::fs::write(&index, INDEX).unwrap();
        std::fs::write(&industry, INDUSTRY).unwrap();

        let config = DashboardConfig {
            index_path: index,
            industry_path: industry,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.reload(false);
        (dir, state)
    }

    #[test]
    fn first_company_and_year_are_selected() {
        let (_dir, state) = state();
        assert_eq!(state.selected_code.as_ref().map(StockCode::as_str), Some("000001"));
        assert_eq!(state.selected_year, Some(2000));

        let view = state.view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.year_records().unwrap().len(), 1);
    }

    #[test]
    fn year_without_data_keeps_history() {
        let (_dir, mut state) = state();
        state.select_company(StockCode::parse("2").unwrap());
        state.select_year(2000);

        let view = state.view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(view.history.len(), 1);
        assert!(matches!(
            view.year_records(),
            Err(QueryError::NoDataForCompanyYear { year: 2000, .. })
        ));
    }

    #[test]
    fn unknown_company_is_reported_as_such() {
        let (_dir, mut state) = state();
        state.select_company(StockCode::parse("999999").unwrap());
        assert!(matches!(
            state.view,
            Some(Err(QueryError::NoDataForCompany(_)))
        ));
    }

    #[test]
    fn search_matches_code_or_name() {
        let (_dir, mut state) = state();
        state.company_search = "万科".into();
        let hits = state.filtered_companies();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code.as_str(), "000002");

        state.company_search = "00000".into();
        assert_eq!(state.filtered_companies().len(), 2);
    }

    #[test]
    fn missing_source_blocks_the_session() {
        let (_dir, mut state) = state();
        state.config.index_path = PathBuf::from("/missing/index.xlsx");
        state.reload(true);
        assert!(state.dataset.is_none());
        assert!(state.view.is_none());
        assert!(state.load_error.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn export_writes_window_rows() {
        let (dir, mut state) = state();
        let out = dir.path().join("out.csv");
        assert_eq!(state.export_to(&out).unwrap(), 2);
        assert!(out.is_file());

        state.config.export_window = YearWindow { start: 1990, end: 1995 };
        let err = state.export_to(&out).unwrap_err();
        assert!(err.downcast_ref::<ExportError>().is_some());
    }
}
