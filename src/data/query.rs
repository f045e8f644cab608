use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AggregationError, QueryError};

use super::model::{Metric, StockCode, UnifiedRecord};
use super::schema::{Column, IndexLayout};
use super::stats::{summarize, summarize_all, Summary};

// ---------------------------------------------------------------------------
// Dataset – the immutable unified table
// ---------------------------------------------------------------------------

/// A selectable company: code plus its most recently known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyOption {
    pub code: StockCode,
    pub name: String,
}

impl CompanyOption {
    /// `"000001 - 平安银行"`
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// The joined table with pre-computed per-company indices.
///
/// Built once per load and never mutated; shared as `Arc<Dataset>`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<UnifiedRecord>,
    columns: Vec<Column>,
    /// Record indices per company, ascending by year (ties keep table order).
    by_company: BTreeMap<StockCode, Vec<usize>>,
    companies: Vec<CompanyOption>,
    years: Vec<i32>,
    overview: Overview,
}

impl Dataset {
    pub fn new(layout: &IndexLayout, records: Vec<UnifiedRecord>) -> Self {
        let mut columns = layout.columns.clone();
        columns.push(Column::IndustryCode);
        columns.push(Column::IndustryName);

        let mut by_company: BTreeMap<StockCode, Vec<usize>> = BTreeMap::new();
        for (i, r) in records.iter().enumerate() {
            by_company.entry(r.code().clone()).or_default().push(i);
        }
        for indices in by_company.values_mut() {
            indices.sort_by_key(|&i| records[i].year());
        }

        // Latest year wins; among equal years the first row in table order.
        let companies: Vec<CompanyOption> = by_company
            .iter()
            .filter_map(|(code, indices)| {
                let latest = records[*indices.last()?].year();
                let first_latest = indices.iter().find(|&&i| records[i].year() == latest)?;
                Some(CompanyOption {
                    code: code.clone(),
                    name: records[*first_latest].name().to_string(),
                })
            })
            .collect();

        let years: Vec<i32> = records
            .iter()
            .map(UnifiedRecord::year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let overview = Overview {
            companies: companies.len(),
            records: records.len(),
            year_span: years.first().zip(years.last()).map(|(a, b)| (*a, *b)),
            index: summarize(&records, Metric::TransformationIndex),
        };

        Dataset {
            records,
            columns,
            by_company,
            companies,
            years,
            overview,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[UnifiedRecord] {
        &self.records
    }

    /// Columns of the unified table: primary headers in source order, then
    /// the two industry columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Distinct companies, ascending by code.
    pub fn companies(&self) -> &[CompanyOption] {
        &self.companies
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    // -- queries --

    /// All records for `code`, ascending by year.
    pub fn company_history(&self, code: &StockCode) -> Result<Vec<&UnifiedRecord>, QueryError> {
        self.by_company
            .get(code)
            .map(|indices| indices.iter().map(|&i| &self.records[i]).collect())
            .ok_or_else(|| QueryError::NoDataForCompany(code.clone()))
    }

    /// Records for `code` at exactly `year`. An empty result is normal; only
    /// an unknown company is an error.
    pub fn company_year(
        &self,
        code: &StockCode,
        year: i32,
    ) -> Result<Vec<&UnifiedRecord>, QueryError> {
        self.company_bounded_range(code, year, year)
    }

    /// Records for `code` with `min_year <= year <= max_year`, ascending.
    pub fn company_bounded_range(
        &self,
        code: &StockCode,
        min_year: i32,
        max_year: i32,
    ) -> Result<Vec<&UnifiedRecord>, QueryError> {
        Ok(self
            .company_history(code)?
            .into_iter()
            .filter(|r| (min_year..=max_year).contains(&r.year()))
            .collect())
    }

    /// Everything the dashboard shows for one selection.
    pub fn company_view(&self, code: &StockCode, year: i32) -> Result<CompanyView, QueryError> {
        let history: Vec<UnifiedRecord> =
            self.company_history(code)?.into_iter().cloned().collect();
        let year_records: Vec<UnifiedRecord> = history
            .iter()
            .filter(|r| r.year() == year)
            .cloned()
            .collect();

        let name = year_records
            .first()
            .or(history.last())
            .map(|r| r.name().to_string())
            .unwrap_or_default();

        Ok(CompanyView {
            code: code.clone(),
            name,
            year,
            history,
            year_records,
        })
    }

    /// Whole-table figures for the overview cards, computed at construction.
    pub fn overview(&self) -> &Overview {
        &self.overview
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub companies: usize,
    pub records: usize,
    pub year_span: Option<(i32, i32)>,
    pub index: Result<Summary, AggregationError>,
}

/// Owned slices for one (company, year) selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyView {
    pub code: StockCode,
    pub name: String,
    pub year: i32,
    pub history: Vec<UnifiedRecord>,
    year_records: Vec<UnifiedRecord>,
}

impl CompanyView {
    /// Records of the selected year, or [`QueryError::NoDataForCompanyYear`].
    pub fn year_records(&self) -> Result<&[UnifiedRecord], QueryError> {
        if self.year_records.is_empty() {
            Err(QueryError::NoDataForCompanyYear {
                code: self.code.clone(),
                year: self.year,
            })
        } else {
            Ok(&self.year_records)
        }
    }

    /// Value of `metric` at the selected year (first matching record).
    pub fn selected_value(&self, metric: Metric) -> Option<f64> {
        self.year_records.first().and_then(|r| r.metric(metric))
    }

    pub fn year_summaries(
        &self,
    ) -> Result<Vec<(Metric, Result<Summary, AggregationError>)>, QueryError> {
        Ok(summarize_all(self.year_records()?))
    }

    pub fn history_summaries(&self) -> Vec<(Metric, Result<Summary, AggregationError>)> {
        summarize_all(&self.history)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use super::*;
    use crate::data::join::left_join;
    use crate::data::model::{IndexRecord, IndustryRecord, UNKNOWN_INDUSTRY};
    use crate::data::schema::IndexField;

    fn code(raw: &str) -> StockCode {
        StockCode::parse(raw).unwrap()
    }

    fn index(raw: &str, name: &str, year: i32, value: f64) -> IndexRecord {
        IndexRecord {
            code: code(raw),
            name: name.into(),
            year,
            index: Some(value),
            technology: Some(value / 2.0),
            application: Some(value / 2.0),
            total_words: Some(10),
            ai_words: Some(1),
            big_data_words: Some(2),
            cloud_words: Some(3),
            extras: BTreeMap::new(),
        }
    }

    fn dataset(index: Vec<IndexRecord>, industry: Vec<IndustryRecord>) -> Dataset {
        let headers: Vec<String> = IndexField::all().map(|f| f.header().to_string()).collect();
        let layout = IndexLayout::resolve(Path::new("index.csv"), &headers).unwrap();
        let records = left_join(
            Path::new("index.csv"),
            Path::new("industry.csv"),
            &layout,
            index,
            industry,
        )
        .unwrap();
        Dataset::new(&layout, records)
    }

    fn sample() -> Dataset {
        dataset(
            vec![
                index("2", "万科A", 2003, 0.9),
                index("1", "深发展A", 2001, 0.3),
                index("1", "平安银行", 2000, 0.1),
                index("2", "万 科A", 2001, 0.7),
            ],
            vec![IndustryRecord {
                code: code("000001"),
                year: 2001,
                industry_code: Some("J66".into()),
                industry_name: Some("货币金融服务".into()),
            }],
        )
    }

    #[test]
    fn scenario_unknown_industry_and_mean() {
        let ds = dataset(
            vec![index("1", "平安银行", 2000, 0.1), index("1", "平安银行", 2001, 0.3)],
            vec![],
        );
        let c = code("000001");

        let history = ds.company_history(&c).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().map(|r| r.year()).collect::<Vec<_>>(), [2000, 2001]);
        assert_eq!(history[0].industry_name_or_unknown(), UNKNOWN_INDUSTRY);

        assert_eq!(ds.company_year(&c, 2000).unwrap().len(), 1);

        let mean = summarize(history, Metric::TransformationIndex).unwrap().mean;
        assert!((mean - 0.2).abs() < 1e-12);
    }

    #[test]
    fn history_is_sorted_and_scoped_to_company() {
        let ds = sample();
        for option in ds.companies() {
            let history = ds.company_history(&option.code).unwrap();
            assert!(history.windows(2).all(|w| w[0].year() <= w[1].year()));
            assert!(history.iter().all(|r| *r.code() == option.code));
        }
    }

    #[test]
    fn company_year_is_exact_subset_of_history() {
        let ds = sample();
        for r in ds.records() {
            let slice = ds.company_year(r.code(), r.year()).unwrap();
            let history = ds.company_history(r.code()).unwrap();
            assert!(!slice.is_empty());
            for hit in &slice {
                assert_eq!((hit.code(), hit.year()), (r.code(), r.year()));
                assert!(history.contains(hit));
            }
        }
    }

    #[test]
    fn missing_year_and_missing_company_are_distinct() {
        let ds = sample();
        let known = code("1");

        assert_eq!(ds.company_year(&known, 1999).unwrap(), Vec::<&UnifiedRecord>::new());
        let view = ds.company_view(&known, 1999).unwrap();
        assert_eq!(
            view.year_records().unwrap_err(),
            QueryError::NoDataForCompanyYear {
                code: known.clone(),
                year: 1999
            }
        );
        assert_eq!(view.history.len(), 2);

        let unknown = code("999999");
        assert_eq!(
            ds.company_year(&unknown, 2000).unwrap_err(),
            QueryError::NoDataForCompany(unknown.clone())
        );
        assert!(matches!(
            ds.company_view(&unknown, 2000),
            Err(QueryError::NoDataForCompany(_))
        ));
    }

    #[test]
    fn duplicate_keys_are_all_returned() {
        let ds = dataset(
            vec![index("1", "A", 2000, 0.1), index("1", "A", 2000, 0.2)],
            vec![],
        );
        assert_eq!(ds.company_year(&code("1"), 2000).unwrap().len(), 2);
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let ds = sample();
        let c = code("2");
        let years: Vec<i32> = ds
            .company_bounded_range(&c, 2001, 2003)
            .unwrap()
            .iter()
            .map(|r| r.year())
            .collect();
        assert_eq!(years, [2001, 2003]);
        assert!(ds.company_bounded_range(&c, 2004, 2010).unwrap().is_empty());
    }

    #[test]
    fn company_options_use_latest_name() {
        let ds = sample();
        let options: Vec<(String, String)> = ds
            .companies()
            .iter()
            .map(|o| (o.code.to_string(), o.name.clone()))
            .collect();
        assert_eq!(
            options,
            [
                ("000001".to_string(), "深发展A".to_string()),
                ("000002".to_string(), "万科A".to_string()),
            ]
        );
        assert_eq!(ds.companies()[0].label(), "000001 - 深发展A");
        assert_eq!(ds.years(), &[2000, 2001, 2003]);
    }

    #[test]
    fn view_prefers_selected_year_name() {
        let ds = sample();
        let view = ds.company_view(&code("1"), 2000).unwrap();
        assert_eq!(view.name, "平安银行");
        assert_eq!(view.selected_value(Metric::TransformationIndex), Some(0.1));
        assert_eq!(view.year_summaries().unwrap().len(), Metric::ALL.len());
    }

    #[test]
    fn overview_counts_whole_table() {
        let ds = sample();
        let overview = ds.overview();
        assert_eq!(overview.companies, 2);
        assert_eq!(overview.records, 4);
        assert_eq!(overview.year_span, Some((2000, 2003)));
        assert_eq!(overview.index.as_ref().unwrap().max, 0.9);
        assert!(std::ptr::eq(overview, ds.overview()));
    }
}
