use std::collections::HashSet;
use std::path::Path;

use crate::error::LoadError;

use super::model::Metric;

// ---------------------------------------------------------------------------
// Canonical headers
// ---------------------------------------------------------------------------

pub const CODE_HEADER: &str = "股票代码";
pub const NAME_HEADER: &str = "企业名称";
pub const YEAR_HEADER: &str = "年份";
pub const INDUSTRY_CODE_HEADER: &str = "行业代码";
pub const INDUSTRY_NAME_HEADER: &str = "行业名称";

/// Headers of the industry-classification source before renaming.
pub const INDUSTRY_SOURCE_CODE_HEADER: &str = "股票代码全称";
pub const INDUSTRY_SOURCE_YEAR_HEADER: &str = "年度";

/// Strip every whitespace character (newlines and full-width spaces
/// included) and byte-order marks from a raw header.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{feff}')
        .collect()
}

// ---------------------------------------------------------------------------
// Field enumeration
// ---------------------------------------------------------------------------

/// Fixed fields of the transformation-index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    Code,
    Name,
    Year,
    Metric(Metric),
}

impl IndexField {
    pub fn all() -> impl Iterator<Item = IndexField> {
        [IndexField::Code, IndexField::Name, IndexField::Year]
            .into_iter()
            .chain(Metric::ALL.into_iter().map(IndexField::Metric))
    }

    pub fn header(self) -> &'static str {
        match self {
            IndexField::Code => CODE_HEADER,
            IndexField::Name => NAME_HEADER,
            IndexField::Year => YEAR_HEADER,
            IndexField::Metric(m) => m.header(),
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        Self::all().find(|f| f.header() == header)
    }
}

/// A column of the unified table, in display/export order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Index(IndexField),
    /// A primary-table column outside the fixed schema, carried verbatim.
    Extra(String),
    IndustryCode,
    IndustryName,
}

impl Column {
    pub fn header(&self) -> &str {
        match self {
            Column::Index(field) => field.header(),
            Column::Extra(name) => name,
            Column::IndustryCode => INDUSTRY_CODE_HEADER,
            Column::IndustryName => INDUSTRY_NAME_HEADER,
        }
    }
}

// ---------------------------------------------------------------------------
// Layout resolution
// ---------------------------------------------------------------------------

/// Column layout of the primary table: one entry per source column, plus
/// the resolved position of every fixed field.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexLayout {
    pub columns: Vec<Column>,
    pub code: usize,
    pub name: usize,
    pub year: usize,
    pub metrics: Vec<(Metric, usize)>,
    pub extras: Vec<(String, usize)>,
}

impl IndexLayout {
    /// Map normalized headers onto [`IndexField`]s. Every fixed field must be
    /// present exactly once.
    pub fn resolve(path: &Path, headers: &[String]) -> Result<Self, LoadError> {
        check_unique(path, headers.iter().map(String::as_str))?;

        let columns: Vec<Column> = headers
            .iter()
            .map(|h| match IndexField::from_header(h) {
                Some(field) => Column::Index(field),
                None => Column::Extra(h.clone()),
            })
            .collect();

        let find = |field: IndexField| {
            columns
                .iter()
                .position(|c| *c == Column::Index(field))
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: field.header().to_string(),
                })
        };

        let code = find(IndexField::Code)?;
        let name = find(IndexField::Name)?;
        let year = find(IndexField::Year)?;
        let metrics = Metric::ALL
            .iter()
            .map(|&m| find(IndexField::Metric(m)).map(|i| (m, i)))
            .collect::<Result<Vec<_>, LoadError>>()?;
        let extras = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                Column::Extra(h) => Some((h.clone(), i)),
                _ => None,
            })
            .collect();

        Ok(IndexLayout {
            columns,
            code,
            name,
            year,
            metrics,
            extras,
        })
    }
}

/// Positions of the four projected columns in the industry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndustryLayout {
    pub code: usize,
    pub year: usize,
    pub industry_code: usize,
    pub industry_name: usize,
}

impl IndustryLayout {
    pub fn resolve(path: &Path, headers: &[String]) -> Result<Self, LoadError> {
        let wanted = [
            INDUSTRY_SOURCE_CODE_HEADER,
            INDUSTRY_SOURCE_YEAR_HEADER,
            INDUSTRY_CODE_HEADER,
            INDUSTRY_NAME_HEADER,
        ];
        check_unique(
            path,
            headers
                .iter()
                .map(String::as_str)
                .filter(|h| wanted.contains(h)),
        )?;

        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        Ok(IndustryLayout {
            code: find(INDUSTRY_SOURCE_CODE_HEADER)?,
            year: find(INDUSTRY_SOURCE_YEAR_HEADER)?,
            industry_code: find(INDUSTRY_CODE_HEADER)?,
            industry_name: find(INDUSTRY_NAME_HEADER)?,
        })
    }
}

fn check_unique<'a>(path: &Path, headers: impl Iterator<Item = &'a str>) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for h in headers {
        if !seen.insert(h) {
            return Err(LoadError::DuplicateColumn {
                path: path.to_path_buf(),
                column: h.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_headers() -> Vec<String> {
        IndexField::all().map(|f| f.header().to_string()).collect()
    }

    #[test]
    fn header_whitespace_and_bom_are_stripped() {
        assert_eq!(normalize_header("\u{feff}股票代码"), "股票代码");
        assert_eq!(normalize_header("数字化\n转型 指数"), "数字化转型指数");
        assert_eq!(normalize_header(" 技术\u{3000}维度\r\n"), "技术维度");
    }

    #[test]
    fn index_layout_keeps_source_order_and_extras() {
        let mut headers = index_headers();
        headers.insert(2, "省份".to_string());
        let layout = IndexLayout::resolve(Path::new("a.csv"), &headers).unwrap();

        assert_eq!(layout.columns.len(), headers.len());
        assert_eq!(layout.columns[0], Column::Index(IndexField::Code));
        assert_eq!(layout.columns[2], Column::Extra("省份".into()));
        assert_eq!(layout.extras, vec![("省份".to_string(), 2)]);
        assert_eq!(layout.year, 3);
        let round: Vec<&str> = layout.columns.iter().map(Column::header).collect();
        assert_eq!(round, headers.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn missing_index_column_is_a_schema_error() {
        let headers: Vec<String> = index_headers()
            .into_iter()
            .filter(|h| h != YEAR_HEADER)
            .collect();
        match IndexLayout::resolve(Path::new("a.csv"), &headers) {
            Err(LoadError::MissingColumn { column, .. }) => assert_eq!(column, YEAR_HEADER),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_header_is_rejected() {
        let mut headers = index_headers();
        headers.push(CODE_HEADER.to_string());
        assert!(matches!(
            IndexLayout::resolve(Path::new("a.csv"), &headers),
            Err(LoadError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn industry_layout_ignores_unrelated_columns() {
        let headers: Vec<String> = ["备注", "年度", "股票代码全称", "行业名称", "备注", "行业代码"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let layout = IndustryLayout::resolve(Path::new("b.csv"), &headers).unwrap();
        assert_eq!(
            layout,
            IndustryLayout {
                code: 2,
                year: 1,
                industry_code: 5,
                industry_name: 3
            }
        );
    }
}
