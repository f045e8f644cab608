use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::LoadError;

use super::model::{IndexRecord, IndustryRecord, StockCode, UnifiedRecord};
use super::schema::{Column, IndexLayout, INDUSTRY_CODE_HEADER, INDUSTRY_NAME_HEADER};

// ---------------------------------------------------------------------------
// Left join on (code, year)
// ---------------------------------------------------------------------------

/// Attach industry classification to every index record.
///
/// * Every index record survives, in order; unmatched ones keep `None`
///   industry fields.
/// * Identical duplicate industry rows are collapsed with a warning;
///   conflicting ones fail with [`LoadError::DuplicateKey`].
/// * Duplicate index keys are kept as-is and logged.
pub fn left_join(
    index_path: &Path,
    industry_path: &Path,
    layout: &IndexLayout,
    index: Vec<IndexRecord>,
    industry: Vec<IndustryRecord>,
) -> Result<Vec<UnifiedRecord>, LoadError> {
    for column in &layout.columns {
        if let Column::Extra(header) = column {
            if header == INDUSTRY_CODE_HEADER || header == INDUSTRY_NAME_HEADER {
                return Err(LoadError::DuplicateColumn {
                    path: index_path.to_path_buf(),
                    column: header.clone(),
                });
            }
        }
    }

    let lookup = industry_lookup(industry_path, industry)?;

    let duplicates = {
        let mut seen: HashSet<(&StockCode, i32)> = HashSet::with_capacity(index.len());
        index
            .iter()
            .filter(|r| !seen.insert((&r.code, r.year)))
            .count()
    };
    if duplicates > 0 {
        log::warn!(
            "{} has {duplicates} duplicate (code, year) rows; keeping all of them",
            index_path.display()
        );
    }

    let mut matched = 0usize;
    let unified: Vec<UnifiedRecord> = index
        .into_iter()
        .map(|record| {
            let hit = lookup.get(&(record.code.clone(), record.year));
            if hit.is_some() {
                matched += 1;
            }
            UnifiedRecord {
                industry_code: hit.and_then(|i| i.industry_code.clone()),
                industry_name: hit.and_then(|i| i.industry_name.clone()),
                index: record,
            }
        })
        .collect();

    log::info!(
        "Joined industry classification: {matched} matched, {} without industry",
        unified.len() - matched
    );
    Ok(unified)
}

fn industry_lookup(
    path: &Path,
    industry: Vec<IndustryRecord>,
) -> Result<HashMap<(StockCode, i32), IndustryRecord>, LoadError> {
    let mut lookup: HashMap<(StockCode, i32), IndustryRecord> = HashMap::with_capacity(industry.len());
    let mut identical = 0usize;

    for record in industry {
        match lookup.entry((record.code.clone(), record.year)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(existing) if *existing.get() == record => identical += 1,
            Entry::Occupied(_) => {
                return Err(LoadError::DuplicateKey {
                    path: path.to_path_buf(),
                    code: record.code,
                    year: record.year,
                });
            }
        }
    }

    if identical > 0 {
        log::warn!(
            "{} repeats {identical} identical industry rows; using one of each",
            path.display()
        );
    }
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::schema::IndexField;

    fn layout() -> IndexLayout {
        let headers: Vec<String> = IndexField::all().map(|f| f.header().to_string()).collect();
        IndexLayout::resolve(Path::new("index.csv"), &headers).unwrap()
    }

    fn index(code: &str, year: i32, value: f64) -> IndexRecord {
        IndexRecord {
            code: StockCode::parse(code).unwrap(),
            name: format!("company {code}"),
            year,
            index: Some(value),
            technology: None,
            application: None,
            total_words: None,
            ai_words: None,
            big_data_words: None,
            cloud_words: None,
            extras: BTreeMap::new(),
        }
    }

    fn industry(code: &str, year: i32, name: &str) -> IndustryRecord {
        IndustryRecord {
            code: StockCode::parse(code).unwrap(),
            year,
            industry_code: Some("C39".into()),
            industry_name: Some(name.into()),
        }
    }

    fn join(
        index: Vec<IndexRecord>,
        industry: Vec<IndustryRecord>,
    ) -> Result<Vec<UnifiedRecord>, LoadError> {
        left_join(
            Path::new("index.csv"),
            Path::new("industry.csv"),
            &layout(),
            index,
            industry,
        )
    }

    #[test]
    fn join_preserves_cardinality_and_order() {
        let rows = vec![index("1", 2000, 0.1), index("1", 2001, 0.3), index("2", 2000, 0.5)];
        let unified = join(
            rows.clone(),
            vec![industry("000001", 2001, "银行"), industry("9", 2000, "其他")],
        )
        .unwrap();

        assert_eq!(unified.len(), rows.len());
        for (u, r) in unified.iter().zip(&rows) {
            assert_eq!(&u.index, r);
        }
        assert_eq!(unified[0].industry_name, None);
        assert_eq!(unified[0].industry_name_or_unknown(), "未知");
        assert_eq!(unified[1].industry_name.as_deref(), Some("银行"));
    }

    #[test]
    fn duplicate_index_keys_are_kept() {
        let unified = join(vec![index("1", 2000, 0.1), index("1", 2000, 0.2)], vec![]).unwrap();
        assert_eq!(unified.len(), 2);
    }

    #[test]
    fn identical_industry_duplicates_are_tolerated() {
        let unified = join(
            vec![index("1", 2000, 0.1)],
            vec![industry("1", 2000, "银行"), industry("1", 2000, "银行")],
        )
        .unwrap();
        assert_eq!(unified.len(), 1);
        assert_eq!(unified[0].industry_name.as_deref(), Some("银行"));
    }

    #[test]
    fn conflicting_industry_duplicates_fail() {
        let err = join(
            vec![index("1", 2000, 0.1)],
            vec![industry("1", 2000, "银行"), industry("1", 2000, "保险")],
        )
        .unwrap_err();
        match err {
            LoadError::DuplicateKey { code, year, .. } => {
                assert_eq!(code.as_str(), "000001");
                assert_eq!(year, 2000);
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn primary_industry_columns_conflict_with_join() {
        let mut headers: Vec<String> = IndexField::all().map(|f| f.header().to_string()).collect();
        headers.push("行业名称".into());
        let layout = IndexLayout::resolve(Path::new("index.csv"), &headers).unwrap();
        let err = left_join(
            Path::new("index.csv"),
            Path::new("industry.csv"),
            &layout,
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateColumn { .. }));
    }
}
