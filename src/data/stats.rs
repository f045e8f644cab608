use crate::error::AggregationError;

use super::model::{Metric, UnifiedRecord};

// ---------------------------------------------------------------------------
// Descriptive statistics over one metric
// ---------------------------------------------------------------------------

/// Mean / min / max over the non-null values of a metric. No rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Number of non-null values that went into the summary.
    pub count: usize,
}

/// Summarize `metric` over `records`.
///
/// Callers are expected to check emptiness first; an empty subset is
/// reported as [`AggregationError::EmptyInput`] and a subset where every value
/// is null as [`AggregationError::NoValues`], never as zero.
pub fn summarize<'a, I>(records: I, metric: Metric) -> Result<Summary, AggregationError>
where
    I: IntoIterator<Item = &'a UnifiedRecord>,
{
    let mut rows = 0usize;
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for record in records {
        rows += 1;
        let Some(v) = record.metric(metric).filter(|v| !v.is_nan()) else {
            continue;
        };
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }

    if rows == 0 {
        return Err(AggregationError::EmptyInput {
            metric: metric.header(),
        });
    }
    if count == 0 {
        return Err(AggregationError::NoValues {
            metric: metric.header(),
            rows,
        });
    }

    Ok(Summary {
        mean: sum / count as f64,
        min,
        max,
        count,
    })
}

/// One summary per metric, in [`Metric::ALL`] order.
pub fn summarize_all(records: &[UnifiedRecord]) -> Vec<(Metric, Result<Summary, AggregationError>)> {
    Metric::ALL
        .iter()
        .map(|&m| (m, summarize(records, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::{IndexRecord, StockCode};

    fn record(year: i32, index: Option<f64>, ai: Option<i64>) -> UnifiedRecord {
        UnifiedRecord {
            index: IndexRecord {
                code: StockCode::parse("1").unwrap(),
                name: "平安银行".into(),
                year,
                index,
                technology: None,
                application: None,
                total_words: None,
                ai_words: ai,
                big_data_words: None,
                cloud_words: None,
                extras: BTreeMap::new(),
            },
            industry_code: None,
            industry_name: None,
        }
    }

    #[test]
    fn mean_min_max_over_values() {
        let rows = vec![record(2000, Some(0.1), Some(4)), record(2001, Some(0.3), Some(8))];
        let s = summarize(&rows, Metric::TransformationIndex).unwrap();
        assert!((s.mean - 0.2).abs() < 1e-12);
        assert_eq!(s.min, 0.1);
        assert_eq!(s.max, 0.3);
        assert_eq!(s.count, 2);

        let ai = summarize(&rows, Metric::AiWords).unwrap();
        assert_eq!(ai.mean, 6.0);
    }

    #[test]
    fn nulls_are_skipped() {
        let rows = vec![
            record(2000, Some(0.5), None),
            record(2001, None, None),
            record(2002, Some(1.5), Some(3)),
        ];
        let s = summarize(&rows, Metric::TransformationIndex).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, 1.0);
        assert_eq!(summarize(&rows, Metric::AiWords).unwrap().count, 1);
    }

    #[test]
    fn empty_subset_is_an_error_for_every_metric() {
        let rows: Vec<UnifiedRecord> = Vec::new();
        for (metric, result) in summarize_all(&rows) {
            assert_eq!(
                result,
                Err(AggregationError::EmptyInput {
                    metric: metric.header()
                })
            );
        }
    }

    #[test]
    fn all_null_subset_is_not_zero() {
        let rows = vec![record(2000, None, None)];
        assert_eq!(
            summarize(&rows, Metric::CloudWords),
            Err(AggregationError::NoValues {
                metric: "云计算词频数",
                rows: 1
            })
        );
    }
}
