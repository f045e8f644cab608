use std::collections::BTreeMap;
use std::fmt;

use super::schema::{Column, IndexField};

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from any of the source formats.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Cell from a delimited-text field. The text is kept as written;
    /// coercion to numbers happens per column when records are built.
    pub fn from_field(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            CellValue::Null
        } else {
            CellValue::String(s.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Lossless text form used for CSV fields. Nulls become empty fields.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Float(v) if v.is_nan() => String::new(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::String(s) => s.clone(),
        }
    }

    /// Numeric view of the cell; `Err` carries a short reason.
    pub fn to_f64(&self) -> Result<Option<f64>, &'static str> {
        match self {
            _ if self.is_null() => Ok(None),
            CellValue::Float(v) => Ok(Some(*v)),
            CellValue::Integer(i) => Ok(Some(*i as f64)),
            CellValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| "not a number"),
            _ => Err("not a number"),
        }
    }

    /// Integer view of the cell. Integral floats (as spreadsheets store them)
    /// are accepted.
    pub fn to_i64(&self) -> Result<Option<i64>, &'static str> {
        match self {
            CellValue::Integer(i) => return Ok(Some(*i)),
            CellValue::String(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Ok(Some(i));
                }
            }
            _ => {}
        }
        match self.to_f64()? {
            None => Ok(None),
            Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
            Some(_) => Err("not an integer"),
        }
    }

    /// Plain text of the cell, `None` when null.
    pub fn to_text(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_field())
        }
    }
}

// ---------------------------------------------------------------------------
// StockCode – normalized 6-digit company code
// ---------------------------------------------------------------------------

pub const STOCK_CODE_WIDTH: usize = 6;

/// Company stock code, always 6 ASCII digits (left zero-padded).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StockCode(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStockCode(pub String);

impl fmt::Display for InvalidStockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a stock code of at most {STOCK_CODE_WIDTH} digits", self.0)
    }
}

impl std::error::Error for InvalidStockCode {}

impl StockCode {
    /// Normalize textual input: surrounding whitespace is dropped and the
    /// digits are left-padded with zeros to six characters.
    pub fn parse(raw: &str) -> Result<Self, InvalidStockCode> {
        let digits = raw.trim();
        if digits.is_empty()
            || digits.len() > STOCK_CODE_WIDTH
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(InvalidStockCode(raw.to_string()));
        }
        Ok(StockCode(format!("{digits:0>width$}", width = STOCK_CODE_WIDTH)))
    }

    /// Normalize a cell. Numeric cells (spreadsheets often store codes as
    /// numbers, dropping the leading zeros) are formatted first.
    pub fn from_cell(cell: &CellValue) -> Result<Self, InvalidStockCode> {
        match cell {
            CellValue::Integer(i) if *i >= 0 => Self::parse(&i.to_string()),
            CellValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => {
                Self::parse(&format!("{v:.0}"))
            }
            CellValue::String(s) => Self::parse(s),
            other => Err(InvalidStockCode(other.to_field())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Metric – the numeric columns of the index table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    TransformationIndex,
    TechnologyDimension,
    ApplicationDimension,
    TotalWords,
    AiWords,
    BigDataWords,
    CloudWords,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::TransformationIndex,
        Metric::TechnologyDimension,
        Metric::ApplicationDimension,
        Metric::TotalWords,
        Metric::AiWords,
        Metric::BigDataWords,
        Metric::CloudWords,
    ];

    /// Column header in the source table.
    pub fn header(self) -> &'static str {
        match self {
            Metric::TransformationIndex => "数字化转型指数",
            Metric::TechnologyDimension => "技术维度",
            Metric::ApplicationDimension => "应用维度",
            Metric::TotalWords => "词总",
            Metric::AiWords => "人工智能词频数",
            Metric::BigDataWords => "大数据词频数",
            Metric::CloudWords => "云计算词频数",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::TransformationIndex => "Digital transformation index",
            Metric::TechnologyDimension => "Technology dimension",
            Metric::ApplicationDimension => "Application dimension",
            Metric::TotalWords => "Total word count",
            Metric::AiWords => "AI word frequency",
            Metric::BigDataWords => "Big data word frequency",
            Metric::CloudWords => "Cloud computing word frequency",
        }
    }

    /// Word counts are stored as integers, the index and its dimensions as floats.
    pub fn is_count(self) -> bool {
        matches!(
            self,
            Metric::TotalWords | Metric::AiWords | Metric::BigDataWords | Metric::CloudWords
        )
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Shown wherever an industry field has no match.
pub const UNKNOWN_INDUSTRY: &str = "未知";

/// One row of the transformation-index table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub code: StockCode,
    pub name: String,
    pub year: i32,
    pub index: Option<f64>,
    pub technology: Option<f64>,
    pub application: Option<f64>,
    pub total_words: Option<i64>,
    pub ai_words: Option<i64>,
    pub big_data_words: Option<i64>,
    pub cloud_words: Option<i64>,
    /// Source columns outside the fixed schema, keyed by normalized header.
    pub extras: BTreeMap<String, CellValue>,
}

impl IndexRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TransformationIndex => self.index,
            Metric::TechnologyDimension => self.technology,
            Metric::ApplicationDimension => self.application,
            Metric::TotalWords => self.total_words.map(|v| v as f64),
            Metric::AiWords => self.ai_words.map(|v| v as f64),
            Metric::BigDataWords => self.big_data_words.map(|v| v as f64),
            Metric::CloudWords => self.cloud_words.map(|v| v as f64),
        }
    }

    fn metric_cell(&self, metric: Metric) -> CellValue {
        let int = |v: Option<i64>| v.map_or(CellValue::Null, CellValue::Integer);
        let float = |v: Option<f64>| v.map_or(CellValue::Null, CellValue::Float);
        match metric {
            Metric::TransformationIndex => float(self.index),
            Metric::TechnologyDimension => float(self.technology),
            Metric::ApplicationDimension => float(self.application),
            Metric::TotalWords => int(self.total_words),
            Metric::AiWords => int(self.ai_words),
            Metric::BigDataWords => int(self.big_data_words),
            Metric::CloudWords => int(self.cloud_words),
        }
    }
}

/// One row of the industry-classification table, already projected.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryRecord {
    pub code: StockCode,
    pub year: i32,
    pub industry_code: Option<String>,
    pub industry_name: Option<String>,
}

/// An index record with its (optional) industry classification.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub index: IndexRecord,
    pub industry_code: Option<String>,
    pub industry_name: Option<String>,
}

impl UnifiedRecord {
    pub fn code(&self) -> &StockCode {
        &self.index.code
    }

    pub fn year(&self) -> i32 {
        self.index.year
    }

    pub fn name(&self) -> &str {
        &self.index.name
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.index.metric(metric)
    }

    pub fn industry_code_or_unknown(&self) -> &str {
        self.industry_code.as_deref().unwrap_or(UNKNOWN_INDUSTRY)
    }

    pub fn industry_name_or_unknown(&self) -> &str {
        self.industry_name.as_deref().unwrap_or(UNKNOWN_INDUSTRY)
    }

    /// Cell of this record under a unified-table column. Industry fields
    /// stay null here; only display code substitutes [`UNKNOWN_INDUSTRY`].
    pub fn value(&self, column: &Column) -> CellValue {
        let text = |v: &Option<String>| v.clone().map_or(CellValue::Null, CellValue::String);
        match column {
            Column::Index(IndexField::Code) => CellValue::String(self.index.code.to_string()),
            Column::Index(IndexField::Name) => CellValue::String(self.index.name.clone()),
            Column::Index(IndexField::Year) => CellValue::Integer(self.index.year as i64),
            Column::Index(IndexField::Metric(m)) => self.index.metric_cell(*m),
            Column::Extra(header) => self
                .index
                .extras
                .get(header)
                .cloned()
                .unwrap_or(CellValue::Null),
            Column::IndustryCode => text(&self.industry_code),
            Column::IndustryName => text(&self.industry_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_are_zero_padded() {
        assert_eq!(StockCode::parse("1").unwrap().as_str(), "000001");
        assert_eq!(StockCode::parse(" 600519 ").unwrap().as_str(), "600519");
        assert_eq!(StockCode::parse("2594").unwrap().as_str(), "002594");
    }

    #[test]
    fn normalization_is_idempotent_and_fixed_width() {
        for raw in ["0", "7", "42", "300", "2594", "30075", "600519", "000001"] {
            let once = StockCode::parse(raw).unwrap();
            let twice = StockCode::parse(once.as_str()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.as_str().len(), STOCK_CODE_WIDTH);
        }
    }

    #[test]
    fn invalid_codes_are_rejected() {
        assert!(StockCode::parse("").is_err());
        assert!(StockCode::parse("1234567").is_err());
        assert!(StockCode::parse("60A519").is_err());
        assert!(StockCode::from_cell(&CellValue::Float(1.5)).is_err());
        assert!(StockCode::from_cell(&CellValue::Null).is_err());
    }

    #[test]
    fn numeric_cells_normalize_like_text() {
        let from_int = StockCode::from_cell(&CellValue::Integer(1)).unwrap();
        let from_float = StockCode::from_cell(&CellValue::Float(1.0)).unwrap();
        let from_text = StockCode::from_cell(&CellValue::String("000001".into())).unwrap();
        assert_eq!(from_int, from_text);
        assert_eq!(from_float, from_text);
    }

    #[test]
    fn integer_coercion_accepts_integral_floats_only() {
        assert_eq!(CellValue::Float(12.0).to_i64(), Ok(Some(12)));
        assert_eq!(CellValue::Integer(7).to_i64(), Ok(Some(7)));
        assert_eq!(CellValue::Null.to_i64(), Ok(None));
        assert_eq!(CellValue::String(" ".into()).to_i64(), Ok(None));
        assert!(CellValue::Float(1.25).to_i64().is_err());
        assert!(CellValue::String("n/a".into()).to_f64().is_err());
    }

    #[test]
    fn text_fields_are_kept_verbatim() {
        assert_eq!(CellValue::from_field("06"), CellValue::String("06".into()));
        assert_eq!(CellValue::from_field(" 1.50 ").to_text().as_deref(), Some("1.50"));
        assert_eq!(CellValue::from_field("  "), CellValue::Null);
        assert_eq!(CellValue::from_field("06").to_i64(), Ok(Some(6)));
    }

    #[test]
    fn float_fields_round_trip_through_text() {
        let v = 0.123_456_789_012_345_6_f64;
        let field = CellValue::Float(v).to_field();
        assert_eq!(CellValue::from_field(&field).to_f64(), Ok(Some(v)));
        assert_eq!(CellValue::Float(f64::NAN).to_field(), "");
    }
}
