use smallvec::SmallVec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use crate::models::CellValue;

pub const SAMPLE_SIZE: usize = 5;
pub const TOP_VALUES_LIMIT: usize = 10;
pub const OUTLIER_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Empty,
    Integer,
    Float,
    Date,
    Email,
    Boolean,
    Text,
    Mixed,
    Unknown,
}

impl DataType {
    pub fn is_numeric_like(self) -> bool {
        matches!(self, DataType::Integer | DataType::Float | DataType::Mixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Empty => "empty",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Date => "date",
            DataType::Email => "email",
            DataType::Boolean => "boolean",
            DataType::Text => "text",
            DataType::Mixed => "mixed",
            DataType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub index: usize,
    pub data_type: DataType,
    pub distinct_count: usize,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub sample_values: SmallVec<[CellValue; SAMPLE_SIZE]>,
    pub format_issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub outlier_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLengthStats {
    pub min_length: usize,
    pub max_length: usize,
    pub avg_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopValue {
    pub value: CellValue,
    pub count: usize,
    /// Share of non-missing values, rounded to two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnStatistics {
    #[serde(flatten)]
    pub numeric: Option<NumericStats>,
    #[serde(flatten)]
    pub text: Option<TextLengthStats>,
    pub top_values: Vec<TopValue>,
}

impl ColumnStatistics {
    pub fn is_empty(&self) -> bool {
        self.numeric.is_none() && self.text.is_none() && self.top_values.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetAnalysis {
    pub sheet_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub quality_score: u8,
    pub issues: Vec<String>,
    pub statistics: BTreeMap<String, ColumnStatistics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file_name: String,
    pub analyzed_at: String,
    pub file_size: u64,
    pub sheets: Vec<SheetAnalysis>,
    pub overall_score: f64,
    pub summary: Vec<String>,
}
