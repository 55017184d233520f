use super::types::*;
use super::utils::*;
use crate::models::{CellKind, CellValue, ValueKey};
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

const HIGH_NULL_PERCENTAGE: f64 = 50.0;
const NUMERIC_TEXT_RATIO: f64 = 0.8;
const OUTLIER_SIGMAS: f64 = 3.0;

const MISSING_HEADER_PENALTY: u8 = 10;
const HIGH_NULL_PENALTY: u8 = 15;
const FORMAT_ISSUE_PENALTY: u8 = 10;
const DUPLICATE_NAME_PENALTY: u8 = 15;

pub fn detect_data_type(values: &[CellValue]) -> DataType {
    let present = present_values(values);
    if present.is_empty() {
        return DataType::Empty;
    }

    let kinds: HashSet<CellKind> = present.iter().filter_map(|v| v.kind()).collect();
    if kinds.len() > 1 {
        return DataType::Mixed;
    }

    match kinds.into_iter().next() {
        Some(CellKind::Number) => {
            let all_integers = present
                .iter()
                .filter_map(|v| v.as_number())
                .all(|n| n.is_finite() && n.fract() == 0.0);
            if all_integers {
                DataType::Integer
            } else {
                DataType::Float
            }
        }
        Some(CellKind::Text) => {
            let texts: Vec<&str> = present.iter().filter_map(|v| v.as_text()).collect();
            if texts.iter().all(|s| is_date_string(s)) {
                DataType::Date
            } else if texts.iter().all(|s| is_email(s)) {
                DataType::Email
            } else if texts.iter().all(|s| is_boolean_token(s)) {
                DataType::Boolean
            } else {
                DataType::Text
            }
        }
        Some(CellKind::Boolean) => DataType::Boolean,
        None => DataType::Unknown,
    }
}

pub fn detect_format_issues(values: &[CellValue], data_type: DataType) -> Vec<String> {
    let mut issues = Vec::new();

    if data_type == DataType::Mixed {
        issues.push("Mixed data types detected - inconsistent formatting".to_string());
    }

    if data_type != DataType::Text {
        return issues;
    }

    let texts: Vec<&str> = values.iter().filter_map(|v| v.as_text()).collect();
    let total = texts.len();

    if texts.iter().any(|s| s.trim() != *s) {
        issues.push("Leading or trailing whitespace detected".to_string());
    }

    let lower_count = texts.iter().filter(|s| s.to_lowercase() == **s).count();
    let upper_count = texts.iter().filter(|s| s.to_uppercase() == **s).count();
    if lower_count > 0 && upper_count > 0 && lower_count < total && upper_count < total {
        issues.push("Inconsistent casing (mixed upper/lower)".to_string());
    }

    let numeric_count = texts.iter().filter(|s| parses_as_number(s)).count();
    if numeric_count as f64 > total as f64 * NUMERIC_TEXT_RATIO {
        issues.push("Numeric values stored as text".to_string());
    }

    issues
}

pub fn calculate_statistics(values: &[CellValue], data_type: DataType) -> ColumnStatistics {
    let present = present_values(values);
    let mut stats = ColumnStatistics::default();

    if data_type.is_numeric_like() {
        let mut numbers: Vec<f64> = present.iter().filter_map(|v| v.as_number()).collect();
        numbers.sort_by(|a, b| a.total_cmp(b));
        stats.numeric = numeric_stats(&numbers);
    }

    if data_type == DataType::Text && !present.is_empty() {
        let lengths: Vec<usize> = present.iter().map(|v| v.to_string().chars().count()).collect();
        stats.text = Some(TextLengthStats {
            min_length: lengths.iter().copied().min().unwrap_or(0),
            max_length: lengths.iter().copied().max().unwrap_or(0),
            avg_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        });
    }

    stats.top_values = top_values(&present);
    stats
}

/// `sorted` must be in ascending order. Returns `None` for an empty slice.
fn numeric_stats(sorted: &[f64]) -> Option<NumericStats> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let n = sorted.len() as f64;

    let mean = sorted.iter().sum::<f64>() / n;
    // Lower median for even counts
    let median = sorted[sorted.len() / 2];
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let outliers: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| (v - mean).abs() > OUTLIER_SIGMAS * std_dev)
        .collect();

    Some(NumericStats {
        min,
        max,
        mean,
        median,
        std_dev,
        outlier_count: outliers.len(),
        outliers: outliers.into_iter().take(OUTLIER_SAMPLE_SIZE).collect(),
    })
}

fn top_values(present: &[&CellValue]) -> Vec<TopValue> {
    let mut order: HashMap<ValueKey<'_>, usize> = HashMap::new();
    let mut counts: Vec<(&CellValue, usize)> = Vec::new();

    for &value in present {
        let Some(key) = value.key() else { continue };
        match order.entry(key) {
            Entry::Occupied(slot) => counts[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(counts.len());
                counts.push((value, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = present.len() as f64;
    counts
        .into_iter()
        .take(TOP_VALUES_LIMIT)
        .map(|(value, count)| TopValue {
            value: value.clone(),
            count,
            percentage: round2(count as f64 / total * 100.0),
        })
        .collect()
}

fn column_values(rows: &[Vec<CellValue>], index: usize) -> Vec<CellValue> {
    rows.iter()
        .map(|row| row.get(index).cloned().unwrap_or(CellValue::Missing))
        .collect()
}

fn header_name(header: &CellValue, index: usize) -> String {
    match header {
        CellValue::Missing => default_column_name(index),
        other => other.to_string(),
    }
}

pub fn analyze_column(rows: &[Vec<CellValue>], index: usize, header: &CellValue) -> ColumnProfile {
    let values = column_values(rows, index);
    let present = present_values(&values);

    let data_type = detect_data_type(&values);
    let format_issues = detect_format_issues(&values, data_type);

    let mut seen = HashSet::new();
    let mut sample_values = SmallVec::<[CellValue; SAMPLE_SIZE]>::new();
    for value in &present {
        if let Some(key) = value.key() {
            if seen.insert(key) && sample_values.len() < SAMPLE_SIZE {
                sample_values.push((*value).clone());
            }
        }
    }

    let missing_count = values.len() - present.len();
    let missing_percentage = if values.is_empty() {
        0.0
    } else {
        missing_count as f64 / values.len() as f64 * 100.0
    };

    ColumnProfile {
        name: header_name(header, index),
        index,
        data_type,
        distinct_count: seen.len(),
        missing_count,
        missing_percentage,
        sample_values,
        format_issues,
    }
}

pub fn analyze_sheet(sheet_name: &str, grid: &[Vec<CellValue>]) -> SheetAnalysis {
    let Some((headers, data_rows)) = grid.split_first() else {
        tracing::warn!("Sheet {} is empty", sheet_name);
        return SheetAnalysis {
            sheet_name: sheet_name.to_string(),
            row_count: 0,
            column_count: 0,
            columns: Vec::new(),
            quality_score: 0,
            issues: vec!["Sheet is empty".to_string()],
            statistics: BTreeMap::new(),
        };
    };

    let columns: Vec<ColumnProfile> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| analyze_column(data_rows, idx, header))
        .collect();

    let (quality_score, issues) = score_columns(&columns);

    let mut statistics = BTreeMap::new();
    for column in &columns {
        let values = column_values(data_rows, column.index);
        // Later duplicates win; duplicate names are already reported
        statistics.insert(column.name.clone(), calculate_statistics(&values, column.data_type));
    }

    tracing::debug!(
        "Sheet {}: {} rows, {} columns, score {}",
        sheet_name,
        data_rows.len(),
        headers.len(),
        quality_score
    );

    SheetAnalysis {
        sheet_name: sheet_name.to_string(),
        row_count: data_rows.len(),
        column_count: headers.len(),
        columns,
        quality_score,
        issues,
        statistics,
    }
}

/// Applies each penalty rule at most once and floors the result at zero.
pub fn score_columns(columns: &[ColumnProfile]) -> (u8, Vec<String>) {
    let mut issues = Vec::new();
    let mut score: u8 = 100;

    let missing_headers = columns.iter().filter(|c| c.name.trim().is_empty()).count();
    if missing_headers > 0 {
        issues.push(format!("{} columns have missing headers", missing_headers));
        score = score.saturating_sub(MISSING_HEADER_PENALTY);
    }

    let high_null = columns
        .iter()
        .filter(|c| c.missing_percentage > HIGH_NULL_PERCENTAGE)
        .count();
    if high_null > 0 {
        issues.push(format!("{} columns have >50% missing values", high_null));
        score = score.saturating_sub(HIGH_NULL_PENALTY);
    }

    let with_format_issues = columns.iter().filter(|c| !c.format_issues.is_empty()).count();
    if with_format_issues > 0 {
        issues.push(format!("{} columns have format inconsistencies", with_format_issues));
        score = score.saturating_sub(FORMAT_ISSUE_PENALTY);
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for column in columns {
        if !seen.insert(column.name.as_str()) && !duplicates.contains(&column.name.as_str()) {
            duplicates.push(&column.name);
        }
    }
    if !duplicates.is_empty() {
        issues.push(format!("Duplicate column names found: {}", duplicates.join(", ")));
        score = score.saturating_sub(DUPLICATE_NAME_PENALTY);
    }

    (score, issues)
}
