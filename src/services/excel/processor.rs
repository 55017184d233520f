use super::analyzer::analyze_sheet;
use super::types::{AnalysisReport, SheetAnalysis};
use crate::error::AppError;
use crate::models::CellValue;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{SecondsFormat, Utc};
use std::io::Cursor;

/// Row-major grids, one per sheet, in workbook order.
pub type SheetGrid = (String, Vec<Vec<CellValue>>);

pub struct ExcelProcessor;

impl ExcelProcessor {
    /// Reads every sheet of an `.xlsx/.xlsm/.xls/.ods` workbook held in memory.
    pub fn read_sheets(&self, file_data: Bytes) -> Result<Vec<SheetGrid>, AppError> {
        let cursor = Cursor::new(file_data);

        tracing::info!("Opening workbook...");
        let workbook_start = std::time::Instant::now();
        let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
            tracing::error!("Failed to open Excel file: {}", e);
            AppError::FileProcessingError(format!("Failed to open Excel file: {}", e))
        })?;
        tracing::info!("Workbook opened in {:?}", workbook_start.elapsed());

        let sheet_names = workbook.sheet_names().to_vec();
        tracing::info!("Found {} sheet(s): {:?}", sheet_names.len(), sheet_names);

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let rows = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range.rows().map(convert_row).collect(),
                Err(e) => {
                    tracing::warn!("Failed to read worksheet {}: {}", sheet_name, e);
                    Vec::new()
                }
            };
            sheets.push((sheet_name, rows));
        }

        Ok(sheets)
    }

    pub fn analyze_bytes(&self, file_name: &str, file_data: Bytes) -> Result<AnalysisReport, AppError> {
        let start = std::time::Instant::now();
        tracing::info!("Starting analysis of {}", file_name);

        let file_size = file_data.len() as u64;
        let sheets = self.read_sheets(file_data)?;
        let report = build_report(file_name, file_size, &sheets);

        tracing::info!("Analysis of {} completed in {:?}", file_name, start.elapsed());
        Ok(report)
    }
}

/// Profiles each sheet in order and folds the results into a report.
pub fn build_report(file_name: &str, file_size: u64, sheets: &[SheetGrid]) -> AnalysisReport {
    let analyses: Vec<SheetAnalysis> = sheets
        .iter()
        .map(|(name, rows)| {
            tracing::info!("Analyzing sheet: {}...", name);
            analyze_sheet(name, rows)
        })
        .collect();

    let overall_score = if analyses.is_empty() {
        0.0
    } else {
        analyses.iter().map(|s| s.quality_score as f64).sum::<f64>() / analyses.len() as f64
    };

    let summary = summarize(&analyses);

    AnalysisReport {
        file_name: file_name.to_string(),
        analyzed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        file_size,
        sheets: analyses,
        overall_score,
        summary,
    }
}

fn summarize(sheets: &[SheetAnalysis]) -> Vec<String> {
    let total_rows: usize = sheets.iter().map(|s| s.row_count).sum();
    let total_columns: usize = sheets.iter().map(|s| s.column_count).sum();
    let issue_count: usize = sheets.iter().map(|s| s.issues.len()).sum();

    let mut summary = vec![
        format!("{} sheet(s) analyzed", sheets.len()),
        format!("Total: {} rows, {} columns", total_rows, total_columns),
    ];
    if issue_count > 0 {
        summary.push(format!("{} issue(s) detected", issue_count));
    } else {
        summary.push("No major issues detected".to_string());
    }
    summary
}

fn convert_row(row: &[Data]) -> Vec<CellValue> {
    row.iter().map(CellValue::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> SheetGrid {
        (name.to_string(), rows)
    }

    #[test]
    fn test_report_overall_score_is_mean() {
        let good = sheet(
            "Good",
            vec![
                vec![CellValue::from("id")],
                vec![CellValue::Number(1.0)],
            ],
        );
        let empty = sheet("Empty", Vec::new());

        let report = build_report("book.xlsx", 2048, &[good, empty]);
        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.sheets[0].quality_score, 100);
        assert_eq!(report.sheets[1].quality_score, 0);
        assert_eq!(report.overall_score, 50.0);
        assert_eq!(report.file_size, 2048);
        assert_eq!(
            report.summary,
            vec!["2 sheet(s) analyzed", "Total: 1 rows, 1 columns", "1 issue(s) detected"]
        );
        assert!(report.analyzed_at.ends_with('Z'));
    }

    #[test]
    fn test_report_without_issues() {
        let rows = vec![vec![CellValue::from("a")], vec![CellValue::from("x")]];
        let report = build_report("clean.xlsx", 1, &[sheet("S", rows)]);
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.summary[2], "No major issues detected");
    }

    #[test]
    fn test_report_without_sheets() {
        let report = build_report("none.xlsx", 0, &[]);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.summary[0], "0 sheet(s) analyzed");
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let result = ExcelProcessor.analyze_bytes("junk.xlsx", Bytes::from_static(b"not a workbook"));
        assert!(matches!(result, Err(AppError::FileProcessingError(_))));
    }

    #[test]
    fn test_convert_row() {
        let row = vec![Data::Empty, Data::Int(3), Data::String("x".to_string())];
        assert_eq!(
            convert_row(&row),
            vec![CellValue::Missing, CellValue::Number(3.0), CellValue::from("x")]
        );
    }
}
