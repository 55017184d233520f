//! Markdown rendering of an [`AnalysisReport`].

use crate::services::excel::types::{AnalysisReport, ColumnProfile, ColumnStatistics, SheetAnalysis};
use std::fmt::Write;

const SAMPLE_DISPLAY: usize = 3;
const OUTLIER_DISPLAY: usize = 3;
const TOP_VALUES_DISPLAY: usize = 5;

pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut md = String::new();

    // Writing into a String cannot fail
    let _ = write_header(&mut md, report);
    for sheet in &report.sheets {
        let _ = write_sheet(&mut md, sheet);
    }

    md
}

fn write_header(md: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    writeln!(md, "# Excel Data Analysis Report\n")?;
    writeln!(md, "**File:** {}", report.file_name)?;
    writeln!(md, "**Analyzed:** {}", report.analyzed_at)?;
    writeln!(md, "**File Size:** {:.2} MB", report.file_size as f64 / 1024.0 / 1024.0)?;
    writeln!(md, "**Overall Quality Score:** {:.1}/100\n", report.overall_score)?;

    writeln!(md, "## Executive Summary\n")?;
    for item in &report.summary {
        writeln!(md, "- {}", item)?;
    }
    writeln!(md)
}

fn write_sheet(md: &mut String, sheet: &SheetAnalysis) -> std::fmt::Result {
    writeln!(md, "## Sheet: {}\n", sheet.sheet_name)?;
    writeln!(md, "**Dimensions:** {} rows × {} columns", sheet.row_count, sheet.column_count)?;
    writeln!(md, "**Quality Score:** {}/100\n", sheet.quality_score)?;

    if !sheet.issues.is_empty() {
        writeln!(md, "### Issues Detected\n")?;
        for issue in &sheet.issues {
            writeln!(md, "- ⚠️ {}", issue)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "### Column Analysis\n")?;
    writeln!(md, "| Column | Type | Distinct | Missing | Issues |")?;
    writeln!(md, "|--------|------|----------|---------|--------|")?;
    for col in &sheet.columns {
        let issue_count = col.format_issues.len();
        let icon = if issue_count > 0 { "⚠️" } else { "✓" };
        writeln!(
            md,
            "| {} | {} | {} | {:.1}% | {} {} |",
            col.name, col.data_type, col.distinct_count, col.missing_percentage, icon, issue_count
        )?;
    }
    writeln!(md)?;

    writeln!(md, "### Detailed Column Information\n")?;
    for col in &sheet.columns {
        write_column(md, col, sheet.statistics.get(&col.name))?;
    }
    Ok(())
}

fn write_column(md: &mut String, col: &ColumnProfile, stats: Option<&ColumnStatistics>) -> std::fmt::Result {
    writeln!(md, "#### {}\n", col.name)?;
    writeln!(md, "- **Type:** {}", col.data_type)?;
    writeln!(md, "- **Distinct Values:** {}", col.distinct_count)?;
    writeln!(md, "- **Missing Values:** {} ({:.2}%)", col.missing_count, col.missing_percentage)?;

    if !col.sample_values.is_empty() {
        let samples: Vec<String> = col
            .sample_values
            .iter()
            .take(SAMPLE_DISPLAY)
            .map(|v| format!("`{}`", v))
            .collect();
        writeln!(md, "- **Sample Values:** {}", samples.join(", "))?;
    }

    if !col.format_issues.is_empty() {
        writeln!(md, "- **Format Issues:**")?;
        for issue in &col.format_issues {
            writeln!(md, "  - {}", issue)?;
        }
    }

    if let Some(stats) = stats.filter(|s| !s.is_empty()) {
        write_statistics(md, stats)?;
    }

    writeln!(md)
}

fn write_statistics(md: &mut String, stats: &ColumnStatistics) -> std::fmt::Result {
    writeln!(md, "- **Statistics:**")?;

    if let Some(numeric) = &stats.numeric {
        writeln!(md, "  - Min: {}", numeric.min)?;
        writeln!(md, "  - Max: {}", numeric.max)?;
        writeln!(md, "  - Mean: {:.2}", numeric.mean)?;
        writeln!(md, "  - Median: {}", numeric.median)?;
        writeln!(md, "  - Std Dev: {:.2}", numeric.std_dev)?;
        if numeric.outlier_count > 0 {
            writeln!(md, "  - ⚠️ Outliers detected: {}", numeric.outlier_count)?;
            let sample: Vec<String> = numeric
                .outliers
                .iter()
                .take(OUTLIER_DISPLAY)
                .map(|v| v.to_string())
                .collect();
            writeln!(md, "  - Sample outliers: {}", sample.join(", "))?;
        }
    }

    if let Some(text) = &stats.text {
        writeln!(
            md,
            "  - Length range: {}-{} (avg: {:.1})",
            text.min_length, text.max_length, text.avg_length
        )?;
    }

    if !stats.top_values.is_empty() {
        writeln!(md, "  - Top values:")?;
        for top in stats.top_values.iter().take(TOP_VALUES_DISPLAY) {
            writeln!(md, "    - `{}`: {} ({:.2}%)", top.value, top.count, top.percentage)?;
        }
    }
    Ok(())
}
