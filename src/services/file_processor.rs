use crate::error::AppError;
use crate::services::excel::{types::AnalysisReport, ExcelProcessor};
use crate::services::report::render_markdown;
use bytes::Bytes;
use reqwest::Client;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

pub fn is_supported_workbook(file_type: &str) -> bool {
    let lower = file_type.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

pub async fn load_file_from_url(url: &str, max_file_size: usize) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::HttpError(
            format!("Failed to fetch file. Status: {}", response.status())
        ));
    }

    if let Some(len) = response.content_length() {
        if len as usize > max_file_size {
            return Err(AppError::InvalidInput(format!(
                "File is {} bytes, limit is {}", len, max_file_size
            )));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to read response bytes: {}", e)))?;

    if bytes.len() > max_file_size {
        return Err(AppError::InvalidInput(format!(
            "File is {} bytes, limit is {}", bytes.len(), max_file_size
        )));
    }
    Ok(bytes)
}

pub async fn read_local_file(path: &Path) -> Result<Bytes, AppError> {
    if !path.is_file() {
        return Err(AppError::InvalidInput(format!("File not found: {}", path.display())));
    }
    let data = tokio::fs::read(path).await?;
    Ok(Bytes::from(data))
}

/// `<name>_analysis.md` in the working directory, with a trailing `.xlsx`
/// dropped from the name.
pub fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let stem = file_name.strip_suffix(".xlsx").unwrap_or(&file_name);
    PathBuf::from(format!("{}_analysis.md", stem))
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Analyzes a workbook on disk and writes its markdown report to `output`.
pub async fn analyze_file_to_report(input: &Path, output: &Path) -> Result<AnalysisReport, AppError> {
    tracing::info!("Analyzing: {}", input.display());
    let file_data = read_local_file(input).await?;

    let report = ExcelProcessor.analyze_bytes(&display_name(input), file_data)?;

    tracing::info!("Generating report...");
    let markdown = render_markdown(&report);
    tokio::fs::write(output, markdown).await?;
    tracing::info!("Report saved to {}", output.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/q3 sales.xlsx")),
            PathBuf::from("q3 sales_analysis.md")
        );
        assert_eq!(
            default_output_path(Path::new("book.ods")),
            PathBuf::from("book.ods_analysis.md")
        );
    }

    #[test]
    fn test_supported_types() {
        assert!(is_supported_workbook("XLSX"));
        assert!(is_supported_workbook("application/vnd.ms-excel.xlsm"));
        assert!(is_supported_workbook("ods"));
        assert!(!is_supported_workbook("csv"));
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_local_file(&dir.path().join("nope.xlsx")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_corrupt_workbook_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.xlsx");
        let output = dir.path().join("broken_analysis.md");
        std::fs::write(&input, b"plain text").unwrap();

        let result = analyze_file_to_report(&input, &output).await;
        assert!(matches!(result, Err(AppError::FileProcessingError(_))));
        assert!(!output.exists());
    }
}
