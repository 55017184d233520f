use axum::{
    extract::State,
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    services::{
        excel::{types::AnalysisReport, ExcelProcessor},
        file_processor,
        report::render_markdown,
    },
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/sheets/analyze", post(analyze_sheet))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "type")]
    file_type: String,
    signed_url: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    files: Vec<FileInfo>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    report: AnalysisReport,
    markdown: String,
}

fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.last()?;
    (!last.is_empty()).then(|| last.to_string())
}

#[axum::debug_handler]
async fn analyze_sheet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let start = std::time::Instant::now();

    let file_info = request.files.first()
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    tracing::info!(
        "Processing file type: {}, URL length: {}",
        file_info.file_type,
        file_info.signed_url.len()
    );

    if !file_processor::is_supported_workbook(&file_info.file_type) {
        tracing::error!("Unsupported file type: {}", file_info.file_type);
        return Err(AppError::InvalidInput(
            "Only XLSX, XLSM, XLS and ODS files are supported".to_string(),
        ));
    }

    tracing::info!("Downloading file from URL...");
    let download_start = std::time::Instant::now();
    let file_data = file_processor::load_file_from_url(
        &file_info.signed_url,
        state.config.max_file_size,
    )
    .await?;
    tracing::info!(
        "File downloaded, size: {}KB, took: {:?}",
        file_data.len() / 1024,
        download_start.elapsed()
    );

    let file_name = file_info
        .name
        .clone()
        .or_else(|| file_name_from_url(&file_info.signed_url))
        .unwrap_or_else(|| "workbook".to_string());

    let report = ExcelProcessor.analyze_bytes(&file_name, file_data)?;
    let markdown = render_markdown(&report);

    tracing::info!(
        "Analyzed {} sheet(s) of {} in {:?}, overall score {:.1}",
        report.sheets.len(),
        file_name,
        start.elapsed(),
        report.overall_score
    );

    Ok(Json(AnalyzeResponse { report, markdown }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routes::app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(Arc::new(AppState::new(Config::default())))
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/sheets/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_files_is_bad_request() {
        let response = test_app()
            .oneshot(analyze_request(r#"{"files": []}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_bad_request() {
        let body = r#"{"files": [{"type": "text/csv", "signed_url": "http://localhost/a.csv"}]}"#;
        let response = test_app().oneshot(analyze_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://bucket.example.com/uploads/q1.xlsx?sig=abc"),
            Some("q1.xlsx".to_string())
        );
        assert_eq!(file_name_from_url("https://example.com/"), None);
        assert_eq!(file_name_from_url("not a url"), None);
    }
}
