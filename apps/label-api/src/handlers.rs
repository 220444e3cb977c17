//! HTTP handlers for the label API

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use label_layout::{LayoutEngine, StrategyKind, OUTPUT_FILENAME, PDF_MIME};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Multipart field carrying the label
pub const FILE_FIELD: &str = "file";

pub const STRATEGY_HEADER: HeaderName = HeaderName::from_static("x-label-strategy");
pub const COPIES_HEADER: HeaderName = HeaderName::from_static("x-label-copies");

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Jar Label Layout</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 32rem; margin: 3rem auto; padding: 0 1rem; }
    form { display: flex; flex-direction: column; gap: 1rem; }
  </style>
</head>
<body>
  <h1>Jar Label Layout</h1>
  <p>Upload a one-page 1in &times; 1.125in label PDF. You get back
  <code>processed_label.pdf</code>: three copies turned 90&deg; side by side on a
  3.625in &times; 1in page, ready for jar label stock.</p>
  <form action="/api/process" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept="application/pdf" required>
    <button type="submit">Lay out labels</button>
  </form>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub strategy: Option<String>,
}

/// Upload page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Lay out an uploaded label and return the sheet as a download.
///
/// Errors come back as JSON, or as an HTML page when the client accepts
/// `text/html` (the upload form in a browser).
pub async fn process_label(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
    request_headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let wants_html = accepts_html(&request_headers);
    match lay_out_upload(state, query, multipart).await {
        Ok(response) => response.into_response(),
        Err(e) if wants_html => e.into_html_response(),
        Err(e) => e.into_response(),
    }
}

async fn lay_out_upload(
    state: Arc<AppState>,
    query: ProcessQuery,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let kind = match query.strategy.as_deref() {
        Some(s) => s.parse::<StrategyKind>()?,
        None => state.config.strategy,
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if let Some(content_type) = field.content_type() {
            if !is_pdf_content_type(content_type) {
                return Err(ApiError::UnsupportedMediaType(content_type.to_string()));
            }
        }
        upload = Some(field.bytes().await?);
        break;
    }

    let upload = match upload {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(ApiError::MissingFile),
    };

    tracing::info!(strategy = %kind, bytes = upload.len(), "Processing label upload");

    // Each request gets its own engine on the blocking pool
    let layout = state.config.layout.clone();
    let copies = layout.copies;
    let output = tokio::task::spawn_blocking(move || {
        let engine = LayoutEngine::new(layout, kind)?;
        engine.process(&upload)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Layout task failed: {}", e)))??;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PDF_MIME));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", OUTPUT_FILENAME))
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    headers.insert(
        STRATEGY_HEADER,
        HeaderValue::from_static(output.metrics.strategy),
    );
    headers.insert(COPIES_HEADER, HeaderValue::from(copies));

    Ok((headers, output.bytes))
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|media| {
            media
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case("text/html")
        })
}

fn is_pdf_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(
        essence.as_str(),
        "application/pdf" | "application/x-pdf" | "application/octet-stream"
    )
}
