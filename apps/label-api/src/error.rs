//! Error types for the label API

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use label_layout::LayoutError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded: send the label PDF in the \"file\" field")]
    MissingFile,

    #[error("Unsupported file type {0}: upload a PDF")]
    UnsupportedMediaType(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        // The body limit surfaces through the multipart stream
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::InvalidRequest(err.body_text())
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Layout(LayoutError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Layout(LayoutError::PageCount { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Layout(LayoutError::InvalidConfig(_)) => StatusCode::BAD_REQUEST,
            ApiError::Layout(LayoutError::Encode(_))
            | ApiError::Layout(LayoutError::Render(_))
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!("Label processing failed: {}", self);
        } else {
            tracing::debug!(%status, "Rejected upload: {}", self);
        }
    }

    /// Error page for uploads posted by the browser form
    pub fn into_html_response(self) -> Response {
        let status = self.status();
        self.log(status);

        let page = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Jar Label Layout: {code}</title>
  <style>body {{ font-family: system-ui, sans-serif; max-width: 32rem; margin: 3rem auto; padding: 0 1rem; }}</style>
</head>
<body>
  <h1>Could not lay out the label</h1>
  <p>{message}</p>
  <p><a href="/">Try another file</a></p>
</body>
</html>
"#,
            code = status.as_u16(),
            message = escape_html(&self.to_string()),
        );

        (status, Html(page)).into_response()
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        self.log(status);

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_errors_map_to_status() {
        assert_eq!(
            ApiError::from(LayoutError::Decode("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LayoutError::PageCount { found: 3 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(LayoutError::Encode("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(LayoutError::Render("pdfium".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upload_errors_map_to_status() {
        assert_eq!(ApiError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnsupportedMediaType("image/png".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::PayloadTooLarge("limit".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_page_count_message_is_kept() {
        let err = ApiError::from(LayoutError::PageCount { found: 3 });
        assert_eq!(
            err.to_string(),
            "Label PDF must have exactly one page, found 3"
        );
    }

    #[test]
    fn test_html_escapes_message() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }
}
