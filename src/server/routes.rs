//! HTTP route handlers.

use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::state::AppState;
use super::views::{IndexTemplate, ResultCard};
use crate::analyzer::{analyze_image, analyze_image_base64, AnalysisResult};
use crate::error::AnalysisError;

/// GET / - Serve the upload page.
pub async fn index(State(state): State<AppState>) -> Response {
    let template = IndexTemplate {
        model_name: state.config.model_name.clone(),
    };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render index page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// POST /analyze - Multipart upload, returns the result-card HTML fragment.
pub async fn analyze_fragment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let image_bytes = read_upload(multipart).await?;
    let result = analyze_image(&state.vision, &image_bytes).await?;

    let card = ResultCard::from_result(&result);
    match card.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            error!("Failed to render result card: {}", e);
            Ok((StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response())
        }
    }
}

/// POST /api/disease-detection-file - Multipart upload, returns JSON.
pub async fn detect_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let image_bytes = read_upload(multipart).await?;
    let result = analyze_image(&state.vision, &image_bytes).await?;
    Ok(Json(result))
}

/// Request body for the base64 detection endpoint.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image_base64: String,
}

/// POST /api/disease-detection - Base64 payload, returns JSON.
pub async fn detect_base64(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = analyze_image_base64(&state.vision, &request.image_base64).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub version: &'static str,
    pub model_name: String,
    pub api_key_set: bool,
}

/// GET /api/health - Service health report.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        service: "leafscan",
        version: env!("CARGO_PKG_VERSION"),
        model_name: state.config.model_name.clone(),
        api_key_set: !state.config.api_key.is_empty(),
    })
}

/// Pull the uploaded image bytes out of a multipart form.
///
/// Accepts the field named `file`; an upload without one is invalid input.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, AnalysisError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AnalysisError::InvalidInput(format!("Failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AnalysisError::InvalidInput(
        "Missing 'file' field in upload".to_string(),
    ))
}

/// Maps analysis errors onto HTTP status codes for JSON responses.
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Parse { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (
                AnalysisError::InvalidInput("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AnalysisError::Upstream("503".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AnalysisError::Parse {
                    reason: "noise".to_string(),
                    raw: "noise".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
