use axum::{
    Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisService, HeatmapLayer, HeatmapPoint};
use crate::error::CitySenseError;
use crate::models::{AnalysisResult, FeedbackSubmission};
use crate::suggestions::CitySuggestion;

/// Header carrying the caller's user id
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error returned by handlers, rendered as JSON
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: format!("Authentication required ({USER_HEADER} header)"),
        }
    }
}

impl From<CitySenseError> for ApiError {
    fn from(err: CitySenseError) -> Self {
        let (status, code) = match &err {
            CitySenseError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CitySenseError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CitySenseError::DataIncomplete { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DATA_INCOMPLETE")
            }
            CitySenseError::Api { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            CitySenseError::Narrative { .. } => (StatusCode::BAD_GATEWAY, "AI_ANALYSIS_FAILED"),
            CitySenseError::Config { .. }
            | CitySenseError::Cache { .. }
            | CitySenseError::Storage { .. }
            | CitySenseError::Io { .. }
            | CitySenseError::General { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {err}");
        } else {
            tracing::debug!("Request rejected: {err}");
        }

        Self {
            status,
            code,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Caller identity taken from the user header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CurrentUser(value.to_string()))
            .ok_or_else(ApiError::unauthorized)
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub report_id: u64,
    pub quality_score: f64,
    pub avg_feedback_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    pub layer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    #[serde(default)]
    pub q: String,
}

pub fn router(service: AnalysisService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/reports", get(list_reports))
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}/feedback", post(submit_feedback))
        .route("/heatmap", get(heatmap))
        .route("/cities", get(city_suggestions))
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

async fn analyze(
    State(service): State<AnalysisService>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<(StatusCode, Json<AnalysisResult>)> {
    let result = service.analyze(&user, &request.address).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_reports(
    State(service): State<AnalysisService>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<AnalysisResult>>> {
    Ok(Json(service.reports(&user).await?))
}

async fn get_report(
    State(service): State<AnalysisService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<Json<AnalysisResult>> {
    Ok(Json(service.report(id, &user).await?))
}

async fn submit_feedback(
    State(service): State<AnalysisService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(submission): Json<FeedbackSubmission>,
) -> ApiResult<Json<FeedbackResponse>> {
    let (feedback, report) = service.submit_feedback(id, &user, submission).await?;
    Ok(Json(FeedbackResponse {
        report_id: report.id,
        quality_score: feedback.quality_score(),
        avg_feedback_score: report.avg_feedback_score,
    }))
}

async fn heatmap(
    State(service): State<AnalysisService>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<HeatmapQuery>,
) -> Json<Vec<HeatmapPoint>> {
    let layer = HeatmapLayer::from_param(query.layer.as_deref());
    Json(service.heatmap(layer).await)
}

async fn city_suggestions(
    State(service): State<AnalysisService>,
    Query(query): Query<CitiesQuery>,
) -> Json<Vec<CitySuggestion>> {
    Json(service.suggest_cities(&query.q).await)
}
