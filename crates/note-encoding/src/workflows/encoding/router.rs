use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::batch::{EncodeItem, ItemFailure};
use super::domain::{CourseCode, NoteRecordIdentity, TeacherId};
use super::repository::{GradingNotifier, NoteRepository, NoteSearchFilters};
use super::service::{EncodingServiceError, NoteEncodingService};

/// Router builder exposing HTTP endpoints for encoding, submission and progress.
pub fn note_router<R, N>(service: Arc<NoteEncodingService<R, N>>) -> Router
where
    R: NoteRepository + 'static,
    N: GradingNotifier + 'static,
{
    Router::new()
        .route("/api/v1/notes/encode", post(encode_handler::<R, N>))
        .route("/api/v1/notes/submit", post(submit_handler::<R, N>))
        .route("/api/v1/notes/progress", get(progress_handler::<R, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EncodeRequest {
    pub teacher: TeacherId,
    #[serde(default)]
    pub today: Option<NaiveDate>,
    pub items: Vec<EncodeItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub teacher: TeacherId,
    #[serde(default)]
    pub today: Option<NaiveDate>,
    pub notes: Vec<NoteRecordIdentity>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProgressQuery {
    pub course_code: Option<String>,
    pub academic_year: Option<u16>,
    pub session: Option<u8>,
    pub cohort_name: Option<String>,
    pub today: Option<NaiveDate>,
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn encode_handler<R, N>(
    State(service): State<Arc<NoteEncodingService<R, N>>>,
    axum::Json(request): axum::Json<EncodeRequest>,
) -> Response
where
    R: NoteRepository + 'static,
    N: GradingNotifier + 'static,
{
    let today = resolve_today(request.today);
    match service.encode_batch(&request.teacher, request.items, today) {
        Ok(accepted) => (StatusCode::OK, axum::Json(json!({ "accepted": accepted }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<NoteEncodingService<R, N>>>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    R: NoteRepository + 'static,
    N: GradingNotifier + 'static,
{
    let today = resolve_today(request.today);
    match service.submit_many(&request.teacher, request.notes, today) {
        Ok(submitted) => {
            (StatusCode::OK, axum::Json(json!({ "submitted": submitted }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<R, N>(
    State(service): State<Arc<NoteEncodingService<R, N>>>,
    Query(query): Query<ProgressQuery>,
) -> Response
where
    R: NoteRepository + 'static,
    N: GradingNotifier + 'static,
{
    let filters = NoteSearchFilters {
        course_codes: query.course_code.map(CourseCode).into_iter().collect(),
        academic_year: query.academic_year,
        session: query.session,
        cohort_name: query.cohort_name,
    };
    match service.search_progress(&filters, resolve_today(query.today)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: EncodingServiceError) -> Response {
    let status = match &error {
        EncodingServiceError::Validation(aggregate) => {
            let payload = json!({
                "error": aggregate.to_string(),
                "accepted": aggregate.accepted,
                "failures": aggregate
                    .failures
                    .iter()
                    .map(ItemFailure::view)
                    .collect::<Vec<_>>(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        EncodingServiceError::TeacherNotAssigned { .. } => StatusCode::FORBIDDEN,
        EncodingServiceError::EncodingPeriodClosed => StatusCode::CONFLICT,
        EncodingServiceError::NoteNotFound(_) => StatusCode::NOT_FOUND,
        EncodingServiceError::Repository(_)
        | EncodingServiceError::Translator(_)
        | EncodingServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
