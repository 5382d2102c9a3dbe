use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use super::attachments::FileUpload;
use super::domain::{ApplicationStatus, Claim, FilingDomain};
use super::engine::{EngineError, SubmissionRequest};
use super::repository::RepositoryError;
use super::service::{FilingService, FilingServiceError};
use super::validation::{ValidationMode, Violation};
use crate::workflows::intake::attachments::FileStore;
use crate::workflows::intake::repository::ApplicationRepository;

const MAX_PAGE_LIMIT: usize = 100;
const DEFAULT_PAGE_LIMIT: usize = 20;

/// Router builder exposing the filing intake endpoints.
pub fn filing_router<R, S>(service: Arc<FilingService<R, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/filings",
            post(open_handler::<R, S>).get(list_handler::<R, S>),
        )
        .route(
            "/api/v1/filings/:key",
            get(get_handler::<R, S>)
                .patch(patch_handler::<R, S>)
                .delete(delete_handler::<R, S>),
        )
        .route("/api/v1/filings/:key/steps", post(submit_step_handler::<R, S>))
        .route("/api/v1/filings/:key/status", post(status_handler::<R, S>))
        .route(
            "/api/v1/filings/:key/resubmit",
            post(resubmit_handler::<R, S>),
        )
        .route("/api/v1/filings/:key/revert", post(revert_handler::<R, S>))
        .route(
            "/api/v1/filings/:key/documents/:document",
            post(complete_document_handler::<R, S>)
                .delete(uncomplete_document_handler::<R, S>),
        )
        .route(
            "/api/v1/filings/:key/attachments/:stored_name",
            delete(delete_attachment_handler::<R, S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenFilingRequest {
    pub(crate) domain: FilingDomain,
}

/// One base64-encoded upload carried inside a JSON submission.
#[derive(Debug, Deserialize)]
pub(crate) struct FilePayload {
    pub(crate) original_name: String,
    pub(crate) mime_type: String,
    pub(crate) content_base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StepSubmissionRequest {
    pub(crate) step: Option<u8>,
    #[serde(default)]
    pub(crate) fields: serde_json::Map<String, Value>,
    #[serde(default)]
    pub(crate) claims: Option<Vec<Claim>>,
    #[serde(default)]
    pub(crate) files: Vec<FilePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchFilingRequest {
    #[serde(default)]
    pub(crate) fields: serde_json::Map<String, Value>,
    #[serde(default)]
    pub(crate) claims: Option<Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub(crate) status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevertStepRequest {
    pub(crate) step: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) page: Option<usize>,
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn open_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    axum::Json(request): axum::Json<OpenFilingRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.open(request.domain) {
        Ok(application) => {
            (StatusCode::CREATED, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let mut violations = Vec::new();
    if page < 1 {
        violations.push(Violation::new("page", "min", "page must be at least 1"));
    }
    if limit < 1 || limit > MAX_PAGE_LIMIT {
        violations.push(Violation::new(
            "limit",
            "range",
            format!("limit must be between 1 and {MAX_PAGE_LIMIT}"),
        ));
    }
    if !violations.is_empty() {
        return violations_response(&violations);
    }

    match service.list(page, limit) {
        Ok(applications) => {
            let views: Vec<_> = applications
                .iter()
                .map(|application| application.status_view())
                .collect();
            (
                StatusCode::OK,
                axum::Json(json!({ "page": page, "limit": limit, "filings": views })),
            )
                .into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn get_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.get(&key) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn submit_step_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
    axum::Json(request): axum::Json<StepSubmissionRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    let files = match decode_files(request.files) {
        Ok(files) => files,
        Err(violations) => return violations_response(&violations),
    };

    let submission = SubmissionRequest {
        step: request.step,
        mode: ValidationMode::Submit,
        fields: request.fields,
        claims: request.claims,
        files,
    };

    match service.submit(&key, submission) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn patch_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
    axum::Json(request): axum::Json<PatchFilingRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    let submission = SubmissionRequest {
        step: None,
        mode: ValidationMode::Patch,
        fields: request.fields,
        claims: request.claims,
        files: Vec::new(),
    };

    match service.submit(&key, submission) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.update_status(&key, request.status) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn resubmit_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.resubmit(&key) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn revert_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
    axum::Json(request): axum::Json<RevertStepRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.revert_step(&key, request.step) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn complete_document_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path((key, document)): Path<(String, u8)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.set_document(&key, document, true) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn uncomplete_document_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path((key, document)): Path<(String, u8)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.set_document(&key, document, false) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn delete_attachment_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path((key, stored_name)): Path<(String, String)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.delete_attachment(&key, &stored_name) {
        Ok(application) => {
            (StatusCode::OK, axum::Json(application.status_view())).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn delete_handler<R, S>(
    State(service): State<Arc<FilingService<R, S>>>,
    Path(key): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: FileStore + 'static,
{
    match service.delete(&key) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => service_error_response(error),
    }
}

fn decode_files(payloads: Vec<FilePayload>) -> Result<Vec<FileUpload>, Vec<Violation>> {
    let mut uploads = Vec::with_capacity(payloads.len());
    let mut violations = Vec::new();

    for (index, payload) in payloads.into_iter().enumerate() {
        match BASE64.decode(payload.content_base64.as_bytes()) {
            Ok(bytes) => uploads.push(FileUpload {
                original_name: payload.original_name,
                mime_type: payload.mime_type,
                bytes,
            }),
            Err(_) => violations.push(Violation::new(
                format!("files[{index}]"),
                "encoding",
                "file content must be valid base64",
            )),
        }
    }

    if violations.is_empty() {
        Ok(uploads)
    } else {
        Err(violations)
    }
}

/// Structured failure payload: `{success, error, details}`.
fn failure_response(status: StatusCode, error: &str, details: Vec<Value>) -> Response {
    let payload = json!({
        "success": false,
        "error": error,
        "details": details,
    });
    (status, axum::Json(payload)).into_response()
}

fn violations_response(violations: &[Violation]) -> Response {
    let details = violations
        .iter()
        .map(|violation| {
            json!({
                "field": violation.field,
                "message": violation.message,
                "value": violation.value,
            })
        })
        .collect();
    failure_response(StatusCode::BAD_REQUEST, "validation failed", details)
}

fn service_error_response(error: FilingServiceError) -> Response {
    match error {
        FilingServiceError::Engine(EngineError::Validation(violations)) => {
            violations_response(&violations)
        }
        FilingServiceError::Engine(EngineError::Transition(violation))
        | FilingServiceError::Transition(violation) => failure_response(
            StatusCode::CONFLICT,
            &violation.to_string(),
            Vec::new(),
        ),
        FilingServiceError::Repository(RepositoryError::NotFound) => failure_response(
            StatusCode::NOT_FOUND,
            "application not found",
            Vec::new(),
        ),
        FilingServiceError::AttachmentMissing(stored_name) => failure_response(
            StatusCode::NOT_FOUND,
            &format!("attachment '{stored_name}' not found"),
            Vec::new(),
        ),
        FilingServiceError::Repository(RepositoryError::Conflict) => failure_response(
            StatusCode::CONFLICT,
            "application already exists",
            Vec::new(),
        ),
        other => failure_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &other.to_string(),
            Vec::new(),
        ),
    }
}
