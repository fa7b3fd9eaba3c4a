//! # API REST
//!
//! REST API implementation for the triage service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Header-based caller identification and error-to-status mapping
//!
//! Uses `api-shared` for transport types and authentication. Every decision about what a
//! caller may do or see is made by [`TriageService`]; handlers only translate.

#![warn(rust_2018_idioms)]

use api_shared::auth::{self, AuthError};
use api_shared::dto;
use api_shared::HealthService;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use triage_core::{Actor, CaseId, RiskTier, SubjectRef, TriageError, TriageService};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TriageService>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(service: TriageService, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            api_key: api_key.into(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Triage API",
        description = "Symptom triage scoring and case review. Every route except /health \
                       requires the x-api-key and x-actor-id headers; x-actor-role selects \
                       reporter (default) or reviewer."
    ),
    paths(
        health,
        submit_case,
        list_cases,
        my_cases,
        get_case,
        override_case,
        list_overrides,
        analytics,
        preview_score,
        ruleset,
    ),
    components(schemas(
        dto::HealthRes,
        dto::SubmitCaseReq,
        dto::ScoreReq,
        dto::ExplanationRes,
        dto::ScoreRes,
        dto::CaseDetailRes,
        dto::CaseRes,
        dto::ListCasesRes,
        dto::OverrideCaseReq,
        dto::OverrideCaseRes,
        dto::OverrideRecordRes,
        dto::ListOverridesRes,
        dto::AnalyticsRes,
        dto::LexiconEntryRes,
        dto::RulesetRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cases", post(submit_case))
        .route("/cases", get(list_cases))
        .route("/cases/mine", get(my_cases))
        .route("/cases/:id", get(get_case))
        .route("/cases/:id/override", put(override_case))
        .route("/overrides", get(list_overrides))
        .route("/analytics", get(analytics))
        .route("/score", post(preview_score))
        .route("/ruleset", get(ruleset))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the calling actor from request headers.
fn actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    auth::resolve_actor(
        header(headers, auth::API_KEY_HEADER),
        &state.api_key,
        header(headers, auth::ACTOR_ID_HEADER),
        header(headers, auth::ACTOR_ROLE_HEADER),
    )
    .map_err(|e| {
        tracing::warn!("Rejected request: {}", e);
        match e {
            AuthError::MissingApiKey => (StatusCode::UNAUTHORIZED, "Missing API key"),
            AuthError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            AuthError::MissingActor => (StatusCode::UNAUTHORIZED, "Missing actor id"),
            AuthError::InvalidRole(_) => (StatusCode::BAD_REQUEST, "Invalid actor role"),
        }
    })
}

fn status_for(e: TriageError) -> ApiError {
    match e {
        TriageError::InvalidInput(msg) => {
            tracing::debug!("Invalid input: {}", msg);
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        TriageError::NotFound(_) => (StatusCode::NOT_FOUND, "Case not found"),
        TriageError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "Not permitted"),
        e => {
            tracing::error!("Storage error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// Malformed or mistyped JSON bodies are bad input, the same as a failed validation.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid request body")
    })
}

/// Run a store call off the async workers; journal writes sync to disk under a lock.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Store task failed: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?
}

fn parse_case_id(id: &str) -> Result<CaseId, ApiError> {
    CaseId::parse(id).map_err(|e| {
        tracing::debug!("Invalid case id: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid case id")
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
/// Health check endpoint. Does not require authentication.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/cases",
    request_body = dto::SubmitCaseReq,
    responses(
        (status = 201, description = "Case scored and stored", body = dto::CaseRes),
        (status = 400, description = "Missing or empty symptom text, malformed body or subject"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Reporter submitting for another subject"),
        (status = 500, description = "Internal server error")
    )
)]
/// Submit a symptom description for scoring.
///
/// Reporters receive only the tier and recommendation; reviewers also receive the score and
/// explanation.
#[axum::debug_handler]
async fn submit_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<dto::SubmitCaseReq>, JsonRejection>,
) -> Result<(StatusCode, Json<dto::CaseRes>), ApiError> {
    let actor = actor(&state, &headers)?;
    let req = json_body(payload)?;
    let subject = match req.subject_ref.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(
            SubjectRef::new(s).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid subject_ref"))?,
        ),
    };

    let service = Arc::clone(&state.service);
    let view = blocking(move || {
        service
            .submit_case(
                &actor,
                subject,
                req.text.as_deref().unwrap_or_default(),
                req.location.as_deref(),
            )
            .map_err(status_for)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(dto::CaseRes::from(&view))))
}

#[utoipa::path(
    get,
    path = "/cases",
    params(dto::ListCasesQuery),
    responses(
        (status = 200, description = "Cases matching the filter, oldest first", body = dto::ListCasesRes),
        (status = 400, description = "Unknown risk tier"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer"),
        (status = 500, description = "Internal server error")
    )
)]
/// List all cases. Reviewers only.
#[axum::debug_handler]
async fn list_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<dto::ListCasesQuery>,
) -> Result<Json<dto::ListCasesRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let filter = query.into_filter().map_err(status_for)?;
    let views = state
        .service
        .review_cases(&actor, &filter)
        .map_err(status_for)?;
    Ok(Json(dto::ListCasesRes::from_views(&views)))
}

#[utoipa::path(
    get,
    path = "/cases/mine",
    responses(
        (status = 200, description = "The caller's own cases, oldest first", body = dto::ListCasesRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
/// List the caller's own cases.
#[axum::debug_handler]
async fn my_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<dto::ListCasesRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let views = state.service.my_cases(&actor).map_err(status_for)?;
    Ok(Json(dto::ListCasesRes::from_views(&views)))
}

#[utoipa::path(
    get,
    path = "/cases/{id}",
    params(("id" = String, Path, description = "Case id (32 lowercase hex characters)")),
    responses(
        (status = 200, description = "The case", body = dto::CaseRes),
        (status = 400, description = "Malformed case id"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "No such case visible to the caller"),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch one case. Reporters can only see their own.
#[axum::debug_handler]
async fn get_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<dto::CaseRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let id = parse_case_id(&id)?;
    let view = state.service.get_case(&actor, &id).map_err(status_for)?;
    Ok(Json(dto::CaseRes::from(&view)))
}

#[utoipa::path(
    put,
    path = "/cases/{id}/override",
    params(("id" = String, Path, description = "Case id (32 lowercase hex characters)")),
    request_body = dto::OverrideCaseReq,
    responses(
        (status = 200, description = "Override recorded", body = dto::OverrideCaseRes),
        (status = 400, description = "Malformed case id or unknown tier"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer"),
        (status = 404, description = "No such case"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a reviewer's tier override. The computed score is left untouched.
#[axum::debug_handler]
async fn override_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<dto::OverrideCaseReq>, JsonRejection>,
) -> Result<Json<dto::OverrideCaseRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let id = parse_case_id(&id)?;
    let req = json_body(payload)?;
    let tier = req.risk_tier.parse::<RiskTier>().map_err(status_for)?;
    let service = Arc::clone(&state.service);
    let ack = blocking(move || {
        service
            .override_case(&actor, &id, tier)
            .map_err(status_for)
    })
    .await?;
    Ok(Json(dto::OverrideCaseRes::from(&ack)))
}

#[utoipa::path(
    get,
    path = "/overrides",
    responses(
        (status = 200, description = "Override history, oldest first", body = dto::ListOverridesRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer"),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn list_overrides(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<dto::ListOverridesRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let records = state.service.override_history(&actor).map_err(status_for)?;
    Ok(Json(dto::ListOverridesRes {
        overrides: records.iter().map(dto::OverrideRecordRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/analytics",
    responses(
        (status = 200, description = "Risk, location and override distributions", body = dto::AnalyticsRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer"),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<dto::AnalyticsRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let summary = state.service.analytics(&actor).map_err(status_for)?;
    Ok(Json(dto::AnalyticsRes::from(&summary)))
}

#[utoipa::path(
    post,
    path = "/score",
    request_body = dto::ScoreReq,
    responses(
        (status = 200, description = "Score without storing a case", body = dto::ScoreRes),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer")
    )
)]
/// Score text without creating a case.
#[axum::debug_handler]
async fn preview_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<dto::ScoreReq>, JsonRejection>,
) -> Result<Json<dto::ScoreRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let req = json_body(payload)?;
    let result = state
        .service
        .preview_score(&actor, &req.text, req.location.as_deref())
        .map_err(status_for)?;
    Ok(Json(dto::ScoreRes::from(&result)))
}

#[utoipa::path(
    get,
    path = "/ruleset",
    responses(
        (status = 200, description = "The active scoring ruleset", body = dto::RulesetRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Caller is not a reviewer")
    )
)]
#[axum::debug_handler]
async fn ruleset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<dto::RulesetRes>, ApiError> {
    let actor = actor(&state, &headers)?;
    let ruleset = state.service.ruleset(&actor).map_err(status_for)?;
    Ok(Json(dto::RulesetRes::from(ruleset.as_ref())))
}
