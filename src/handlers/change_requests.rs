// src/handlers/change_requests.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    handlers::approvals::RejectPayload,
    middleware::{
        i18n::Locale,
        rbac::{ManagerAccess, RepresentativeAccess, RequireRole, StaffAccess},
    },
    models::change_request::{ChangeRequestReview, ConsumerChangeRequest, ConsumerChanges},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChangeRequestPayload {
    pub consumer_id: Uuid,
    // Apenas os campos que devem mudar
    pub new_values: ConsumerChanges,
}

// POST /api/change-requests
#[utoipa::path(
    post,
    path = "/api/change-requests",
    tag = "Change Requests",
    request_body = CreateChangeRequestPayload,
    responses(
        (status = 201, description = "Solicitação criada", body = ConsumerChangeRequest),
        (status = 400, description = "Nenhum campo diferente do atual"),
        (status = 403, description = "Consumidor de outro representante")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_change_request(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<RepresentativeAccess>,
    Json(payload): Json<CreateChangeRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .change_request_service
        .create(&app_state.db_pool, payload.consumer_id, access.caller.id, payload.new_values)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/change-requests/pending
#[utoipa::path(
    get,
    path = "/api/change-requests/pending",
    tag = "Change Requests",
    params(PageParams),
    responses((status = 200, body = Paginated<ConsumerChangeRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending_change_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let pending = app_state
        .change_request_service
        .list_pending(page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pending)))
}

// GET /api/change-requests/mine
#[utoipa::path(
    get,
    path = "/api/change-requests/mine",
    tag = "Change Requests",
    responses((status = 200, description = "Solicitações do representante logado", body = Vec<ConsumerChangeRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_change_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<RepresentativeAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = app_state
        .change_request_service
        .list_for_representative(&app_state.db_pool, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(requests)))
}

// POST /api/change-requests/{id}/approve
#[utoipa::path(
    post,
    path = "/api/change-requests/{id}/approve",
    tag = "Change Requests",
    params(("id" = Uuid, Path, description = "ID da Solicitação")),
    responses(
        (status = 200, description = "Alterações aplicadas ao consumidor", body = ChangeRequestReview),
        (status = 409, description = "Solicitação já revisada")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_change_request(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let review = app_state
        .change_request_service
        .approve(&app_state.db_pool, id, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(review)))
}

// POST /api/change-requests/{id}/reject
#[utoipa::path(
    post,
    path = "/api/change-requests/{id}/reject",
    tag = "Change Requests",
    request_body = RejectPayload,
    params(("id" = Uuid, Path, description = "ID da Solicitação")),
    responses(
        (status = 200, body = ConsumerChangeRequest),
        (status = 409, description = "Solicitação já revisada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_change_request(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let rejected = app_state
        .change_request_service
        .reject(&app_state.db_pool, id, access.caller.id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rejected)))
}
