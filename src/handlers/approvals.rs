// src/handlers/approvals.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ManagerAccess, RequireRole, StaffAccess},
    },
    models::consumer::{Consumer, ConsumerFilters},
    services::approval_service::ApprovalOutcome,
};

/// Motivo obrigatório das rejeições (consumidores e solicitações)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 1000, message = "required"))]
    #[schema(example = "Documentação da UC ilegível")]
    pub reason: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ApproveQuery {
    /// Gera a comissão junto com a aprovação (padrão: true)
    pub with_commission: Option<bool>,
}

// GET /api/approvals/consumers
#[utoipa::path(
    get,
    path = "/api/approvals/consumers",
    tag = "Approvals",
    params(ConsumerFilters, PageParams),
    responses((status = 200, description = "Consumidores aguardando aprovação", body = Paginated<Consumer>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending_consumers(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Query(filters): Query<ConsumerFilters>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let pending = app_state
        .approval_service
        .list_pending(filters, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pending)))
}

// POST /api/approvals/consumers/{id}/approve
#[utoipa::path(
    post,
    path = "/api/approvals/consumers/{id}/approve",
    tag = "Approvals",
    params(
        ("id" = Uuid, Path, description = "ID do Consumidor"),
        ApproveQuery
    ),
    responses(
        (status = 200, description = "Consumidor aprovado (e comissão, se houver representante)", body = ApprovalOutcome),
        (status = 409, description = "Consumidor já revisado")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
    Query(query): Query<ApproveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = if query.with_commission.unwrap_or(true) {
        app_state
            .approval_service
            .approve_and_commission(&app_state.db_pool, id, access.caller.id)
            .await
    } else {
        app_state
            .approval_service
            .approve(&app_state.db_pool, id, access.caller.id)
            .await
            .map(|consumer| ApprovalOutcome { consumer, commission: None })
    };
    let outcome = result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/approvals/consumers/{id}/reject
#[utoipa::path(
    post,
    path = "/api/approvals/consumers/{id}/reject",
    tag = "Approvals",
    request_body = RejectPayload,
    params(("id" = Uuid, Path, description = "ID do Consumidor")),
    responses(
        (status = 200, body = Consumer),
        (status = 400, description = "Motivo ausente"),
        (status = 409, description = "Consumidor já revisado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let consumer = app_state
        .approval_service
        .reject(&app_state.db_pool, id, access.caller.id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumer)))
}
