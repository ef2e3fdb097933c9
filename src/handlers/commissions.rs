// src/handlers/commissions.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AnyRole, ManagerAccess, RequireRole, StaffAccess},
    },
    models::{
        auth::CallerIdentity,
        commission::{Commission, CommissionQuote, CommissionStats},
    },
};

/// Equipe lê qualquer representante; o representante só lê a si mesmo.
pub fn ensure_can_read(caller: &CallerIdentity, representative_id: Uuid) -> Result<(), AppError> {
    if caller.role.is_staff() || caller.id == representative_id {
        return Ok(());
    }
    Err(AppError::Forbidden("commission.other_representative"))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateCommissionPayload {
    #[schema(value_type = f64, example = 1200.0)]
    pub kwh_consumption: Decimal,

    // Ausente = preço vigente
    #[schema(value_type = Option<f64>, example = 0.8)]
    pub kwh_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Início (RFC 3339)
    pub start: DateTime<Utc>,
    /// Fim (RFC 3339), inclusivo
    pub end: DateTime<Utc>,
}

// POST /api/commissions/calculate
#[utoipa::path(
    post,
    path = "/api/commissions/calculate",
    tag = "Commissions",
    request_body = CalculateCommissionPayload,
    responses(
        (status = 200, description = "Simulação do cálculo", body = CommissionQuote)
    ),
    security(("api_jwt" = []))
)]
pub async fn calculate(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<AnyRole>,
    Json(payload): Json<CalculateCommissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .commission_service
        .quote(&app_state.db_pool, payload.kwh_consumption, payload.kwh_price)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/commissions/consumers/{consumer_id}
#[utoipa::path(
    post,
    path = "/api/commissions/consumers/{consumer_id}",
    tag = "Commissions",
    responses(
        (status = 201, description = "Comissão criada", body = Commission),
        (status = 409, description = "Já existe comissão ou consumidor não aprovado")
    ),
    params(
        ("consumer_id" = Uuid, Path, description = "ID do Consumidor")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_for_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(consumer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = app_state
        .commission_service
        .create_for_approved_consumer(&app_state.db_pool, consumer_id, Some(access.caller.id))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(commission)))
}

// PATCH /api/commissions/{id}/pay
#[utoipa::path(
    patch,
    path = "/api/commissions/{id}/pay",
    tag = "Commissions",
    responses(
        (status = 200, description = "Comissão paga", body = Commission),
        (status = 409, description = "Comissão já paga ou cancelada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Comissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_as_paid(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = app_state
        .commission_service
        .mark_as_paid(&app_state.db_pool, id, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(commission)))
}

// GET /api/commissions
#[utoipa::path(
    get,
    path = "/api/commissions",
    tag = "Commissions",
    responses((status = 200, body = Vec<Commission>)),
    security(("api_jwt" = []))
)]
pub async fn list_all(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let commissions = app_state
        .commission_service
        .list_all(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(commissions)))
}

// GET /api/commissions/pending
#[utoipa::path(
    get,
    path = "/api/commissions/pending",
    tag = "Commissions",
    responses((status = 200, description = "Comissões ainda não pagas", body = Vec<Commission>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let commissions = app_state
        .commission_service
        .list_pending(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(commissions)))
}

// GET /api/commissions/representatives/{id}
#[utoipa::path(
    get,
    path = "/api/commissions/representatives/{id}",
    tag = "Commissions",
    responses(
        (status = 200, body = Vec<Commission>),
        (status = 403, description = "Representante consultando outro representante")
    ),
    params(("id" = Uuid, Path, description = "ID do Representante")),
    security(("api_jwt" = []))
)]
pub async fn list_for_representative(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AnyRole>,
    Path(representative_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_can_read(&access.caller, representative_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commissions = app_state
        .commission_service
        .list_for_representative(&app_state.db_pool, representative_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(commissions)))
}

// GET /api/commissions/representatives/{id}/stats
#[utoipa::path(
    get,
    path = "/api/commissions/representatives/{id}/stats",
    tag = "Commissions",
    responses((status = 200, body = CommissionStats)),
    params(("id" = Uuid, Path, description = "ID do Representante")),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AnyRole>,
    Path(representative_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_can_read(&access.caller, representative_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .commission_service
        .get_stats_for_representative(&app_state.db_pool, representative_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/commissions/representatives/{id}/period?start=...&end=...
#[utoipa::path(
    get,
    path = "/api/commissions/representatives/{id}/period",
    tag = "Commissions",
    responses((status = 200, body = Vec<Commission>)),
    params(
        ("id" = Uuid, Path, description = "ID do Representante"),
        PeriodQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_period(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AnyRole>,
    Path(representative_id): Path<Uuid>,
    Query(period): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_can_read(&access.caller, representative_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commissions = app_state
        .commission_service
        .list_by_period(&app_state.db_pool, representative_id, period.start, period.end)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(commissions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    #[test]
    fn staff_reads_any_representative() {
        let caller = CallerIdentity { id: Uuid::new_v4(), role: Role::Operator };
        assert!(ensure_can_read(&caller, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn representative_reads_only_itself() {
        let caller = CallerIdentity { id: Uuid::new_v4(), role: Role::Representative };
        assert!(ensure_can_read(&caller, caller.id).is_ok());
        assert_eq!(ensure_can_read(&caller, Uuid::new_v4()).unwrap_err().kind(), "FORBIDDEN");
    }
}
