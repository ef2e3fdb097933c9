// src/handlers/consumers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
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
    middleware::{
        i18n::Locale,
        rbac::{OperatorAccess, RepresentativeAccess, RequireRole, StaffAccess},
    },
    models::consumer::{Consumer, ConsumerFilters, ConsumerPhase, ConsumerType, NewConsumer},
};

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerPayload {
    #[validate(length(min = 11, max = 18, message = "CPF/CNPJ inválido"))]
    #[schema(example = "123.456.789-00")]
    pub cpf_cnpj: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Padaria Pão Quente")]
    pub name: String,

    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub city: String,

    #[validate(length(equal = 2, message = "Use a sigla do estado"))]
    #[schema(example = "MG")]
    pub state: String,

    pub concessionaire: Option<String>,
    pub uc_number: Option<String>,
    pub consumer_type: ConsumerType,
    pub phase: ConsumerPhase,

    #[schema(value_type = f64, example = 1200.0)]
    pub average_monthly_consumption: Decimal,

    // Padrão: 0
    #[schema(value_type = Option<f64>, example = 15.0)]
    pub discount_offered: Option<Decimal>,

    pub generator_id: Option<Uuid>,

    // Só vale no cadastro da equipe; na submissão do representante é ignorado
    pub representative_id: Option<Uuid>,
}

impl From<ConsumerPayload> for NewConsumer {
    fn from(p: ConsumerPayload) -> Self {
        NewConsumer {
            cpf_cnpj: p.cpf_cnpj,
            name: p.name,
            email: p.email,
            phone: p.phone,
            city: p.city,
            state: p.state,
            concessionaire: p.concessionaire,
            uc_number: p.uc_number,
            consumer_type: p.consumer_type,
            phase: p.phase,
            average_monthly_consumption: p.average_monthly_consumption,
            discount_offered: p.discount_offered.unwrap_or(Decimal::ZERO),
            generator_id: p.generator_id,
            representative_id: p.representative_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocatePayload {
    pub generator_id: Uuid,

    // (0, 100]
    #[schema(value_type = f64, example = 25.0)]
    pub percentage: Decimal,
}

// --- Handlers ---

// GET /api/consumers
#[utoipa::path(
    get,
    path = "/api/consumers",
    tag = "Consumers",
    params(ConsumerFilters, PageParams),
    responses((status = 200, body = Paginated<Consumer>)),
    security(("api_jwt" = []))
)]
pub async fn list_consumers(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Query(filters): Query<ConsumerFilters>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let consumers = app_state
        .approval_service
        .list_consumers(filters, page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumers)))
}

// POST /api/consumers
#[utoipa::path(
    post,
    path = "/api/consumers",
    tag = "Consumers",
    request_body = ConsumerPayload,
    responses(
        (status = 201, description = "Consumidor cadastrado já aprovado", body = Consumer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<OperatorAccess>,
    Json(payload): Json<ConsumerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let consumer = app_state
        .approval_service
        .submit_as_admin(&app_state.db_pool, payload.into(), access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(consumer)))
}

// POST /api/representative/consumers
#[utoipa::path(
    post,
    path = "/api/representative/consumers",
    tag = "Consumers",
    request_body = ConsumerPayload,
    responses(
        (status = 201, description = "Consumidor submetido, aguardando aprovação", body = Consumer),
        (status = 409, description = "Representante inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<RepresentativeAccess>,
    Json(payload): Json<ConsumerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let consumer = app_state
        .approval_service
        .submit_as_representative(&app_state.db_pool, payload.into(), access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(consumer)))
}

// GET /api/consumers/{id}
#[utoipa::path(
    get,
    path = "/api/consumers/{id}",
    tag = "Consumers",
    responses(
        (status = 200, body = Consumer),
        (status = 404, description = "Consumidor não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Consumidor")),
    security(("api_jwt" = []))
)]
pub async fn get_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let consumer = app_state
        .approval_service
        .get_consumer(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumer)))
}

// POST /api/consumers/{id}/allocate
#[utoipa::path(
    post,
    path = "/api/consumers/{id}/allocate",
    tag = "Consumers",
    request_body = AllocatePayload,
    responses(
        (status = 200, description = "Consumidor alocado", body = Consumer),
        (status = 400, description = "Percentual fora de (0, 100]"),
        (status = 409, description = "Já alocado, não aprovado ou sem capacidade")
    ),
    params(("id" = Uuid, Path, description = "ID do Consumidor")),
    security(("api_jwt" = []))
)]
pub async fn allocate_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<OperatorAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let consumer = app_state
        .allocation_service
        .allocate(&app_state.db_pool, id, payload.generator_id, payload.percentage, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumer)))
}

// POST /api/consumers/{id}/deallocate
#[utoipa::path(
    post,
    path = "/api/consumers/{id}/deallocate",
    tag = "Consumers",
    responses((status = 200, description = "Consumidor disponível novamente", body = Consumer)),
    params(("id" = Uuid, Path, description = "ID do Consumidor")),
    security(("api_jwt" = []))
)]
pub async fn deallocate_consumer(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<OperatorAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let consumer = app_state
        .allocation_service
        .deallocate(&app_state.db_pool, id, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumer)))
}
