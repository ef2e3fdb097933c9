// src/handlers/generators.rs

use axum::{
    extract::{Path, State},
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
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminAccess, ManagerAccess, RequireRole, StaffAccess},
    },
    models::generator::{
        CapacityView, Generator, GeneratorDetail, GeneratorPatch, GeneratorStatus, GeneratorWithCapacity,
        NewGenerator, SourceType,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeneratorPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Fazenda Sol Nascente Ltda")]
    pub owner_name: String,

    #[validate(length(min = 11, max = 18, message = "CPF/CNPJ inválido"))]
    #[schema(example = "12.345.678/0001-99")]
    pub cpf_cnpj: String,

    pub source_type: SourceType,

    #[schema(value_type = f64, example = 25000.0)]
    pub installed_power: Decimal,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "CEMIG")]
    pub concessionaire: String,

    #[validate(length(min = 1, message = "required"))]
    pub uc_number: String,

    #[validate(length(min = 1, message = "required"))]
    pub city: String,

    #[validate(length(equal = 2, message = "Use a sigla do estado"))]
    #[schema(example = "MG")]
    pub state: String,

    // Padrão: UNDER_ANALYSIS
    pub status: Option<GeneratorStatus>,
}

impl From<CreateGeneratorPayload> for NewGenerator {
    fn from(p: CreateGeneratorPayload) -> Self {
        NewGenerator {
            owner_name: p.owner_name,
            cpf_cnpj: p.cpf_cnpj,
            source_type: p.source_type,
            installed_power: p.installed_power,
            concessionaire: p.concessionaire,
            uc_number: p.uc_number,
            city: p.city,
            state: p.state,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGeneratorPayload {
    #[validate(length(min = 1, message = "required"))]
    pub owner_name: Option<String>,
    pub source_type: Option<SourceType>,
    #[schema(value_type = Option<f64>)]
    pub installed_power: Option<Decimal>,
    #[validate(length(min = 1, message = "required"))]
    pub concessionaire: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub uc_number: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "Use a sigla do estado"))]
    pub state: Option<String>,
    pub status: Option<GeneratorStatus>,
}

impl From<UpdateGeneratorPayload> for GeneratorPatch {
    fn from(p: UpdateGeneratorPayload) -> Self {
        GeneratorPatch {
            owner_name: p.owner_name,
            source_type: p.source_type,
            installed_power: p.installed_power,
            concessionaire: p.concessionaire,
            uc_number: p.uc_number,
            city: p.city,
            state: p.state,
            status: p.status,
        }
    }
}

// GET /api/generators
#[utoipa::path(
    get,
    path = "/api/generators",
    tag = "Generators",
    responses((status = 200, description = "Geradores com a capacidade calculada", body = Vec<GeneratorWithCapacity>)),
    security(("api_jwt" = []))
)]
pub async fn list_generators(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let generators = app_state
        .generator_service
        .list(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(generators)))
}

// POST /api/generators
#[utoipa::path(
    post,
    path = "/api/generators",
    tag = "Generators",
    request_body = CreateGeneratorPayload,
    responses(
        (status = 201, description = "Gerador criado", body = Generator),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CPF/CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_generator(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Json(payload): Json<CreateGeneratorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let generator = app_state
        .generator_service
        .create(&app_state.db_pool, payload.into(), access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(generator)))
}

// GET /api/generators/{id}
#[utoipa::path(
    get,
    path = "/api/generators/{id}",
    tag = "Generators",
    responses(
        (status = 200, description = "Gerador com consumidores e capacidade", body = GeneratorDetail),
        (status = 404, description = "Gerador não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Gerador")),
    security(("api_jwt" = []))
)]
pub async fn get_generator(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .generator_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/generators/{id}
#[utoipa::path(
    put,
    path = "/api/generators/{id}",
    tag = "Generators",
    request_body = UpdateGeneratorPayload,
    responses(
        (status = 200, body = Generator),
        (status = 404, description = "Gerador não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Gerador")),
    security(("api_jwt" = []))
)]
pub async fn update_generator(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<ManagerAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGeneratorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let generator = app_state
        .generator_service
        .update(&app_state.db_pool, id, payload.into(), access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(generator)))
}

// DELETE /api/generators/{id}
#[utoipa::path(
    delete,
    path = "/api/generators/{id}",
    tag = "Generators",
    responses(
        (status = 204, description = "Gerador removido"),
        (status = 409, description = "Gerador ainda tem consumidores")
    ),
    params(("id" = Uuid, Path, description = "ID do Gerador")),
    security(("api_jwt" = []))
)]
pub async fn delete_generator(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .allocation_service
        .remove_generator(&app_state.db_pool, id, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/generators/{id}/capacity
#[utoipa::path(
    get,
    path = "/api/generators/{id}/capacity",
    tag = "Generators",
    responses((status = 200, body = CapacityView)),
    params(("id" = Uuid, Path, description = "ID do Gerador")),
    security(("api_jwt" = []))
)]
pub async fn get_capacity(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let capacity = app_state
        .allocation_service
        .capacity_view(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(capacity)))
}
