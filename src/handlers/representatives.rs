// src/handlers/representatives.rs

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
        rbac::{AdminAccess, RequireRole, StaffAccess},
    },
    models::representative::{NewRepresentative, Representative, RepresentativeStatus},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepresentativePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Carla Mendes")]
    pub name: String,

    #[validate(email(message = "E-mail inválido"))]
    #[schema(example = "carla@parceiros.com.br")]
    pub email: String,

    #[validate(length(min = 11, max = 18, message = "CPF/CNPJ inválido"))]
    pub cpf_cnpj: String,

    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres"))]
    pub password: String,

    pub phone: Option<String>,

    // Informativo; o cálculo usa as faixas de consumo
    #[schema(value_type = Option<f64>, example = 5.0)]
    pub commission_rate: Option<Decimal>,

    #[serde(default)]
    pub specializations: Vec<String>,

    pub city: Option<String>,

    #[validate(length(equal = 2, message = "Use a sigla do estado"))]
    pub state: Option<String>,

    // Padrão: PENDING_APPROVAL
    pub status: Option<RepresentativeStatus>,
}

impl From<CreateRepresentativePayload> for NewRepresentative {
    fn from(p: CreateRepresentativePayload) -> Self {
        NewRepresentative {
            name: p.name,
            email: p.email,
            cpf_cnpj: p.cpf_cnpj,
            password: p.password,
            phone: p.phone,
            commission_rate: p.commission_rate.unwrap_or(Decimal::ZERO),
            specializations: p.specializations,
            city: p.city,
            state: p.state,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRepresentativeStatusPayload {
    pub status: RepresentativeStatus,
}

// GET /api/representatives
#[utoipa::path(
    get,
    path = "/api/representatives",
    tag = "Representatives",
    responses((status = 200, body = Vec<Representative>)),
    security(("api_jwt" = []))
)]
pub async fn list_representatives(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let representatives = app_state
        .representative_service
        .list(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(representatives)))
}

// POST /api/representatives
#[utoipa::path(
    post,
    path = "/api/representatives",
    tag = "Representatives",
    request_body = CreateRepresentativePayload,
    responses(
        (status = 201, description = "Representante cadastrado", body = Representative),
        (status = 409, description = "E-mail ou CPF/CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_representative(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AdminAccess>,
    Json(payload): Json<CreateRepresentativePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let representative = app_state
        .representative_service
        .create(&app_state.db_pool, payload.into(), access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(representative)))
}

// GET /api/representatives/{id}
#[utoipa::path(
    get,
    path = "/api/representatives/{id}",
    tag = "Representatives",
    params(("id" = Uuid, Path, description = "ID do Representante")),
    responses(
        (status = 200, body = Representative),
        (status = 404, description = "Representante não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_representative(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let representative = app_state
        .representative_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(representative)))
}

// PATCH /api/representatives/{id}/status
#[utoipa::path(
    patch,
    path = "/api/representatives/{id}/status",
    tag = "Representatives",
    request_body = UpdateRepresentativeStatusPayload,
    params(("id" = Uuid, Path, description = "ID do Representante")),
    responses((status = 200, body = Representative)),
    security(("api_jwt" = []))
)]
pub async fn update_representative_status(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRepresentativeStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let representative = app_state
        .representative_service
        .update_status(&app_state.db_pool, id, payload.status, access.caller.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(representative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_password_is_rejected() {
        let payload: CreateRepresentativePayload = serde_json::from_value(json!({
            "name": "Carla Mendes",
            "email": "carla@parceiros.com.br",
            "cpfCnpj": "123.456.789-00",
            "password": "curta"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn optional_fields_get_defaults() {
        let payload: CreateRepresentativePayload = serde_json::from_value(json!({
            "name": "Carla Mendes",
            "email": "carla@parceiros.com.br",
            "cpfCnpj": "123.456.789-00",
            "password": "senha-forte-123"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());

        let input: NewRepresentative = payload.into();
        assert_eq!(input.commission_rate, Decimal::ZERO);
        assert!(input.specializations.is_empty());
        assert!(input.status.is_none());
    }
}
