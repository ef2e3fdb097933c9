// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminAccess, RequireRole, StaffAccess},
    },
    models::settings::SystemSetting,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KwhPriceResponse {
    #[schema(value_type = f64, example = 0.9)]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKwhPricePayload {
    #[schema(value_type = f64, example = 0.95)]
    pub price: Decimal,
}

// GET /api/settings/kwh-price
#[utoipa::path(
    get,
    path = "/api/settings/kwh-price",
    tag = "Settings",
    responses(
        (status = 200, description = "Preço vigente do kWh", body = KwhPriceResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_kwh_price(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let price = app_state
        .pricing_service
        .get_current_price(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(KwhPriceResponse { price })))
}

// PUT /api/settings/kwh-price
#[utoipa::path(
    put,
    path = "/api/settings/kwh-price",
    tag = "Settings",
    request_body = UpdateKwhPricePayload,
    responses(
        (status = 200, description = "Preço atualizado", body = SystemSetting),
        (status = 400, description = "Preço menor ou igual a zero")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_kwh_price(
    State(app_state): State<AppState>,
    locale: Locale,
    access: RequireRole<AdminAccess>,
    Json(payload): Json<UpdateKwhPricePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let setting = app_state
        .pricing_service
        .set_price(&app_state.db_pool, payload.price, Some(access.caller.id))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(setting)))
}

// GET /api/settings/kwh-price/history
#[utoipa::path(
    get,
    path = "/api/settings/kwh-price/history",
    tag = "Settings",
    responses(
        (status = 200, description = "Histórico do preço, mais recente primeiro", body = Vec<SystemSetting>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_kwh_price_history(
    State(app_state): State<AppState>,
    locale: Locale,
    _access: RequireRole<StaffAccess>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .pricing_service
        .get_price_history(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}
