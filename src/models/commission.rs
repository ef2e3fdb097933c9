// src/models/commission.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Calculated,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub const ALL: [CommissionStatus; 4] = [
        CommissionStatus::Pending,
        CommissionStatus::Calculated,
        CommissionStatus::Paid,
        CommissionStatus::Cancelled,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: Uuid,
    pub representative_id: Uuid,
    pub consumer_id: Uuid,

    // Snapshots no momento do cálculo: mudanças futuras de preço não afetam a comissão
    #[schema(value_type = f64, example = 1200.0)]
    pub kwh_consumption: Decimal,
    #[schema(value_type = f64, example = 0.8)]
    pub kwh_price: Decimal,

    #[schema(value_type = f64, example = 336.0)]
    pub commission_value: Decimal,

    pub status: CommissionStatus,
    pub calculated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Estatísticas do representante ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: CommissionStatus,
    pub count: i64,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    #[schema(example = "2025-03")]
    pub month: String,
    pub count: i64,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionStats {
    pub total_commissions: i64,
    #[schema(value_type = f64)]
    pub total_value: Decimal,
    #[schema(value_type = f64)]
    pub paid_value: Decimal,
    #[schema(value_type = f64)]
    pub pending_value: Decimal,
    pub by_status: Vec<StatusBucket>,
    // Últimos 6 meses, do mais antigo para o mais recente
    pub monthly: Vec<MonthlyBucket>,
}

/// Simulação do cálculo (sem persistir nada)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionQuote {
    #[schema(value_type = f64)]
    pub kwh_consumption: Decimal,
    #[schema(value_type = f64)]
    pub kwh_price: Decimal,
    #[schema(value_type = f64)]
    pub invoice_value: Decimal,
    #[schema(value_type = f64, example = 0.35)]
    pub rate: Decimal,
    #[schema(value_type = f64)]
    pub commission_value: Decimal,
}
