// src/models/generator.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::consumer::Consumer;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "source_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Solar,
    Hydro,
    Biomass,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "generator_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneratorStatus {
    UnderAnalysis,
    AwaitingAllocation,
    Active,
    Inactive,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub id: Uuid,

    #[schema(example = "Fazenda Sol Nascente Ltda")]
    pub owner_name: String,

    #[schema(example = "12.345.678/0001-99")]
    pub cpf_cnpj: String,

    pub source_type: SourceType,

    // Capacidade em kWh
    #[schema(value_type = f64, example = 25000.0)]
    pub installed_power: Decimal,

    #[schema(example = "CEMIG")]
    pub concessionaire: String,

    #[schema(example = "3004123456")]
    pub uc_number: String,

    #[schema(example = "Uberlândia")]
    pub city: String,

    #[schema(example = "MG")]
    pub state: String,

    pub status: GeneratorStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados para cadastrar um gerador
#[derive(Debug, Clone)]
pub struct NewGenerator {
    pub owner_name: String,
    pub cpf_cnpj: String,
    pub source_type: SourceType,
    pub installed_power: Decimal,
    pub concessionaire: String,
    pub uc_number: String,
    pub city: String,
    pub state: String,
    pub status: Option<GeneratorStatus>,
}

/// Atualização parcial: campos ausentes permanecem como estão
#[derive(Debug, Clone, Default)]
pub struct GeneratorPatch {
    pub owner_name: Option<String>,
    pub source_type: Option<SourceType>,
    pub installed_power: Option<Decimal>,
    pub concessionaire: Option<String>,
    pub uc_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<GeneratorStatus>,
}

impl GeneratorPatch {
    pub fn apply(self, generator: &mut Generator) {
        if let Some(v) = self.owner_name { generator.owner_name = v; }
        if let Some(v) = self.source_type { generator.source_type = v; }
        if let Some(v) = self.installed_power { generator.installed_power = v; }
        if let Some(v) = self.concessionaire { generator.concessionaire = v; }
        if let Some(v) = self.uc_number { generator.uc_number = v; }
        if let Some(v) = self.city { generator.city = v; }
        if let Some(v) = self.state { generator.state = v; }
        if let Some(v) = self.status { generator.status = v; }
    }
}

/// Visão derivada da capacidade. Recalculada a cada leitura, nunca persistida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityView {
    #[schema(value_type = f64, example = 60.0)]
    pub allocated_percentage: Decimal,
    #[schema(value_type = f64, example = 40.0)]
    pub available_percentage: Decimal,
    #[schema(value_type = f64, example = 15000.0)]
    pub allocated_capacity: Decimal,
    #[schema(value_type = f64, example = 10000.0)]
    pub available_capacity: Decimal,
}

impl CapacityView {
    /// `allocated_sum` é a soma dos percentuais dos consumidores alocados.
    /// Somas acima de 100 (dados antigos) são limitadas a 100 na parte percentual.
    pub fn compute(installed_power: Decimal, allocated_sum: Decimal) -> Self {
        let hundred = Decimal::ONE_HUNDRED;
        let clamped = allocated_sum.max(Decimal::ZERO).min(hundred);
        let allocated_capacity = installed_power * allocated_sum.max(Decimal::ZERO) / hundred;

        Self {
            allocated_percentage: clamped,
            available_percentage: hundred - clamped,
            allocated_capacity,
            available_capacity: (installed_power - allocated_capacity).max(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorWithCapacity {
    #[serde(flatten)]
    pub generator: Generator,
    pub capacity: CapacityView,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorDetail {
    #[serde(flatten)]
    pub generator: Generator,
    pub capacity: CapacityView,
    pub consumers: Vec<Consumer>,
}
