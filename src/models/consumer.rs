// src/models/consumer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::{error::AppError, numeric::fits_numeric};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "consumer_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerType {
    Residential,
    Commercial,
    Industrial,
    Rural,
    PublicPower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "consumer_phase", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerPhase {
    Monophasic,
    Biphasic,
    Triphasic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "consumer_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerStatus {
    Available,
    Allocated,
    InProcess,
    Converted,
}

// Compartilhado entre consumidores e solicitações de alteração
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

// --- CONSUMIDOR ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub id: Uuid,

    #[schema(example = "123.456.789-00")]
    pub cpf_cnpj: String,

    #[schema(example = "Padaria Pão Quente")]
    pub name: String,

    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "Belo Horizonte")]
    pub city: String,
    #[schema(example = "MG")]
    pub state: String,

    pub concessionaire: Option<String>,
    pub uc_number: Option<String>,

    pub consumer_type: ConsumerType,
    pub phase: ConsumerPhase,

    // kWh/mês
    #[schema(value_type = f64, example = 1200.0)]
    pub average_monthly_consumption: Decimal,

    // 0 a 100 (%)
    #[schema(value_type = f64, example = 15.0)]
    pub discount_offered: Decimal,

    pub status: ConsumerStatus,

    // Preenchido somente quando status = ALLOCATED
    #[schema(value_type = Option<f64>, example = 25.0)]
    pub allocated_percentage: Option<Decimal>,

    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by_user_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,

    pub generator_id: Option<Uuid>,
    pub representative_id: Option<Uuid>,
    pub submitted_by_representative_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consumer {
    pub fn is_allocated(&self) -> bool {
        self.status == ConsumerStatus::Allocated
    }
}

/// Dados de cadastro de um consumidor (vindos do admin ou de um representante)
#[derive(Debug, Clone)]
pub struct NewConsumer {
    pub cpf_cnpj: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    pub concessionaire: Option<String>,
    pub uc_number: Option<String>,
    pub consumer_type: ConsumerType,
    pub phase: ConsumerPhase,
    pub average_monthly_consumption: Decimal,
    pub discount_offered: Decimal,
    pub generator_id: Option<Uuid>,
    // Só o admin escolhe o representante; na submissão do representante é ele mesmo
    pub representative_id: Option<Uuid>,
}

impl NewConsumer {
    pub fn check_ranges(&self) -> Result<(), AppError> {
        check_consumption(self.average_monthly_consumption)?;
        check_discount(self.discount_offered)
    }
}

// Colunas: consumo NUMERIC(14, 2), desconto NUMERIC(5, 2)
pub(crate) fn check_consumption(value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO || !fits_numeric(value, 14, 2) {
        return Err(AppError::InvalidInput("consumer.invalid_consumption"));
    }
    Ok(())
}

pub(crate) fn check_discount(value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED || !fits_numeric(value, 5, 2) {
        return Err(AppError::InvalidInput("consumer.invalid_discount"));
    }
    Ok(())
}

/// Filtros das listagens de consumidores (?state=MG&representativeId=...)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConsumerFilters {
    pub state: Option<String>,
    pub city: Option<String>,
    pub representative_id: Option<Uuid>,
    pub generator_id: Option<Uuid>,
    pub status: Option<ConsumerStatus>,
    pub approval_status: Option<ApprovalStatus>,
    // Busca por nome ou CPF/CNPJ
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_consumer(consumption: Decimal, discount: Decimal) -> NewConsumer {
        NewConsumer {
            cpf_cnpj: "123.456.789-00".into(),
            name: "Padaria".into(),
            email: None,
            phone: None,
            city: "Belo Horizonte".into(),
            state: "MG".into(),
            concessionaire: None,
            uc_number: None,
            consumer_type: ConsumerType::Commercial,
            phase: ConsumerPhase::Triphasic,
            average_monthly_consumption: consumption,
            discount_offered: discount,
            generator_id: None,
            representative_id: None,
        }
    }

    #[test]
    fn accepts_zero_consumption_and_full_discount() {
        assert!(new_consumer(Decimal::ZERO, Decimal::ONE_HUNDRED).check_ranges().is_ok());
    }

    #[test]
    fn rejects_negative_consumption() {
        let err = new_consumer(Decimal::new(-1, 0), Decimal::TEN).check_ranges().unwrap_err();
        assert_eq!(err.message_code(), "consumer.invalid_consumption");
    }

    #[test]
    fn rejects_discount_above_one_hundred() {
        let err = new_consumer(Decimal::TEN, Decimal::new(10001, 2)).check_ranges().unwrap_err();
        assert_eq!(err.message_code(), "consumer.invalid_discount");
    }

    #[test]
    fn consumption_is_not_rounded_into_another_tier() {
        // 1499.995 viraria 1500.00 no banco e mudaria a faixa da comissão
        let err = new_consumer("1499.995".parse().unwrap(), Decimal::TEN).check_ranges().unwrap_err();
        assert_eq!(err.message_code(), "consumer.invalid_consumption");

        assert!(new_consumer(Decimal::new(1_000_000_000_000, 0), Decimal::TEN).check_ranges().is_err());
        assert!(new_consumer("1499.99".parse().unwrap(), Decimal::TEN).check_ranges().is_ok());
    }

    #[test]
    fn discount_with_more_than_two_decimals_is_rejected() {
        let err = new_consumer(Decimal::TEN, "15.555".parse().unwrap()).check_ranges().unwrap_err();
        assert_eq!(err.message_code(), "consumer.invalid_discount");
    }
}
