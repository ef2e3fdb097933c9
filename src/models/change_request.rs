// src/models/change_request.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::consumer::{check_consumption, check_discount, Consumer, ConsumerPhase, ConsumerType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "change_request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerChangeRequest {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub representative_id: Uuid,

    // Só os campos alterados, não um snapshot completo
    #[schema(example = json!({"name": "Padaria Pão Quente"}))]
    pub old_values: Value,
    #[schema(example = json!({"name": "Padaria Pão Quente Ltda"}))]
    pub new_values: Value,
    #[schema(example = json!(["name"]))]
    pub changed_fields: Vec<String>,

    pub status: ChangeRequestStatus,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by_user_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestReview {
    pub change_request: ConsumerChangeRequest,
    pub consumer: Consumer,
}

// =========================================================================
//  CAMPOS EDITÁVEIS
// =========================================================================

/// Campos do consumidor que um representante pode pedir para alterar.
/// Campos desconhecidos são recusados na desserialização.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConsumerChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf_cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concessionaire: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_type: Option<ConsumerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ConsumerPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub average_monthly_consumption: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub discount_offered: Option<Decimal>,
}

/// Resultado da comparação: valores antigos e novos apenas dos campos que mudaram.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub old_values: ConsumerChanges,
    pub new_values: ConsumerChanges,
    pub changed_fields: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed_fields.is_empty()
    }
}

// Compara um campo proposto com o valor atual e registra a diferença
fn track<T: PartialEq + Clone>(
    field: &str,
    proposed: &Option<T>,
    current: Option<&T>,
    old_slot: &mut Option<T>,
    new_slot: &mut Option<T>,
    changed: &mut Vec<String>,
) {
    if let Some(value) = proposed {
        if current != Some(value) {
            *old_slot = current.cloned();
            *new_slot = Some(value.clone());
            changed.push(field.to_string());
        }
    }
}

impl ConsumerChanges {
    pub fn check_ranges(&self) -> Result<(), AppError> {
        if let Some(v) = self.average_monthly_consumption {
            check_consumption(v)?;
        }
        if let Some(v) = self.discount_offered {
            check_discount(v)?;
        }
        Ok(())
    }

    /// Compara cada campo informado com o registro atual.
    pub fn diff(&self, consumer: &Consumer) -> ChangeSet {
        let mut old = ConsumerChanges::default();
        let mut new = ConsumerChanges::default();
        let mut changed = Vec::new();

        track("cpfCnpj", &self.cpf_cnpj, Some(&consumer.cpf_cnpj), &mut old.cpf_cnpj, &mut new.cpf_cnpj, &mut changed);
        track("name", &self.name, Some(&consumer.name), &mut old.name, &mut new.name, &mut changed);
        track("email", &self.email, consumer.email.as_ref(), &mut old.email, &mut new.email, &mut changed);
        track("phone", &self.phone, consumer.phone.as_ref(), &mut old.phone, &mut new.phone, &mut changed);
        track("city", &self.city, Some(&consumer.city), &mut old.city, &mut new.city, &mut changed);
        track("state", &self.state, Some(&consumer.state), &mut old.state, &mut new.state, &mut changed);
        track("concessionaire", &self.concessionaire, consumer.concessionaire.as_ref(), &mut old.concessionaire, &mut new.concessionaire, &mut changed);
        track("ucNumber", &self.uc_number, consumer.uc_number.as_ref(), &mut old.uc_number, &mut new.uc_number, &mut changed);
        track("consumerType", &self.consumer_type, Some(&consumer.consumer_type), &mut old.consumer_type, &mut new.consumer_type, &mut changed);
        track("phase", &self.phase, Some(&consumer.phase), &mut old.phase, &mut new.phase, &mut changed);
        track(
            "averageMonthlyConsumption",
            &self.average_monthly_consumption,
            Some(&consumer.average_monthly_consumption),
            &mut old.average_monthly_consumption,
            &mut new.average_monthly_consumption,
            &mut changed,
        );
        track(
            "discountOffered",
            &self.discount_offered,
            Some(&consumer.discount_offered),
            &mut old.discount_offered,
            &mut new.discount_offered,
            &mut changed,
        );

        ChangeSet { old_values: old, new_values: new, changed_fields: changed }
    }

    /// Sobrescreve campo a campo; o que não foi informado fica intacto.
    pub fn apply(&self, consumer: &mut Consumer) {
        if let Some(v) = &self.cpf_cnpj { consumer.cpf_cnpj = v.clone(); }
        if let Some(v) = &self.name { consumer.name = v.clone(); }
        if let Some(v) = &self.email { consumer.email = Some(v.clone()); }
        if let Some(v) = &self.phone { consumer.phone = Some(v.clone()); }
        if let Some(v) = &self.city { consumer.city = v.clone(); }
        if let Some(v) = &self.state { consumer.state = v.clone(); }
        if let Some(v) = &self.concessionaire { consumer.concessionaire = Some(v.clone()); }
        if let Some(v) = &self.uc_number { consumer.uc_number = Some(v.clone()); }
        if let Some(v) = self.consumer_type { consumer.consumer_type = v; }
        if let Some(v) = self.phase { consumer.phase = v; }
        if let Some(v) = self.average_monthly_consumption { consumer.average_monthly_consumption = v; }
        if let Some(v) = self.discount_offered { consumer.discount_offered = v; }
    }
}
