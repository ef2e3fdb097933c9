// src/models/representative.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "representative_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepresentativeStatus {
    Active,
    Inactive,
    PendingApproval,
    Suspended,
}

// Representante vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Representative {
    pub id: Uuid,

    #[schema(example = "Joana Ribeiro")]
    pub name: String,

    #[schema(example = "joana@parceiros.com.br")]
    pub email: String,

    #[schema(example = "987.654.321-00")]
    pub cpf_cnpj: String,

    // Gravado no cadastro; o login dos representantes é feito por outro serviço
    #[allow(dead_code)]
    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub phone: Option<String>,

    pub status: RepresentativeStatus,

    // Informativo: o cálculo usa a tabela escalonada, não esta taxa
    #[schema(value_type = f64, example = 5.0)]
    pub commission_rate: Decimal,

    #[schema(example = json!(["SOLAR", "COMERCIAL"]))]
    pub specializations: Vec<String>,

    pub city: Option<String>,
    pub state: Option<String>,

    pub login_count: i32,
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Representative {
    pub fn is_active(&self) -> bool {
        self.status == RepresentativeStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewRepresentative {
    pub name: String,
    pub email: String,
    pub cpf_cnpj: String,
    pub password: String,
    pub phone: Option<String>,
    pub commission_rate: Decimal,
    pub specializations: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<RepresentativeStatus>,
}
