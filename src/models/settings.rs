// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const KWH_PRICE_KEY: &str = "KWH_PRICE";

/// Linha da tabela de configurações. Várias linhas por chave podem existir;
/// vale a mais recente com `is_active = true`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
    pub id: Uuid,

    #[schema(example = "KWH_PRICE")]
    pub key: String,

    // Sempre texto; quem lê converte
    #[schema(example = "0.90")]
    pub value: String,

    pub is_active: bool,

    #[schema(example = "Preço do kWh usado no cálculo de comissões")]
    pub description: Option<String>,

    pub updated_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
