// src/services/pricing_service.rs

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, numeric::fits_numeric},
    db::SettingsRepository,
    models::{
        audit::AuditEntry,
        settings::{SystemSetting, KWH_PRICE_KEY},
    },
    services::audit_service::AuditService,
};

/// R$ 0,90 por kWh quando nada foi configurado
pub fn default_kwh_price() -> Decimal {
    Decimal::new(90, 2)
}

/// Valor efetivo a partir da linha ativa (ou da ausência dela).
pub fn price_from_setting(setting: Option<&SystemSetting>) -> Decimal {
    let Some(setting) = setting else {
        return default_kwh_price();
    };

    // Fora de NUMERIC(10, 4) o valor não reproduziria o snapshot da comissão
    match Decimal::from_str(setting.value.trim()) {
        Ok(price) if validate_price(price).is_ok() => price,
        _ => {
            tracing::warn!(
                setting_id = %setting.id,
                "Valor de {} inválido ({:?}); usando o padrão",
                KWH_PRICE_KEY,
                setting.value
            );
            default_kwh_price()
        }
    }
}

/// Positivo e representável no snapshot da comissão (NUMERIC(10, 4)).
pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO || !fits_numeric(price, 10, 4) {
        return Err(AppError::InvalidInput("pricing.invalid_price"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PricingService {
    repo: SettingsRepository,
    audit: AuditService,
}

impl PricingService {
    pub fn new(repo: SettingsRepository, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    /// Lido do banco a cada chamada (sem cache): uma alteração vale para a próxima comissão.
    pub async fn get_current_price<'e, E>(&self, executor: E) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let setting = self.repo.find_active(executor, KWH_PRICE_KEY).await?;
        Ok(price_from_setting(setting.as_ref()))
    }

    pub async fn set_price<'e, E>(
        &self,
        executor: E,
        price: Decimal,
        actor_id: Option<Uuid>,
    ) -> Result<SystemSetting, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        validate_price(price)?;

        let mut tx = executor.begin().await?;

        let current = self.repo.find_active(&mut *tx, KWH_PRICE_KEY).await?;
        let old_value = current.as_ref().map(|s| s.value.clone());
        let value = price.normalize().to_string();

        let setting = match current {
            Some(active) => self.repo.update_value(&mut *tx, active.id, &value, actor_id).await?,
            None => {
                self.repo
                    .insert(
                        &mut *tx,
                        KWH_PRICE_KEY,
                        &value,
                        Some("Preço do kWh usado no cálculo de comissões"),
                        actor_id,
                    )
                    .await?
            }
        };

        tx.commit().await?;

        tracing::info!("Preço do kWh atualizado para {}", value);
        self.audit.record(
            AuditEntry::new("UPDATE_KWH_PRICE", "system_setting", Some(setting.id))
                .actor(actor_id)
                .old(&json!({ "value": old_value }))
                .new_values(&json!({ "value": setting.value })),
        );

        Ok(setting)
    }

    pub async fn get_price_history<'e, E>(&self, executor: E) -> Result<Vec<SystemSetting>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.history(executor, KWH_PRICE_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(value: &str) -> SystemSetting {
        SystemSetting {
            id: Uuid::new_v4(),
            key: KWH_PRICE_KEY.into(),
            value: value.into(),
            is_active: true,
            description: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn missing_setting_falls_back_to_default() {
        assert_eq!(price_from_setting(None), Decimal::new(90, 2));
    }

    #[test]
    fn stored_value_is_parsed() {
        assert_eq!(price_from_setting(Some(&setting("0.80"))), Decimal::new(80, 2));
        assert_eq!(price_from_setting(Some(&setting(" 1.05 "))), Decimal::new(105, 2));
    }

    #[test]
    fn unparseable_value_falls_back_to_default() {
        assert_eq!(price_from_setting(Some(&setting("abc"))), default_kwh_price());
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn prices_must_fit_the_commission_snapshot() {
        assert_eq!(
            validate_price("0.12345".parse().unwrap()).unwrap_err().message_code(),
            "pricing.invalid_price"
        );
        assert!(validate_price(Decimal::new(2_000_000, 0)).is_err());
        assert!(validate_price("999999.9999".parse().unwrap()).is_ok());
        assert!(validate_price("0.1234".parse().unwrap()).is_ok());
    }

    #[test]
    fn stored_value_that_does_not_fit_falls_back_to_default() {
        assert_eq!(price_from_setting(Some(&setting("0.12345"))), default_kwh_price());
        assert_eq!(price_from_setting(Some(&setting("-1"))), default_kwh_price());
    }
}
