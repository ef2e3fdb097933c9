// src/services/representative_service.rs

use bcrypt::hash;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::{AppError, Entity},
        numeric::fits_numeric,
    },
    db::RepresentativeRepository,
    models::{
        audit::AuditEntry,
        representative::{NewRepresentative, Representative, RepresentativeStatus},
    },
    services::audit_service::AuditService,
};

/// Taxa informativa em %, guardada em NUMERIC(5, 2).
pub fn check_commission_rate(rate: Decimal) -> Result<(), AppError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED || !fits_numeric(rate, 5, 2) {
        return Err(AppError::InvalidInput("representative.invalid_commission_rate"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RepresentativeService {
    repo: RepresentativeRepository,
    audit: AuditService,
}

impl RepresentativeService {
    pub fn new(repo: RepresentativeRepository, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        input: NewRepresentative,
        actor_id: Uuid,
    ) -> Result<Representative, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_commission_rate(input.commission_rate)?;

        // bcrypt é caro: roda fora do executor assíncrono
        let password = input.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let representative = self.repo.create(executor, &input, &password_hash).await?;

        tracing::info!(representative_id = %representative.id, "Representante cadastrado");
        self.audit.record(
            AuditEntry::new("CREATE_REPRESENTATIVE", "representative", Some(representative.id))
                .actor(Some(actor_id))
                .new_values(&representative),
        );

        Ok(representative)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Representative>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor).await
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Representative, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Representative))
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: RepresentativeStatus,
        actor_id: Uuid,
    ) -> Result<Representative, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Representative))?;

        let updated = self
            .repo
            .update_status(&mut *tx, id, status)
            .await?
            .ok_or(AppError::NotFound(Entity::Representative))?;

        tx.commit().await?;

        tracing::info!(representative_id = %id, "Status do representante: {:?} -> {:?}", current.status, updated.status);
        self.audit.record(
            AuditEntry::new("UPDATE_REPRESENTATIVE_STATUS", "representative", Some(id))
                .actor(Some(actor_id))
                .old(&json!({ "status": current.status }))
                .new_values(&json!({ "status": updated.status })),
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_rate_must_fit_the_column() {
        assert!(check_commission_rate(Decimal::ZERO).is_ok());
        assert!(check_commission_rate(Decimal::new(525, 2)).is_ok());
        assert!(check_commission_rate(Decimal::new(-1, 0)).is_err());
        assert!(check_commission_rate(Decimal::new(10001, 2)).is_err());
        assert_eq!(
            check_commission_rate("5.255".parse().unwrap()).unwrap_err().message_code(),
            "representative.invalid_commission_rate"
        );
    }
}
