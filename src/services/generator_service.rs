// src/services/generator_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::{AppError, Entity},
        numeric::fits_numeric,
    },
    db::{ConsumerRepository, GeneratorRepository},
    models::{
        audit::AuditEntry,
        consumer::Consumer,
        generator::{CapacityView, Generator, GeneratorDetail, GeneratorPatch, GeneratorWithCapacity, NewGenerator},
    },
    services::audit_service::AuditService,
};

// NUMERIC(14, 2)
pub fn check_installed_power(power: Decimal) -> Result<(), AppError> {
    if power < Decimal::ZERO || !fits_numeric(power, 14, 2) {
        return Err(AppError::InvalidInput("generator.invalid_power"));
    }
    Ok(())
}

/// Soma dos percentuais dos consumidores efetivamente alocados.
pub fn allocated_sum(consumers: &[Consumer]) -> Decimal {
    consumers
        .iter()
        .filter(|c| c.is_allocated())
        .filter_map(|c| c.allocated_percentage)
        .sum()
}

#[derive(Clone)]
pub struct GeneratorService {
    repo: GeneratorRepository,
    consumer_repo: ConsumerRepository,
    audit: AuditService,
}

impl GeneratorService {
    pub fn new(repo: GeneratorRepository, consumer_repo: ConsumerRepository, audit: AuditService) -> Self {
        Self { repo, consumer_repo, audit }
    }

    pub async fn create<'e, E>(&self, executor: E, input: NewGenerator, actor_id: Uuid) -> Result<Generator, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_installed_power(input.installed_power)?;

        let generator = self.repo.create(executor, &input).await?;

        tracing::info!(generator_id = %generator.id, "Gerador cadastrado");
        self.audit.record(
            AuditEntry::new("CREATE_GENERATOR", "generator", Some(generator.id))
                .actor(Some(actor_id))
                .new_values(&generator),
        );

        Ok(generator)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<GeneratorWithCapacity>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let generators = self.repo.list(&mut *conn).await?;
        let sums = self.consumer_repo.allocated_percentages(&mut *conn).await?;

        let items = generators
            .into_iter()
            .map(|generator| {
                let sum = sums.get(&generator.id).copied().unwrap_or(Decimal::ZERO);
                let capacity = CapacityView::compute(generator.installed_power, sum);
                GeneratorWithCapacity { generator, capacity }
            })
            .collect();

        Ok(items)
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<GeneratorDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let generator = self
            .repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Generator))?;

        let consumers = self.consumer_repo.list_by_generator(&mut *conn, id).await?;
        let capacity = CapacityView::compute(generator.installed_power, allocated_sum(&consumers));

        Ok(GeneratorDetail { generator, capacity, consumers })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: GeneratorPatch,
        actor_id: Uuid,
    ) -> Result<Generator, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if let Some(power) = patch.installed_power {
            check_installed_power(power)?;
        }

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Generator))?;

        let mut changed = current.clone();
        patch.apply(&mut changed);

        let updated = self.repo.update(&mut *tx, &changed).await?;
        tx.commit().await?;

        self.audit.record(
            AuditEntry::new("UPDATE_GENERATOR", "generator", Some(id))
                .actor(Some(actor_id))
                .old(&current)
                .new_values(&updated),
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{change_request::tests::consumer, consumer::ConsumerStatus};

    #[test]
    fn negative_power_is_rejected() {
        assert!(check_installed_power(Decimal::new(-1, 0)).is_err());
        assert!(check_installed_power(Decimal::ZERO).is_ok());
    }

    #[test]
    fn power_must_fit_the_column() {
        assert!(check_installed_power("25000.005".parse().unwrap()).is_err());
        assert!(check_installed_power(Decimal::new(1_000_000_000_000, 0)).is_err());
        assert!(check_installed_power("999999999999.99".parse().unwrap()).is_ok());
    }

    #[test]
    fn only_allocated_consumers_count_towards_capacity() {
        let mut allocated = consumer();
        allocated.status = ConsumerStatus::Allocated;
        allocated.allocated_percentage = Some(Decimal::new(30, 0));

        let mut other = consumer();
        other.status = ConsumerStatus::Allocated;
        other.allocated_percentage = Some(Decimal::new(125, 1));

        let available = consumer();

        assert_eq!(allocated_sum(&[allocated, other, available]), Decimal::new(425, 1));
    }
}
