// src/services/allocation_service.rs

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
        consumer::{ApprovalStatus, Consumer},
        generator::{CapacityView, Generator},
    },
    services::audit_service::AuditService,
};

/// Percentual precisa estar em (0, 100], com no máximo 2 casas (NUMERIC(5, 2)).
pub fn validate_percentage(percentage: Decimal) -> Result<(), AppError> {
    if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED || !fits_numeric(percentage, 5, 2) {
        return Err(AppError::InvalidInput("allocation.invalid_percentage"));
    }
    Ok(())
}

pub fn ensure_allocatable(consumer: &Consumer) -> Result<(), AppError> {
    if consumer.is_allocated() {
        return Err(AppError::Conflict("allocation.already_allocated"));
    }
    if consumer.approval_status != ApprovalStatus::Approved {
        return Err(AppError::InvalidState("allocation.consumer_not_approved"));
    }
    Ok(())
}

/// A soma no gerador não pode passar de 100%.
pub fn ensure_headroom(allocated_sum: Decimal, percentage: Decimal) -> Result<(), AppError> {
    if allocated_sum + percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::Conflict("allocation.capacity_exceeded"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AllocationService {
    generator_repo: GeneratorRepository,
    consumer_repo: ConsumerRepository,
    audit: AuditService,
    enforce_headroom: bool,
}

impl AllocationService {
    pub fn new(
        generator_repo: GeneratorRepository,
        consumer_repo: ConsumerRepository,
        audit: AuditService,
        enforce_headroom: bool,
    ) -> Self {
        Self { generator_repo, consumer_repo, audit, enforce_headroom }
    }

    pub async fn allocate<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        generator_id: Uuid,
        percentage: Decimal,
        actor_id: Uuid,
    ) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        validate_percentage(percentage)?;

        let mut tx = executor.begin().await?;

        let consumer = self
            .consumer_repo
            .lock_by_id(&mut *tx, consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))?;

        // Trava o gerador: a checagem de sobra e o UPDATE ficam atômicos
        let generator = self
            .generator_repo
            .lock_by_id(&mut *tx, generator_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Generator))?;

        ensure_allocatable(&consumer)?;

        if self.enforce_headroom {
            let allocated_sum = self.consumer_repo.sum_allocated_percentage(&mut *tx, generator.id).await?;
            ensure_headroom(allocated_sum, percentage)?;
        }

        let allocated = self
            .consumer_repo
            .set_allocation(&mut *tx, consumer_id, generator.id, percentage)
            .await?;

        tx.commit().await?;

        tracing::info!(
            consumer_id = %consumer_id,
            generator_id = %generator.id,
            "Consumidor alocado com {}%",
            percentage
        );
        self.audit.record(
            AuditEntry::new("ALLOCATE_CONSUMER", "consumer", Some(consumer_id))
                .actor(Some(actor_id))
                .old(&consumer)
                .new_values(&allocated),
        );

        Ok(allocated)
    }

    /// Idempotente: desalocar um consumidor já livre só regrava o mesmo estado.
    pub async fn deallocate<'e, E>(&self, executor: E, consumer_id: Uuid, actor_id: Uuid) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = self
            .consumer_repo
            .clear_allocation(executor, consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))?;

        tracing::info!(consumer_id = %consumer_id, "Consumidor desalocado");
        self.audit.record(
            AuditEntry::new("DEALLOCATE_CONSUMER", "consumer", Some(consumer_id))
                .actor(Some(actor_id))
                .new_values(&consumer),
        );

        Ok(consumer)
    }

    pub async fn capacity_view<'e, E>(&self, executor: E, generator_id: Uuid) -> Result<CapacityView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let generator = self
            .generator_repo
            .find_by_id(&mut *conn, generator_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Generator))?;

        let allocated_sum = self.consumer_repo.sum_allocated_percentage(&mut *conn, generator_id).await?;

        Ok(CapacityView::compute(generator.installed_power, allocated_sum))
    }

    /// Remove o gerador se nenhum consumidor (em qualquer status) estiver vinculado.
    pub async fn remove_generator<'e, E>(&self, executor: E, generator_id: Uuid, actor_id: Uuid) -> Result<Generator, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let generator = self
            .generator_repo
            .lock_by_id(&mut *tx, generator_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Generator))?;

        let linked = self.consumer_repo.count_by_generator(&mut *tx, generator_id).await?;
        if linked > 0 {
            return Err(AppError::Conflict("generator.has_consumers"));
        }

        self.generator_repo.delete(&mut *tx, generator_id).await?;
        tx.commit().await?;

        tracing::info!(generator_id = %generator_id, "Gerador removido");
        self.audit.record(
            AuditEntry::new("DELETE_GENERATOR", "generator", Some(generator_id))
                .actor(Some(actor_id))
                .old(&generator),
        );

        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::fixtures,
        models::{change_request::tests::consumer, consumer::ConsumerStatus},
    };
    use sqlx::PgPool;

    fn d(value: &str) -> Decimal {
        value.parse().expect("decimal válido")
    }

    #[test]
    fn percentage_must_be_in_range() {
        assert!(validate_percentage(d("0")).is_err());
        assert!(validate_percentage(d("-5")).is_err());
        assert!(validate_percentage(d("100.01")).is_err());
        assert!(validate_percentage(d("0.01")).is_ok());
        assert!(validate_percentage(d("100")).is_ok());
    }

    #[test]
    fn percentage_with_more_than_two_decimals_is_rejected() {
        assert_eq!(
            validate_percentage(d("0.001")).unwrap_err().message_code(),
            "allocation.invalid_percentage"
        );
        assert!(validate_percentage(d("12.345")).is_err());
        assert!(validate_percentage(d("12.350")).is_ok());
    }

    #[test]
    fn allocated_consumer_is_a_conflict() {
        let mut c = consumer();
        c.status = ConsumerStatus::Allocated;
        c.allocated_percentage = Some(d("25"));
        c.generator_id = Some(Uuid::new_v4());

        let err = ensure_allocatable(&c).unwrap_err();
        assert_eq!(err.kind(), "CONFLICT");
        assert_eq!(err.message_code(), "allocation.already_allocated");
    }

    #[test]
    fn pending_consumer_cannot_be_allocated() {
        let mut c = consumer();
        c.approval_status = ApprovalStatus::Pending;

        let err = ensure_allocatable(&c).unwrap_err();
        assert_eq!(err.kind(), "INVALID_STATE");
    }

    #[test]
    fn approved_available_consumer_is_allocatable() {
        assert!(ensure_allocatable(&consumer()).is_ok());
    }

    #[test]
    fn headroom_allows_exactly_one_hundred() {
        assert!(ensure_headroom(d("75"), d("25")).is_ok());
        assert_eq!(
            ensure_headroom(d("75"), d("25.01")).unwrap_err().message_code(),
            "allocation.capacity_exceeded"
        );
    }

    // --- Contra o banco ---

    #[sqlx::test(migrations = "./migrations")]
    async fn deallocating_twice_leaves_the_consumer_available(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let generator = fixtures::generator(&pool).await;
        let c = fixtures::consumer(&pool, None, d("800"), ApprovalStatus::Approved).await;
        let actor = Uuid::new_v4();

        let allocated = state
            .allocation_service
            .allocate(&pool, c.id, generator.id, d("25"), actor)
            .await
            .expect("alocação");
        assert_eq!(allocated.status, ConsumerStatus::Allocated);
        assert_eq!(allocated.allocated_percentage, Some(d("25")));
        assert_eq!(allocated.generator_id, Some(generator.id));

        let first = state.allocation_service.deallocate(&pool, c.id, actor).await.expect("desalocação");
        let second = state.allocation_service.deallocate(&pool, c.id, actor).await.expect("desalocação repetida");

        for released in [first, second] {
            assert_eq!(released.status, ConsumerStatus::Available);
            assert_eq!(released.allocated_percentage, None);
            assert_eq!(released.generator_id, None);
        }

        let view = state.allocation_service.capacity_view(&pool, generator.id).await.expect("capacidade");
        assert_eq!(view.allocated_percentage, Decimal::ZERO);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn percentages_are_stored_exactly_or_refused(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let generator = fixtures::generator(&pool).await;
        let c = fixtures::consumer(&pool, None, d("800"), ApprovalStatus::Approved).await;
        let actor = Uuid::new_v4();

        for refused in ["0.001", "12.345"] {
            let err = state
                .allocation_service
                .allocate(&pool, c.id, generator.id, d(refused), actor)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "INVALID_INPUT");
            assert_eq!(err.message_code(), "allocation.invalid_percentage");
        }

        let untouched = state.approval_service.get_consumer(&pool, c.id).await.expect("consumidor");
        assert_eq!(untouched.status, ConsumerStatus::Available);

        let allocated = state
            .allocation_service
            .allocate(&pool, c.id, generator.id, d("12.34"), actor)
            .await
            .expect("alocação");
        assert_eq!(allocated.allocated_percentage, Some(d("12.34")));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn generator_never_passes_one_hundred_percent(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let generator = fixtures::generator(&pool).await;
        let first = fixtures::consumer(&pool, None, d("800"), ApprovalStatus::Approved).await;
        let second = fixtures::consumer(&pool, None, d("900"), ApprovalStatus::Approved).await;
        let actor = Uuid::new_v4();

        state
            .allocation_service
            .allocate(&pool, first.id, generator.id, d("60"), actor)
            .await
            .expect("primeira alocação");

        let err = state
            .allocation_service
            .allocate(&pool, second.id, generator.id, d("40.01"), actor)
            .await
            .unwrap_err();
        assert_eq!(err.message_code(), "allocation.capacity_exceeded");

        state
            .allocation_service
            .allocate(&pool, second.id, generator.id, d("40"), actor)
            .await
            .expect("segunda alocação");

        let view = state.allocation_service.capacity_view(&pool, generator.id).await.expect("capacidade");
        assert_eq!(view.allocated_percentage, d("100"));
        assert_eq!(view.available_capacity, Decimal::ZERO);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn generator_with_consumers_cannot_be_removed(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let generator = fixtures::generator(&pool).await;
        let c = fixtures::consumer(&pool, None, d("800"), ApprovalStatus::Approved).await;
        let actor = Uuid::new_v4();

        state
            .allocation_service
            .allocate(&pool, c.id, generator.id, d("10"), actor)
            .await
            .expect("alocação");

        let err = state.allocation_service.remove_generator(&pool, generator.id, actor).await.unwrap_err();
        assert_eq!(err.message_code(), "generator.has_consumers");
        assert_eq!(fixtures::count(&pool, "generators").await, 1);

        state.allocation_service.deallocate(&pool, c.id, actor).await.expect("desalocação");
        state.allocation_service.remove_generator(&pool, generator.id, actor).await.expect("remoção");
        assert_eq!(fixtures::count(&pool, "generators").await, 0);
    }
}
