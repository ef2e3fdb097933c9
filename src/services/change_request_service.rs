// src/services/change_request_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::{AppError, Entity},
        pagination::{PageParams, Paginated},
    },
    db::{ChangeRequestRepository, ConsumerRepository},
    models::{
        audit::AuditEntry,
        change_request::{ChangeRequestReview, ChangeRequestStatus, ConsumerChangeRequest, ConsumerChanges},
        consumer::Consumer,
    },
    services::{approval_service::required_reason, audit_service::AuditService},
};

/// Só o representante dono do consumidor pode pedir alterações.
pub fn ensure_owner(consumer: &Consumer, representative_id: Uuid) -> Result<(), AppError> {
    if consumer.representative_id != Some(representative_id) {
        return Err(AppError::Forbidden("change_request.not_owner"));
    }
    Ok(())
}

pub fn ensure_pending(request: &ConsumerChangeRequest) -> Result<(), AppError> {
    if request.status != ChangeRequestStatus::Pending {
        return Err(AppError::InvalidState("change_request.already_reviewed"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ChangeRequestService {
    repo: ChangeRequestRepository,
    consumer_repo: ConsumerRepository,
    audit: AuditService,
}

impl ChangeRequestService {
    pub fn new(repo: ChangeRequestRepository, consumer_repo: ConsumerRepository, audit: AuditService) -> Self {
        Self { repo, consumer_repo, audit }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        representative_id: Uuid,
        changes: ConsumerChanges,
    ) -> Result<ConsumerChangeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        changes.check_ranges()?;

        let mut conn = executor.acquire().await?;

        let consumer = self
            .consumer_repo
            .find_by_id(&mut *conn, consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))?;

        ensure_owner(&consumer, representative_id)?;

        let change_set = changes.diff(&consumer);
        if change_set.is_empty() {
            return Err(AppError::InvalidInput("change_request.no_changes"));
        }

        let request = self
            .repo
            .create(&mut *conn, consumer_id, representative_id, &change_set)
            .await?;

        tracing::info!(
            change_request_id = %request.id,
            consumer_id = %consumer_id,
            "Solicitação de alteração criada: {:?}",
            request.changed_fields
        );
        self.audit.record(
            AuditEntry::new("CREATE_CHANGE_REQUEST", "consumer_change_request", Some(request.id))
                .actor(Some(representative_id))
                .new_values(&request),
        );

        Ok(request)
    }

    /// Aplica os novos valores e fecha a solicitação na mesma transação.
    pub async fn approve<'e, E>(&self, executor: E, id: Uuid, admin_id: Uuid) -> Result<ChangeRequestReview, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let request = self
            .repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Entity::ChangeRequest))?;

        ensure_pending(&request)?;

        let mut consumer = self
            .consumer_repo
            .lock_by_id(&mut *tx, request.consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))?;

        let changes: ConsumerChanges = serde_json::from_value(request.new_values.clone())
            .map_err(|e| anyhow::anyhow!("new_values inválido na solicitação {}: {}", id, e))?;
        changes.apply(&mut consumer);

        let consumer = self.consumer_repo.update_details(&mut *tx, &consumer).await?;

        let change_request = self
            .repo
            .review(&mut *tx, id, ChangeRequestStatus::Approved, admin_id, None)
            .await?
            .ok_or(AppError::InvalidState("change_request.already_reviewed"))?;

        tx.commit().await?;

        tracing::info!(change_request_id = %id, consumer_id = %consumer.id, "Solicitação de alteração aprovada");
        self.audit.record(
            AuditEntry::new("APPROVE_CHANGE_REQUEST", "consumer_change_request", Some(id))
                .actor(Some(admin_id))
                .old(&change_request.old_values)
                .new_values(&change_request.new_values),
        );

        Ok(ChangeRequestReview { change_request, consumer })
    }

    pub async fn reject<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> Result<ConsumerChangeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let reason = required_reason(reason, "change_request.reason_required")?;

        let mut conn = executor.acquire().await?;

        let rejected = match self
            .repo
            .review(&mut *conn, id, ChangeRequestStatus::Rejected, admin_id, Some(reason))
            .await?
        {
            Some(request) => request,
            None => {
                return Err(match self.repo.find_by_id(&mut *conn, id).await? {
                    None => AppError::NotFound(Entity::ChangeRequest),
                    Some(_) => AppError::InvalidState("change_request.already_reviewed"),
                });
            }
        };

        tracing::info!(change_request_id = %id, "Solicitação de alteração rejeitada");
        self.audit.record(
            AuditEntry::new("REJECT_CHANGE_REQUEST", "consumer_change_request", Some(id))
                .actor(Some(admin_id))
                .metadata(serde_json::json!({ "reason": reason })),
        );

        Ok(rejected)
    }

    pub async fn list_pending(&self, page: PageParams) -> Result<Paginated<ConsumerChangeRequest>, AppError> {
        let (items, total) = self.repo.list_pending_page(&page).await?;
        Ok(Paginated::new(items, &page, total))
    }

    pub async fn list_for_representative<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
    ) -> Result<Vec<ConsumerChangeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_for_representative(executor, representative_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::fixtures,
        models::{change_request::tests::consumer, consumer::ApprovalStatus, representative::RepresentativeStatus},
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    fn request(status: ChangeRequestStatus) -> ConsumerChangeRequest {
        ConsumerChangeRequest {
            id: Uuid::new_v4(),
            consumer_id: Uuid::new_v4(),
            representative_id: Uuid::new_v4(),
            old_values: json!({"name": "Padaria Pão Quente"}),
            new_values: json!({"name": "X"}),
            changed_fields: vec!["name".into()],
            status,
            requested_at: Utc::now(),
            reviewed_by_user_id: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn other_representatives_are_forbidden() {
        let c = consumer();
        let owner = c.representative_id.unwrap();

        assert!(ensure_owner(&c, owner).is_ok());
        assert_eq!(ensure_owner(&c, Uuid::new_v4()).unwrap_err().kind(), "FORBIDDEN");
    }

    #[test]
    fn unowned_consumer_is_forbidden_for_everyone() {
        let mut c = consumer();
        c.representative_id = None;
        assert!(ensure_owner(&c, Uuid::new_v4()).is_err());
    }

    #[test]
    fn reviewed_requests_are_terminal() {
        assert!(ensure_pending(&request(ChangeRequestStatus::Pending)).is_ok());
        assert!(ensure_pending(&request(ChangeRequestStatus::Approved)).is_err());
        assert!(ensure_pending(&request(ChangeRequestStatus::Rejected)).is_err());
    }

    #[test]
    fn stored_new_values_apply_only_the_requested_field() {
        let stored = request(ChangeRequestStatus::Pending);
        let before = consumer();
        let mut after = before.clone();

        let changes: ConsumerChanges = serde_json::from_value(stored.new_values).unwrap();
        changes.apply(&mut after);

        assert_eq!(after.name, "X");
        assert_eq!(after.email, before.email);
        assert_eq!(after.average_monthly_consumption, before.average_monthly_consumption);
        assert_eq!(after.approval_status, before.approval_status);
    }

    // --- Contra o banco ---

    #[sqlx::test(migrations = "./migrations")]
    async fn identical_values_create_no_request(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), Decimal::new(1200, 0), ApprovalStatus::Approved).await;

        let changes = ConsumerChanges {
            name: Some(c.name.clone()),
            average_monthly_consumption: Some(Decimal::new(120000, 2)),
            ..Default::default()
        };
        let err = state.change_request_service.create(&pool, c.id, rep.id, changes).await.unwrap_err();

        assert_eq!(err.kind(), "INVALID_INPUT");
        assert_eq!(err.message_code(), "change_request.no_changes");
        assert_eq!(fixtures::count(&pool, "consumer_change_requests").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_owner_can_request_changes(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let owner = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let other = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(owner.id), Decimal::new(1200, 0), ApprovalStatus::Approved).await;

        let changes = ConsumerChanges { name: Some("Outro nome".into()), ..Default::default() };
        let err = state.change_request_service.create(&pool, c.id, other.id, changes).await.unwrap_err();

        assert_eq!(err.kind(), "FORBIDDEN");
        assert_eq!(fixtures::count(&pool, "consumer_change_requests").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn approval_applies_the_changes_and_closes_the_request(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), Decimal::new(1200, 0), ApprovalStatus::Approved).await;
        let admin = Uuid::new_v4();

        let changes = ConsumerChanges {
            name: Some("Padaria Pão Quente Ltda".into()),
            discount_offered: Some(Decimal::new(20, 0)),
            ..Default::default()
        };
        let request = state
            .change_request_service
            .create(&pool, c.id, rep.id, changes)
            .await
            .expect("solicitação");
        assert_eq!(request.changed_fields, vec!["name".to_string(), "discountOffered".to_string()]);
        assert_eq!(request.old_values["name"], "Padaria Pão Quente");

        let review = state.change_request_service.approve(&pool, request.id, admin).await.expect("aprovação");

        assert_eq!(review.change_request.status, ChangeRequestStatus::Approved);
        assert_eq!(review.change_request.reviewed_by_user_id, Some(admin));
        assert_eq!(review.consumer.name, "Padaria Pão Quente Ltda");
        assert_eq!(review.consumer.discount_offered, Decimal::new(20, 0));
        assert_eq!(review.consumer.city, c.city);
        assert_eq!(review.consumer.average_monthly_consumption, c.average_monthly_consumption);

        let reloaded = state.approval_service.get_consumer(&pool, c.id).await.expect("consumidor");
        assert_eq!(reloaded.name, "Padaria Pão Quente Ltda");

        let again = state.change_request_service.approve(&pool, request.id, admin).await.unwrap_err();
        assert_eq!(again.message_code(), "change_request.already_reviewed");
        let reject = state
            .change_request_service
            .reject(&pool, request.id, admin, "tarde demais")
            .await
            .unwrap_err();
        assert_eq!(reject.message_code(), "change_request.already_reviewed");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rejection_leaves_the_consumer_untouched(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), Decimal::new(1200, 0), ApprovalStatus::Approved).await;

        let changes = ConsumerChanges { city: Some("Contagem".into()), ..Default::default() };
        let request = state
            .change_request_service
            .create(&pool, c.id, rep.id, changes)
            .await
            .expect("solicitação");

        let rejected = state
            .change_request_service
            .reject(&pool, request.id, Uuid::new_v4(), "Comprovante ausente")
            .await
            .expect("rejeição");
        assert_eq!(rejected.status, ChangeRequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Comprovante ausente"));

        let reloaded = state.approval_service.get_consumer(&pool, c.id).await.expect("consumidor");
        assert_eq!(reloaded.city, "Belo Horizonte");
    }
}
