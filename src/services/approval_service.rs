// src/services/approval_service.rs

use serde::Serialize;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{
        error::{AppError, Entity},
        pagination::{PageParams, Paginated},
    },
    db::{ConsumerRepository, GeneratorRepository, RepresentativeRepository},
    models::{
        audit::AuditEntry,
        commission::Commission,
        consumer::{ApprovalStatus, Consumer, ConsumerFilters, NewConsumer},
        representative::Representative,
    },
    services::{audit_service::AuditService, commission_service::CommissionService},
};

/// Resultado da aprovação pela API: o consumidor e, se houver representante, a comissão gerada.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub consumer: Consumer,
    pub commission: Option<Commission>,
}

pub fn ensure_active(representative: &Representative) -> Result<(), AppError> {
    if !representative.is_active() {
        return Err(AppError::InvalidState("approval.representative_inactive"));
    }
    Ok(())
}

/// Texto obrigatório (motivo de rejeição). Devolve a versão sem espaços nas pontas.
pub fn required_reason<'a>(reason: &'a str, code: &'static str) -> Result<&'a str, AppError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(code));
    }
    Ok(trimmed)
}

/// O UPDATE condicional não achou linha: ou o consumidor não existe, ou já foi revisado.
fn review_miss(existing: Option<Consumer>) -> AppError {
    match existing {
        None => AppError::NotFound(Entity::Consumer),
        Some(_) => AppError::InvalidState("approval.already_reviewed"),
    }
}

#[derive(Clone)]
pub struct ApprovalService {
    consumer_repo: ConsumerRepository,
    representative_repo: RepresentativeRepository,
    generator_repo: GeneratorRepository,
    commission_service: CommissionService,
    audit: AuditService,
}

impl ApprovalService {
    pub fn new(
        consumer_repo: ConsumerRepository,
        representative_repo: RepresentativeRepository,
        generator_repo: GeneratorRepository,
        commission_service: CommissionService,
        audit: AuditService,
    ) -> Self {
        Self { consumer_repo, representative_repo, generator_repo, commission_service, audit }
    }

    async fn ensure_generator_exists(&self, conn: &mut PgConnection, generator_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = generator_id {
            self.generator_repo
                .find_by_id(conn, id)
                .await?
                .ok_or(AppError::NotFound(Entity::Generator))?;
        }
        Ok(())
    }

    /// Cadastro feito por um representante: nasce PENDING e pertence a ele.
    pub async fn submit_as_representative<'e, E>(
        &self,
        executor: E,
        mut input: NewConsumer,
        representative_id: Uuid,
    ) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        input.check_ranges()?;

        let mut conn = executor.acquire().await?;

        let representative = self
            .representative_repo
            .find_by_id(&mut *conn, representative_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Representative))?;

        ensure_active(&representative)?;
        self.ensure_generator_exists(&mut *conn, input.generator_id).await?;

        input.representative_id = Some(representative_id);
        let consumer = self
            .consumer_repo
            .create(&mut *conn, &input, ApprovalStatus::Pending, Some(representative_id))
            .await?;

        tracing::info!(consumer_id = %consumer.id, representative_id = %representative_id, "Consumidor submetido para aprovação");
        self.audit.record(
            AuditEntry::new("SUBMIT_CONSUMER", "consumer", Some(consumer.id))
                .actor(Some(representative_id))
                .new_values(&consumer),
        );

        Ok(consumer)
    }

    /// Cadastro feito pela equipe: já nasce aprovado.
    pub async fn submit_as_admin<'e, E>(&self, executor: E, input: NewConsumer, actor_id: Uuid) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        input.check_ranges()?;

        let mut conn = executor.acquire().await?;

        self.ensure_generator_exists(&mut *conn, input.generator_id).await?;
        if let Some(id) = input.representative_id {
            self.representative_repo
                .find_by_id(&mut *conn, id)
                .await?
                .ok_or(AppError::NotFound(Entity::Representative))?;
        }

        let consumer = self
            .consumer_repo
            .create(&mut *conn, &input, ApprovalStatus::Approved, None)
            .await?;

        self.audit.record(
            AuditEntry::new("CREATE_CONSUMER", "consumer", Some(consumer.id))
                .actor(Some(actor_id))
                .new_values(&consumer),
        );

        Ok(consumer)
    }

    async fn review_within(
        &self,
        conn: &mut PgConnection,
        consumer_id: Uuid,
        decision: ApprovalStatus,
        actor_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Consumer, AppError> {
        match self.consumer_repo.review(&mut *conn, consumer_id, decision, actor_id, reason).await? {
            Some(consumer) => Ok(consumer),
            None => Err(review_miss(self.consumer_repo.find_by_id(&mut *conn, consumer_id).await?)),
        }
    }

    /// Aprovação isolada: não gera comissão.
    pub async fn approve<'e, E>(&self, executor: E, consumer_id: Uuid, actor_id: Uuid) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let consumer = self
            .review_within(&mut *conn, consumer_id, ApprovalStatus::Approved, actor_id, None)
            .await?;

        tracing::info!(consumer_id = %consumer_id, "Consumidor aprovado");
        self.audit.record(
            AuditEntry::new("APPROVE_CONSUMER", "consumer", Some(consumer_id))
                .actor(Some(actor_id))
                .new_values(&consumer),
        );

        Ok(consumer)
    }

    /// Aprova e, havendo representante, cria a comissão. Tudo ou nada.
    pub async fn approve_and_commission<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        actor_id: Uuid,
    ) -> Result<ApprovalOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let consumer = self
            .review_within(&mut *tx, consumer_id, ApprovalStatus::Approved, actor_id, None)
            .await?;

        let commission = match consumer.representative_id {
            Some(_) => Some(self.commission_service.create_within(&mut *tx, consumer_id).await?),
            None => None,
        };

        tx.commit().await?;

        tracing::info!(consumer_id = %consumer_id, with_commission = commission.is_some(), "Consumidor aprovado");
        self.audit.record(
            AuditEntry::new("APPROVE_CONSUMER", "consumer", Some(consumer_id))
                .actor(Some(actor_id))
                .new_values(&consumer),
        );
        if let Some(commission) = &commission {
            self.commission_service.audit_created(commission, Some(actor_id));
        }

        Ok(ApprovalOutcome { consumer, commission })
    }

    pub async fn reject<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let reason = required_reason(reason, "approval.reason_required")?;

        let mut conn = executor.acquire().await?;
        let consumer = self
            .review_within(&mut *conn, consumer_id, ApprovalStatus::Rejected, actor_id, Some(reason))
            .await?;

        tracing::info!(consumer_id = %consumer_id, "Consumidor rejeitado");
        self.audit.record(
            AuditEntry::new("REJECT_CONSUMER", "consumer", Some(consumer_id))
                .actor(Some(actor_id))
                .new_values(&consumer),
        );

        Ok(consumer)
    }

    pub async fn list_pending(
        &self,
        mut filters: ConsumerFilters,
        page: PageParams,
    ) -> Result<Paginated<Consumer>, AppError> {
        filters.approval_status = Some(ApprovalStatus::Pending);
        self.list_consumers(filters, page).await
    }

    pub async fn list_consumers(&self, filters: ConsumerFilters, page: PageParams) -> Result<Paginated<Consumer>, AppError> {
        let (items, total) = self.consumer_repo.list_page(&filters, &page).await?;
        Ok(Paginated::new(items, &page, total))
    }

    pub async fn get_consumer<'e, E>(&self, executor: E, consumer_id: Uuid) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.consumer_repo
            .find_by_id(executor, consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))
    }
}
