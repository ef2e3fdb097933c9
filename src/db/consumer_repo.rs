// src/db/consumer_repo.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::consumer::{ApprovalStatus, Consumer, ConsumerFilters, NewConsumer},
};

#[derive(Clone)]
pub struct ConsumerRepository {
    pool: PgPool,
}

// Monta o WHERE das listagens; todos os filtros são opcionais e combinados com AND
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filters: &'a ConsumerFilters) {
    builder.push(" WHERE 1 = 1");

    if let Some(state) = &filters.state {
        builder.push(" AND state = ").push_bind(state);
    }
    if let Some(city) = &filters.city {
        builder.push(" AND city ILIKE ").push_bind(city);
    }
    if let Some(representative_id) = filters.representative_id {
        builder.push(" AND representative_id = ").push_bind(representative_id);
    }
    if let Some(generator_id) = filters.generator_id {
        builder.push(" AND generator_id = ").push_bind(generator_id);
    }
    if let Some(status) = filters.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(approval_status) = filters.approval_status {
        builder.push(" AND approval_status = ").push_bind(approval_status);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cpf_cnpj ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl ConsumerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        input: &NewConsumer,
        approval_status: ApprovalStatus,
        submitted_by: Option<Uuid>,
    ) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            INSERT INTO consumers (
                cpf_cnpj, name, email, phone, city, state, concessionaire, uc_number,
                consumer_type, phase, average_monthly_consumption, discount_offered,
                approval_status, generator_id, representative_id, submitted_by_representative_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(&input.cpf_cnpj)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.concessionaire)
        .bind(&input.uc_number)
        .bind(input.consumer_type)
        .bind(input.phase)
        .bind(input.average_monthly_consumption)
        .bind(input.discount_offered)
        .bind(approval_status)
        .bind(input.generator_id)
        .bind(input.representative_id)
        .bind(submitted_by)
        .fetch_one(executor)
        .await?;

        Ok(consumer)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Consumer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>("SELECT * FROM consumers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(consumer)
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Consumer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>("SELECT * FROM consumers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(consumer)
    }

    /// Página de consumidores + total, com os filtros aplicados nas duas consultas.
    pub async fn list_page(
        &self,
        filters: &ConsumerFilters,
        page: &PageParams,
    ) -> Result<(Vec<Consumer>, i64), AppError> {
        let (_, limit) = page.resolve();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM consumers");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM consumers");
        push_filters(&mut select, filters);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select.build_query_as::<Consumer>().fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn list_by_generator<'e, E>(&self, executor: E, generator_id: Uuid) -> Result<Vec<Consumer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumers = sqlx::query_as::<_, Consumer>(
            "SELECT * FROM consumers WHERE generator_id = $1 ORDER BY created_at",
        )
        .bind(generator_id)
        .fetch_all(executor)
        .await?;

        Ok(consumers)
    }

    pub async fn count_by_generator<'e, E>(&self, executor: E, generator_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consumers WHERE generator_id = $1")
            .bind(generator_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Soma dos percentuais alocados em um gerador (0 se nenhum).
    pub async fn sum_allocated_percentage<'e, E>(&self, executor: E, generator_id: Uuid) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(allocated_percentage), 0)
            FROM consumers
            WHERE generator_id = $1 AND status = 'ALLOCATED'
            "#,
        )
        .bind(generator_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    /// Mesma soma, agrupada por gerador (para as listagens).
    pub async fn allocated_percentages<'e, E>(&self, executor: E) -> Result<HashMap<Uuid, Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(
            r#"
            SELECT generator_id, COALESCE(SUM(allocated_percentage), 0)
            FROM consumers
            WHERE generator_id IS NOT NULL AND status = 'ALLOCATED'
            GROUP BY generator_id
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Status, gerador e percentual mudam juntos em um único UPDATE.
    pub async fn set_allocation<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        generator_id: Uuid,
        percentage: Decimal,
    ) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers SET
                status = 'ALLOCATED',
                generator_id = $2,
                allocated_percentage = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(consumer_id)
        .bind(generator_id)
        .bind(percentage)
        .fetch_one(executor)
        .await?;

        Ok(consumer)
    }

    pub async fn clear_allocation<'e, E>(&self, executor: E, consumer_id: Uuid) -> Result<Option<Consumer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers SET
                status = 'AVAILABLE',
                generator_id = NULL,
                allocated_percentage = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(consumer_id)
        .fetch_optional(executor)
        .await?;

        Ok(consumer)
    }

    /// Revisão condicional: só sai de PENDING. `None` quando a linha não estava mais pendente.
    pub async fn review<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        decision: ApprovalStatus,
        reviewer_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<Consumer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers SET
                approval_status = $2,
                reviewed_by_user_id = $3,
                reviewed_at = NOW(),
                rejection_reason = $4,
                updated_at = NOW()
            WHERE id = $1 AND approval_status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(consumer_id)
        .bind(decision)
        .bind(reviewer_id)
        .bind(reason)
        .fetch_optional(executor)
        .await?;

        Ok(consumer)
    }

    /// Regrava os campos editáveis (usado ao aplicar uma solicitação de alteração).
    pub async fn update_details<'e, E>(&self, executor: E, consumer: &Consumer) -> Result<Consumer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers SET
                cpf_cnpj = $2,
                name = $3,
                email = $4,
                phone = $5,
                city = $6,
                state = $7,
                concessionaire = $8,
                uc_number = $9,
                consumer_type = $10,
                phase = $11,
                average_monthly_consumption = $12,
                discount_offered = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(consumer.id)
        .bind(&consumer.cpf_cnpj)
        .bind(&consumer.name)
        .bind(&consumer.email)
        .bind(&consumer.phone)
        .bind(&consumer.city)
        .bind(&consumer.state)
        .bind(&consumer.concessionaire)
        .bind(&consumer.uc_number)
        .bind(consumer.consumer_type)
        .bind(consumer.phase)
        .bind(consumer.average_monthly_consumption)
        .bind(consumer.discount_offered)
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }
}
