// src/db/commission_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::commission::Commission,
};

#[derive(Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_pair<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        representative_id: Uuid,
    ) -> Result<Option<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commission = sqlx::query_as::<_, Commission>(
            "SELECT * FROM commissions WHERE consumer_id = $1 AND representative_id = $2",
        )
        .bind(consumer_id)
        .bind(representative_id)
        .fetch_optional(executor)
        .await?;

        Ok(commission)
    }

    /// Insere já como CALCULATED. A UNIQUE (consumer_id, representative_id)
    /// transforma uma corrida em `Conflict`.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
        consumer_id: Uuid,
        kwh_consumption: Decimal,
        kwh_price: Decimal,
        commission_value: Decimal,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO commissions (
                representative_id, consumer_id, kwh_consumption, kwh_price,
                commission_value, status, calculated_at
            )
            VALUES ($1, $2, $3, $4, $5, 'CALCULATED', NOW())
            RETURNING *
            "#,
        )
        .bind(representative_id)
        .bind(consumer_id)
        .bind(kwh_consumption)
        .bind(kwh_price)
        .bind(commission_value)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "commission.already_exists"))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commission = sqlx::query_as::<_, Commission>("SELECT * FROM commissions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(commission)
    }

    /// Só paga o que ainda está em aberto. `None` se outra requisição chegou antes.
    pub async fn mark_paid<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            UPDATE commissions SET
                status = 'PAID',
                paid_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('PENDING', 'CALCULATED')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(commission)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = sqlx::query_as::<_, Commission>("SELECT * FROM commissions ORDER BY calculated_at DESC")
            .fetch_all(executor)
            .await?;

        Ok(commissions)
    }

    pub async fn list_pending<'e, E>(&self, executor: E) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT * FROM commissions
            WHERE status IN ('PENDING', 'CALCULATED')
            ORDER BY calculated_at DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(commissions)
    }

    pub async fn list_for_representative<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
    ) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = sqlx::query_as::<_, Commission>(
            "SELECT * FROM commissions WHERE representative_id = $1 ORDER BY calculated_at DESC",
        )
        .bind(representative_id)
        .fetch_all(executor)
        .await?;

        Ok(commissions)
    }

    pub async fn list_by_period<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT * FROM commissions
            WHERE representative_id = $1 AND calculated_at BETWEEN $2 AND $3
            ORDER BY calculated_at DESC
            "#,
        )
        .bind(representative_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;

        Ok(commissions)
    }
}
