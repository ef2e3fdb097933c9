// src/db/change_request_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::change_request::{ChangeRequestStatus, ChangeSet, ConsumerChangeRequest},
};

#[derive(Clone)]
pub struct ChangeRequestRepository {
    pool: PgPool,
}

impl ChangeRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        representative_id: Uuid,
        changes: &ChangeSet,
    ) -> Result<ConsumerChangeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let old_values = serde_json::to_value(&changes.old_values).map_err(anyhow::Error::from)?;
        let new_values = serde_json::to_value(&changes.new_values).map_err(anyhow::Error::from)?;

        let request = sqlx::query_as::<_, ConsumerChangeRequest>(
            r#"
            INSERT INTO consumer_change_requests (
                consumer_id, representative_id, old_values, new_values, changed_fields
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(consumer_id)
        .bind(representative_id)
        .bind(old_values)
        .bind(new_values)
        .bind(&changes.changed_fields)
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ConsumerChangeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ConsumerChangeRequest>(
            "SELECT * FROM consumer_change_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ConsumerChangeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ConsumerChangeRequest>(
            "SELECT * FROM consumer_change_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    /// Fecha a solicitação. Só sai de PENDING; `None` se já foi revisada.
    pub async fn review<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        decision: ChangeRequestStatus,
        reviewer_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<ConsumerChangeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ConsumerChangeRequest>(
            r#"
            UPDATE consumer_change_requests SET
                status = $2,
                reviewed_by_user_id = $3,
                reviewed_at = NOW(),
                rejection_reason = $4
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decision)
        .bind(reviewer_id)
        .bind(reason)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn list_pending_page(&self, page: &PageParams) -> Result<(Vec<ConsumerChangeRequest>, i64), AppError> {
        let (_, limit) = page.resolve();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM consumer_change_requests WHERE status = 'PENDING'",
        )
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ConsumerChangeRequest>(
            r#"
            SELECT * FROM consumer_change_requests
            WHERE status = 'PENDING'
            ORDER BY requested_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn list_for_representative<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
    ) -> Result<Vec<ConsumerChangeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = sqlx::query_as::<_, ConsumerChangeRequest>(
            r#"
            SELECT * FROM consumer_change_requests
            WHERE representative_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(representative_id)
        .fetch_all(executor)
        .await?;

        Ok(requests)
    }
}
