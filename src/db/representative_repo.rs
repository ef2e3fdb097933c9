// src/db/representative_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::representative::{NewRepresentative, Representative, RepresentativeStatus},
};

#[derive(Clone)]
pub struct RepresentativeRepository {
    pool: PgPool,
}

impl RepresentativeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        input: &NewRepresentative,
        password_hash: &str,
    ) -> Result<Representative, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Representative>(
            r#"
            INSERT INTO representatives (
                name, email, cpf_cnpj, password_hash, phone, status,
                commission_rate, specializations, city, state
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.cpf_cnpj)
        .bind(password_hash)
        .bind(&input.phone)
        .bind(input.status.unwrap_or(RepresentativeStatus::PendingApproval))
        .bind(input.commission_rate)
        .bind(&input.specializations)
        .bind(&input.city)
        .bind(&input.state)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "representative.duplicate"))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Representative>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let representative = sqlx::query_as::<_, Representative>("SELECT * FROM representatives WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(representative)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Representative>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let representatives = sqlx::query_as::<_, Representative>("SELECT * FROM representatives ORDER BY name")
            .fetch_all(executor)
            .await?;

        Ok(representatives)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: RepresentativeStatus,
    ) -> Result<Option<Representative>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let representative = sqlx::query_as::<_, Representative>(
            "UPDATE representatives SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(representative)
    }
}
