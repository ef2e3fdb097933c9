// src/db/generator_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::generator::{Generator, GeneratorStatus, NewGenerator},
};

#[derive(Clone)]
pub struct GeneratorRepository {
    pool: PgPool,
}

impl GeneratorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, input: &NewGenerator) -> Result<Generator, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Generator>(
            r#"
            INSERT INTO generators (
                owner_name, cpf_cnpj, source_type, installed_power,
                concessionaire, uc_number, city, state, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&input.owner_name)
        .bind(&input.cpf_cnpj)
        .bind(input.source_type)
        .bind(input.installed_power)
        .bind(&input.concessionaire)
        .bind(&input.uc_number)
        .bind(&input.city)
        .bind(&input.state)
        .bind(input.status.unwrap_or(GeneratorStatus::UnderAnalysis))
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "generator.duplicate_document"))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Generator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let generator = sqlx::query_as::<_, Generator>("SELECT * FROM generators WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(generator)
    }

    /// Trava a linha do gerador até o fim da transação.
    /// Alocações concorrentes no mesmo gerador ficam em fila aqui.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Generator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let generator = sqlx::query_as::<_, Generator>("SELECT * FROM generators WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(generator)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Generator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let generators = sqlx::query_as::<_, Generator>("SELECT * FROM generators ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;

        Ok(generators)
    }

    pub async fn update<'e, E>(&self, executor: E, generator: &Generator) -> Result<Generator, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Generator>(
            r#"
            UPDATE generators SET
                owner_name = $2,
                source_type = $3,
                installed_power = $4,
                concessionaire = $5,
                uc_number = $6,
                city = $7,
                state = $8,
                status = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(generator.id)
        .bind(&generator.owner_name)
        .bind(generator.source_type)
        .bind(generator.installed_power)
        .bind(&generator.concessionaire)
        .bind(&generator.uc_number)
        .bind(&generator.city)
        .bind(&generator.state)
        .bind(generator.status)
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM generators WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| match &e {
                // Consumidor vinculado entre a checagem e o DELETE
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict("generator.has_consumers")
                }
                _ => AppError::from(e),
            })?;

        Ok(result.rows_affected())
    }
}
