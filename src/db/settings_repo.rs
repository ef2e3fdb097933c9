// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::settings::SystemSetting};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Linha ativa mais recente da chave.
    pub async fn find_active<'e, E>(&self, executor: E, key: &str) -> Result<Option<SystemSetting>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let setting = sqlx::query_as::<_, SystemSetting>(
            r#"
            SELECT * FROM system_settings
            WHERE key = $1 AND is_active = TRUE
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(executor)
        .await?;

        Ok(setting)
    }

    pub async fn update_value<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        value: &str,
        updated_by: Option<Uuid>,
    ) -> Result<SystemSetting, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let setting = sqlx::query_as::<_, SystemSetting>(
            r#"
            UPDATE system_settings SET
                value = $2,
                updated_by = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(value)
        .bind(updated_by)
        .fetch_one(executor)
        .await?;

        Ok(setting)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<Uuid>,
    ) -> Result<SystemSetting, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let setting = sqlx::query_as::<_, SystemSetting>(
            r#"
            INSERT INTO system_settings (key, value, is_active, description, updated_by)
            VALUES ($1, $2, TRUE, $3, $4)
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(updated_by)
        .fetch_one(executor)
        .await?;

        Ok(setting)
    }

    pub async fn history<'e, E>(&self, executor: E, key: &str) -> Result<Vec<SystemSetting>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings WHERE key = $1 ORDER BY updated_at DESC",
        )
        .bind(key)
        .fetch_all(executor)
        .await?;

        Ok(settings)
    }
}
