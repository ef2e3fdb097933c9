// src/services/audit_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::{common::error::AppError, db::AuditRepository, models::audit::AuditEntry};

/// Destino dos registros de auditoria. Trait para permitir trocar o Postgres nos testes.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, entry: &AuditEntry) -> Result<(), AppError>;
}

pub struct PgAuditSink {
    pool: PgPool,
    repo: AuditRepository,
}

impl PgAuditSink {
    pub fn new(pool: PgPool, repo: AuditRepository) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn write(&self, entry: &AuditEntry) -> Result<(), AppError> {
        self.repo.insert(&self.pool, entry).await
    }
}

#[derive(Clone)]
pub struct AuditService {
    sink: Arc<dyn AuditSink>,
}

impl AuditService {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Fire-and-forget: a gravação roda em outra task e uma falha só gera log.
    /// O handle é devolvido para quem quiser aguardar (testes).
    pub fn record(&self, entry: AuditEntry) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.write(&entry).await {
                tracing::warn!(
                    action = entry.action,
                    entity_type = entry.entity_type,
                    "Falha ao gravar auditoria: {:?}",
                    e
                );
            }
        })
    }
}
