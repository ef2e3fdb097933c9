// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AuditRepository, ChangeRequestRepository, CommissionRepository, ConsumerRepository, GeneratorRepository,
        RepresentativeRepository, SettingsRepository,
    },
    services::{
        allocation_service::AllocationService,
        approval_service::ApprovalService,
        audit_service::{AuditService, PgAuditSink},
        auth::AuthService,
        change_request_service::ChangeRequestService,
        commission_service::CommissionService,
        generator_service::GeneratorService,
        pricing_service::PricingService,
        representative_service::RepresentativeService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    // false = aceita alocações que passem de 100% no gerador
    pub enforce_headroom: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {:?}", raw))?,
            None => 5,
        };

        let enforce_headroom = match lookup("ALLOCATION_ENFORCE_HEADROOM") {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .with_context(|| format!("ALLOCATION_ENFORCE_HEADROOM inválido: {:?}", raw))?,
            None => true,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, max_connections, enforce_headroom })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub pricing_service: PricingService,
    pub commission_service: CommissionService,
    pub allocation_service: AllocationService,
    pub approval_service: ApprovalService,
    pub change_request_service: ChangeRequestService,
    pub generator_service: GeneratorService,
    pub representative_service: RepresentativeService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(db_pool, config)
    }

    /// Monta o grafo de dependências em cima de um pool já criado.
    pub fn with_pool(db_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let generator_repo = GeneratorRepository::new(db_pool.clone());
        let consumer_repo = ConsumerRepository::new(db_pool.clone());
        let representative_repo = RepresentativeRepository::new(db_pool.clone());
        let commission_repo = CommissionRepository::new(db_pool.clone());
        let change_request_repo = ChangeRequestRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let audit = AuditService::new(Arc::new(PgAuditSink::new(
            db_pool.clone(),
            AuditRepository::new(db_pool.clone()),
        )));

        let auth_service = AuthService::new(config.jwt_secret.clone());
        let pricing_service = PricingService::new(settings_repo, audit.clone());
        let commission_service = CommissionService::new(
            commission_repo,
            consumer_repo.clone(),
            pricing_service.clone(),
            audit.clone(),
        );
        let allocation_service = AllocationService::new(
            generator_repo.clone(),
            consumer_repo.clone(),
            audit.clone(),
            config.enforce_headroom,
        );
        let approval_service = ApprovalService::new(
            consumer_repo.clone(),
            representative_repo.clone(),
            generator_repo.clone(),
            commission_service.clone(),
            audit.clone(),
        );
        let change_request_service = ChangeRequestService::new(change_request_repo, consumer_repo.clone(), audit.clone());
        let generator_service = GeneratorService::new(generator_repo, consumer_repo, audit.clone());
        let representative_service = RepresentativeService::new(representative_repo, audit);

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            pricing_service,
            commission_service,
            allocation_service,
            approval_service,
            change_request_service,
            generator_service,
            representative_service,
        })
    }
}
