// src/db/fixtures.rs

//! Dados de apoio para os testes que rodam contra o Postgres (`#[sqlx::test]`).

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::{AppState, Config},
    db::{ConsumerRepository, GeneratorRepository, RepresentativeRepository},
    models::{
        consumer::{ApprovalStatus, Consumer, ConsumerPhase, ConsumerType, NewConsumer},
        generator::{Generator, NewGenerator, SourceType},
        representative::{NewRepresentative, Representative, RepresentativeStatus},
    },
};

pub fn state(pool: PgPool) -> AppState {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "segredo-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        max_connections: 1,
        enforce_headroom: true,
    };
    AppState::with_pool(pool, &config).expect("estado da aplicação")
}

// CPF/CNPJ é UNIQUE em geradores e representantes
fn unique_document() -> String {
    Uuid::new_v4().simple().to_string()[..14].to_string()
}

pub async fn representative(pool: &PgPool, status: RepresentativeStatus) -> Representative {
    let input = NewRepresentative {
        name: "Joana Ribeiro".into(),
        email: format!("{}@parceiros.com.br", Uuid::new_v4().simple()),
        cpf_cnpj: unique_document(),
        password: String::new(),
        phone: None,
        commission_rate: Decimal::new(5, 0),
        specializations: vec!["SOLAR".into()],
        city: Some("Belo Horizonte".into()),
        state: Some("MG".into()),
        status: Some(status),
    };
    RepresentativeRepository::new(pool.clone())
        .create(pool, &input, "$2b$04$hash-de-teste")
        .await
        .expect("representante")
}

pub async fn generator(pool: &PgPool) -> Generator {
    let input = NewGenerator {
        owner_name: "Fazenda Sol Nascente Ltda".into(),
        cpf_cnpj: unique_document(),
        source_type: SourceType::Solar,
        installed_power: Decimal::new(25000, 0),
        concessionaire: "CEMIG".into(),
        uc_number: "3004123456".into(),
        city: "Uberlândia".into(),
        state: "MG".into(),
        status: None,
    };
    GeneratorRepository::new(pool.clone())
        .create(pool, &input)
        .await
        .expect("gerador")
}

pub fn new_consumer(representative_id: Option<Uuid>, consumption: Decimal) -> NewConsumer {
    NewConsumer {
        cpf_cnpj: "123.456.789-00".into(),
        name: "Padaria Pão Quente".into(),
        email: Some("contato@paoquente.com.br".into()),
        phone: None,
        city: "Belo Horizonte".into(),
        state: "MG".into(),
        concessionaire: Some("CEMIG".into()),
        uc_number: Some("3004123456".into()),
        consumer_type: ConsumerType::Commercial,
        phase: ConsumerPhase::Triphasic,
        average_monthly_consumption: consumption,
        discount_offered: Decimal::new(15, 0),
        generator_id: None,
        representative_id,
    }
}

/// Grava direto no repositório, sem passar pelas regras de submissão.
pub async fn consumer(
    pool: &PgPool,
    representative_id: Option<Uuid>,
    consumption: Decimal,
    approval_status: ApprovalStatus,
) -> Consumer {
    ConsumerRepository::new(pool.clone())
        .create(pool, &new_consumer(representative_id, consumption), approval_status, None)
        .await
        .expect("consumidor")
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .expect("contagem")
}
