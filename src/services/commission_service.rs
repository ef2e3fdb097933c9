// src/services/commission_service.rs

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, Entity},
    db::{CommissionRepository, ConsumerRepository},
    models::{
        audit::AuditEntry,
        commission::{Commission, CommissionQuote, CommissionStats, CommissionStatus, MonthlyBucket, StatusBucket},
        consumer::{ApprovalStatus, Consumer},
    },
    services::{audit_service::AuditService, pricing_service::PricingService},
};

// =========================================================================
//  FÓRMULA
// =========================================================================

/// Faixas (consumo mínimo em kWh, taxa), da maior para a menor.
/// A primeira faixa atingida vale.
fn commission_tiers() -> [(Decimal, Decimal); 3] {
    [
        (Decimal::new(1500, 0), Decimal::new(375, 3)),
        (Decimal::new(1000, 0), Decimal::new(35, 2)),
        (Decimal::new(600, 0), Decimal::new(30, 2)),
    ]
}

pub fn commission_rate(kwh: Decimal) -> Decimal {
    commission_tiers()
        .into_iter()
        .find(|(threshold, _)| kwh >= *threshold)
        .map(|(_, rate)| rate)
        .unwrap_or(Decimal::ZERO)
}

/// Arredonda meio para cima (afastando do zero) e fixa 2 casas.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Comissão = (kWh × preço) × taxa da faixa, com 2 casas. Entradas negativas contam como zero.
pub fn calculate_commission(kwh: Decimal, price: Decimal) -> Decimal {
    let kwh = kwh.max(Decimal::ZERO);
    let price = price.max(Decimal::ZERO);
    round_money(kwh * price * commission_rate(kwh))
}

pub fn quote(kwh: Decimal, price: Decimal) -> CommissionQuote {
    let kwh_consumption = kwh.max(Decimal::ZERO);
    let kwh_price = price.max(Decimal::ZERO);
    CommissionQuote {
        kwh_consumption,
        kwh_price,
        invoice_value: round_money(kwh_consumption * kwh_price),
        rate: commission_rate(kwh_consumption),
        commission_value: calculate_commission(kwh_consumption, kwh_price),
    }
}

// =========================================================================
//  REGRAS DE ESTADO
// =========================================================================

/// Consumidor apto a gerar comissão: aprovado e com representante. Devolve o representante.
pub fn ensure_eligible(consumer: &Consumer) -> Result<Uuid, AppError> {
    let representative_id = consumer
        .representative_id
        .ok_or(AppError::InvalidState("commission.consumer_without_representative"))?;

    if consumer.approval_status != ApprovalStatus::Approved {
        return Err(AppError::InvalidState("commission.consumer_not_approved"));
    }

    Ok(representative_id)
}

pub fn ensure_payable(commission: &Commission) -> Result<(), AppError> {
    match commission.status {
        CommissionStatus::Pending | CommissionStatus::Calculated => Ok(()),
        CommissionStatus::Paid => Err(AppError::InvalidState("commission.already_paid")),
        CommissionStatus::Cancelled => Err(AppError::InvalidState("commission.cancelled")),
    }
}

pub fn ensure_period(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::InvalidInput("commission.invalid_period"));
    }
    Ok(())
}

// =========================================================================
//  ESTATÍSTICAS
// =========================================================================

fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Os `count` meses terminando no mês de `now`, do mais antigo para o mais recente.
fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<String> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..count as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            month_key(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

pub fn build_stats(commissions: &[Commission], now: DateTime<Utc>) -> CommissionStats {
    let sum = |filter: &dyn Fn(&Commission) -> bool| -> (i64, Decimal) {
        commissions
            .iter()
            .filter(|c| filter(c))
            .fold((0, Decimal::ZERO), |(n, total), c| (n + 1, total + c.commission_value))
    };

    let (_, total_value) = sum(&|_| true);
    let (_, paid_value) = sum(&|c| c.status == CommissionStatus::Paid);
    let (_, pending_value) =
        sum(&|c| matches!(c.status, CommissionStatus::Pending | CommissionStatus::Calculated));

    let by_status = CommissionStatus::ALL
        .iter()
        .map(|status| {
            let (count, total) = sum(&|c| c.status == *status);
            StatusBucket { status: *status, count, total: round_money(total) }
        })
        .collect();

    let monthly = trailing_months(now, 6)
        .into_iter()
        .map(|month| {
            let (count, total) = sum(&|c| {
                month_key(c.calculated_at.year(), c.calculated_at.month()) == month
            });
            MonthlyBucket { month, count, total: round_money(total) }
        })
        .collect();

    CommissionStats {
        total_commissions: commissions.len() as i64,
        total_value: round_money(total_value),
        paid_value: round_money(paid_value),
        pending_value: round_money(pending_value),
        by_status,
        monthly,
    }
}

// =========================================================================
//  SERVIÇO
// =========================================================================

#[derive(Clone)]
pub struct CommissionService {
    repo: CommissionRepository,
    consumer_repo: ConsumerRepository,
    pricing: PricingService,
    audit: AuditService,
}

impl CommissionService {
    pub fn new(
        repo: CommissionRepository,
        consumer_repo: ConsumerRepository,
        pricing: PricingService,
        audit: AuditService,
    ) -> Self {
        Self { repo, consumer_repo, pricing, audit }
    }

    /// Simulação: usa o preço informado ou o vigente.
    pub async fn quote<'e, E>(&self, executor: E, kwh: Decimal, price: Option<Decimal>) -> Result<CommissionQuote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let price = match price {
            Some(p) => p,
            None => self.pricing.get_current_price(executor).await?,
        };
        Ok(quote(kwh, price))
    }

    /// Núcleo da criação, dentro de uma transação já aberta por quem chama.
    /// Não audita: quem chama registra depois do commit.
    pub(crate) async fn create_within(&self, conn: &mut PgConnection, consumer_id: Uuid) -> Result<Commission, AppError> {
        let consumer = self
            .consumer_repo
            .find_by_id(&mut *conn, consumer_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Consumer))?;

        let representative_id = ensure_eligible(&consumer)?;

        if self.repo.find_by_pair(&mut *conn, consumer_id, representative_id).await?.is_some() {
            return Err(AppError::Conflict("commission.already_exists"));
        }

        let price = self.pricing.get_current_price(&mut *conn).await?;
        let kwh = consumer.average_monthly_consumption;
        let value = calculate_commission(kwh, price);

        let commission = self
            .repo
            .create(&mut *conn, representative_id, consumer_id, kwh, price, value)
            .await?;

        tracing::info!(
            commission_id = %commission.id,
            consumer_id = %consumer_id,
            "Comissão calculada: {} ({} kWh x {})",
            value,
            kwh,
            price
        );

        Ok(commission)
    }

    pub fn audit_created(&self, commission: &Commission, actor_id: Option<Uuid>) {
        self.audit.record(
            AuditEntry::new("CREATE_COMMISSION", "commission", Some(commission.id))
                .actor(actor_id)
                .new_values(commission),
        );
    }

    pub async fn create_for_approved_consumer<'e, E>(
        &self,
        executor: E,
        consumer_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let commission = self.create_within(&mut *tx, consumer_id).await?;
        tx.commit().await?;

        self.audit_created(&commission, actor_id);
        Ok(commission)
    }

    pub async fn mark_as_paid<'e, E>(
        &self,
        executor: E,
        commission_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, commission_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Commission))?;

        ensure_payable(&current)?;

        // UPDATE condicional: se outra requisição pagou primeiro, não há linha
        let paid = self
            .repo
            .mark_paid(&mut *tx, commission_id)
            .await?
            .ok_or(AppError::InvalidState("commission.already_paid"))?;

        tx.commit().await?;

        tracing::info!(commission_id = %paid.id, "Comissão marcada como paga");
        self.audit.record(
            AuditEntry::new("MARK_COMMISSION_PAID", "commission", Some(paid.id))
                .actor(Some(actor_id))
                .old(&current)
                .new_values(&paid),
        );

        Ok(paid)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_all(executor).await
    }

    pub async fn list_pending<'e, E>(&self, executor: E) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_pending(executor).await
    }

    pub async fn list_for_representative<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
    ) -> Result<Vec<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_for_representative(executor, representative_id).await
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
        ensure_period(start, end)?;
        self.repo.list_by_period(executor, representative_id, start, end).await
    }

    pub async fn get_stats_for_representative<'e, E>(
        &self,
        executor: E,
        representative_id: Uuid,
    ) -> Result<CommissionStats, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = self.repo.list_for_representative(executor, representative_id).await?;
        Ok(build_stats(&commissions, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{fixtures, CommissionRepository},
        models::{change_request::tests::consumer, representative::RepresentativeStatus},
    };
    use chrono::TimeZone;
    use sqlx::PgPool;

    fn d(value: &str) -> Decimal {
        value.parse().expect("decimal válido")
    }

    #[test]
    fn below_first_tier_pays_nothing() {
        assert_eq!(calculate_commission(d("599.99"), d("1")), d("0.00"));
        assert_eq!(calculate_commission(Decimal::ZERO, d("0.90")), d("0.00"));
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(calculate_commission(d("600"), d("1")), d("180.00"));
        assert_eq!(calculate_commission(d("1000"), d("1")), d("350.00"));
        assert_eq!(calculate_commission(d("1500"), d("1")), d("562.50"));
        assert_eq!(calculate_commission(d("1499.99"), d("1")), d("525.00"));
    }

    #[test]
    fn uses_the_current_price() {
        // 1200 kWh × 0,80 = 960 × 35%
        assert_eq!(calculate_commission(d("1200"), d("0.80")), d("336.00"));
    }

    #[test]
    fn result_always_has_two_decimal_places() {
        assert_eq!(calculate_commission(d("1200"), d("0.80")).scale(), 2);
        assert_eq!(calculate_commission(d("10"), d("1")).scale(), 2);
        assert_eq!(calculate_commission(d("777.77"), d("0.93")).scale(), 2);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        assert_eq!(round_money(d("0.005")), d("0.01"));
        assert_eq!(round_money(d("2.345")), d("2.35"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
    }

    #[test]
    fn negative_inputs_never_produce_negative_commission() {
        assert_eq!(calculate_commission(d("-1200"), d("0.80")), d("0.00"));
        assert_eq!(calculate_commission(d("1200"), d("-0.80")), d("0.00"));
        assert!(calculate_commission(d("-1200"), d("-0.80")) >= Decimal::ZERO);
    }

    #[test]
    fn quote_exposes_the_breakdown() {
        let q = quote(d("1200"), d("0.80"));
        assert_eq!(q.invoice_value, d("960.00"));
        assert_eq!(q.rate, d("0.35"));
        assert_eq!(q.commission_value, d("336.00"));
    }

    #[test]
    fn eligibility_requires_representative_and_approval() {
        let mut c = consumer();
        assert_eq!(ensure_eligible(&c).ok(), c.representative_id);

        c.approval_status = ApprovalStatus::Pending;
        assert_eq!(ensure_eligible(&c).unwrap_err().message_code(), "commission.consumer_not_approved");

        c.representative_id = None;
        assert_eq!(
            ensure_eligible(&c).unwrap_err().message_code(),
            "commission.consumer_without_representative"
        );
    }

    fn commission(status: CommissionStatus, value: &str, at: DateTime<Utc>) -> Commission {
        Commission {
            id: Uuid::new_v4(),
            representative_id: Uuid::new_v4(),
            consumer_id: Uuid::new_v4(),
            kwh_consumption: d("1200"),
            kwh_price: d("0.80"),
            commission_value: d(value),
            status,
            calculated_at: at,
            paid_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn only_open_commissions_can_be_paid() {
        let now = Utc::now();
        assert!(ensure_payable(&commission(CommissionStatus::Calculated, "1", now)).is_ok());
        assert!(ensure_payable(&commission(CommissionStatus::Pending, "1", now)).is_ok());

        let paid = ensure_payable(&commission(CommissionStatus::Paid, "1", now)).unwrap_err();
        assert_eq!(paid.message_code(), "commission.already_paid");

        let cancelled = ensure_payable(&commission(CommissionStatus::Cancelled, "1", now)).unwrap_err();
        assert_eq!(cancelled.message_code(), "commission.cancelled");
    }

    #[test]
    fn inverted_period_is_rejected() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert!(ensure_period(start, end).is_err());
        assert!(ensure_period(end, start).is_ok());
        assert!(ensure_period(start, start).is_ok());
    }

    #[test]
    fn trailing_months_cross_the_year() {
        let now = Utc.with_ymd_and_hms(2025, 2, 15, 10, 0, 0).unwrap();
        assert_eq!(
            trailing_months(now, 6),
            vec!["2024-09", "2024-10", "2024-11", "2024-12", "2025-01", "2025-02"]
        );
    }

    #[test]
    fn stats_group_by_status_and_month() {
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let june = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2025, 4, 30, 23, 0, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let commissions = vec![
            commission(CommissionStatus::Paid, "336.00", june),
            commission(CommissionStatus::Calculated, "180.00", june),
            commission(CommissionStatus::Pending, "10.10", april),
            commission(CommissionStatus::Calculated, "50.00", last_year),
        ];

        let stats = build_stats(&commissions, now);

        assert_eq!(stats.total_commissions, 4);
        assert_eq!(stats.total_value, d("576.10"));
        assert_eq!(stats.paid_value, d("336.00"));
        assert_eq!(stats.pending_value, d("240.10"));

        let calculated = stats.by_status.iter().find(|b| b.status == CommissionStatus::Calculated).unwrap();
        assert_eq!((calculated.count, calculated.total), (2, d("230.00")));
        let cancelled = stats.by_status.iter().find(|b| b.status == CommissionStatus::Cancelled).unwrap();
        assert_eq!((cancelled.count, cancelled.total), (0, d("0.00")));

        let months: Vec<&str> = stats.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02", "2025-03", "2025-04", "2025-05", "2025-06"]);
        assert_eq!(stats.monthly[3].count, 1);
        assert_eq!(stats.monthly[4].total, d("0.00"));
        assert_eq!(stats.monthly[5].total, d("516.00"));
    }

    #[test]
    fn empty_history_still_lists_six_months() {
        let stats = build_stats(&[], Utc::now());
        assert_eq!(stats.monthly.len(), 6);
        assert_eq!(stats.total_value, d("0.00"));
        assert!(stats.monthly.iter().all(|m| m.count == 0));
    }

    // --- Contra o banco ---

    #[sqlx::test(migrations = "./migrations")]
    async fn second_commission_is_a_conflict_and_keeps_one_row(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), d("1200"), ApprovalStatus::Approved).await;

        state
            .commission_service
            .create_for_approved_consumer(&pool, c.id, None)
            .await
            .expect("primeira comissão");
        let err = state
            .commission_service
            .create_for_approved_consumer(&pool, c.id, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "CONFLICT");
        assert_eq!(err.message_code(), "commission.already_exists");
        assert_eq!(fixtures::count(&pool, "commissions").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unique_pair_constraint_also_maps_to_conflict(pool: PgPool) {
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), d("1200"), ApprovalStatus::Approved).await;
        let repo = CommissionRepository::new(pool.clone());

        repo.create(&pool, rep.id, c.id, d("1200"), d("0.80"), d("336.00")).await.expect("comissão");
        let err = repo
            .create(&pool, rep.id, c.id, d("1200"), d("0.80"), d("336.00"))
            .await
            .unwrap_err();

        assert_eq!(err.message_code(), "commission.already_exists");
        assert_eq!(fixtures::count(&pool, "commissions").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stored_snapshot_reproduces_the_commission_value(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), d("1234.56"), ApprovalStatus::Approved).await;

        // Uma casa a mais que o snapshot guarda
        let err = state.pricing_service.set_price(&pool, d("0.12345"), None).await.unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
        let err = state.pricing_service.set_price(&pool, d("2000000"), None).await.unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");

        state.pricing_service.set_price(&pool, d("0.1234"), None).await.expect("preço");

        let commission = state
            .commission_service
            .create_for_approved_consumer(&pool, c.id, None)
            .await
            .expect("comissão");

        assert_eq!(commission.kwh_price, d("0.1234"));
        assert_eq!(commission.kwh_consumption, d("1234.56"));
        assert_eq!(
            calculate_commission(commission.kwh_consumption, commission.kwh_price),
            commission.commission_value
        );
        assert_eq!(commission.commission_value, d("53.32"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn commission_is_paid_only_once(pool: PgPool) {
        let state = fixtures::state(pool.clone());
        let rep = fixtures::representative(&pool, RepresentativeStatus::Active).await;
        let c = fixtures::consumer(&pool, Some(rep.id), d("600"), ApprovalStatus::Approved).await;
        let admin = Uuid::new_v4();

        let commission = state
            .commission_service
            .create_for_approved_consumer(&pool, c.id, Some(admin))
            .await
            .expect("comissão");

        let paid = state.commission_service.mark_as_paid(&pool, commission.id, admin).await.expect("pagamento");
        assert_eq!(paid.status, CommissionStatus::Paid);
        assert!(paid.paid_at.is_some());

        let err = state.commission_service.mark_as_paid(&pool, commission.id, admin).await.unwrap_err();
        assert_eq!(err.message_code(), "commission.already_paid");
    }
}
