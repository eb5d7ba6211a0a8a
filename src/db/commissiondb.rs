// db/commissiondb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::commissionmodel::{
    CommissionLedgerEntry, CommissionStatus, NewCommission, PendingAffiliate,
};

pub(crate) const COMMISSION_COLUMNS: &str = r#"
    c.id, c.user_id, c.referral_user_id, c.transaction_id, c.bundle_course_id,
    c.amount, c.status, c.created_at, c.updated_at
"#;

#[async_trait]
pub trait CommissionExt {
    /// Inserts a pending entry. Returns `None` when this affiliate already has
    /// an entry for the payment.
    async fn record_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Option<CommissionLedgerEntry>, sqlx::Error>;

    /// Pending entries created in `[from, to)` whose payment was captured.
    async fn list_pending_commissions(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error>;

    async fn list_unpaid_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error>;

    async fn list_user_commissions(&self, user_id: Uuid) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error>;

    async fn list_affiliates_with_pending(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PendingAffiliate>, sqlx::Error>;

    // Bulk ledger transitions for callers outside a payout transaction.
    // Payout approval and settlement run the same guarded update through
    // `transition_commissions` on their own transaction. Entries not in the
    // expected prior state are left alone; the return value is the number of
    // entries moved.
    async fn mark_commissions_approved(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error>;
    async fn mark_commissions_paid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error>;
    async fn mark_commissions_unpaid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error>;
}

pub(crate) async fn transition_commissions<'e, E>(
    executor: E,
    ids: &[Uuid],
    from: CommissionStatus,
    to: CommissionStatus,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        UPDATE commissions
        SET status = $3, updated_at = NOW()
        WHERE id = ANY($1) AND status = $2
        "#,
    )
    .bind(ids)
    .bind(from)
    .bind(to)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

#[async_trait]
impl CommissionExt for DBClient {
    async fn record_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Option<CommissionLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CommissionLedgerEntry>(
            r#"
            INSERT INTO commissions
            (user_id, referral_user_id, transaction_id, bundle_course_id, amount, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            ON CONFLICT (user_id, transaction_id) DO NOTHING
            RETURNING id, user_id, referral_user_id, transaction_id, bundle_course_id,
                      amount, status, created_at, updated_at
            "#,
        )
        .bind(commission.user_id)
        .bind(commission.referral_user_id)
        .bind(commission.transaction_id)
        .bind(commission.bundle_course_id)
        .bind(&commission.amount)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_pending_commissions(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CommissionLedgerEntry>(&format!(
            r#"
            SELECT {}
            FROM commissions c
            JOIN payments p ON p.id = c.transaction_id
            WHERE c.user_id = $1
              AND c.status = 'pending'
              AND p.status = 'captured'
              AND c.created_at >= $2
              AND c.created_at < $3
            ORDER BY c.created_at ASC
            "#,
            COMMISSION_COLUMNS
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_unpaid_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CommissionLedgerEntry>(&format!(
            r#"
            SELECT {}
            FROM commissions c
            WHERE c.user_id = $1 AND c.status = 'unpaid' AND c.created_at < $2
            ORDER BY c.created_at ASC
            "#,
            COMMISSION_COLUMNS
        ))
        .bind(user_id)
        .bind(before)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_user_commissions(&self, user_id: Uuid) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        sqlx::query_as::<_, CommissionLedgerEntry>(&format!(
            r#"
            SELECT {}
            FROM commissions c
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC
            "#,
            COMMISSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_affiliates_with_pending(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PendingAffiliate>, sqlx::Error> {
        sqlx::query_as::<_, PendingAffiliate>(
            r#"
            SELECT u.id AS user_id,
                   u.name,
                   u.email,
                   u.kyc_status,
                   SUM(c.amount) AS pending_total,
                   COUNT(c.id) AS entry_count
            FROM commissions c
            JOIN payments p ON p.id = c.transaction_id
            JOIN users u ON u.id = c.user_id
            WHERE c.status = 'pending'
              AND p.status = 'captured'
              AND c.created_at >= $1
              AND c.created_at < $2
            GROUP BY u.id, u.name, u.email, u.kyc_status
            ORDER BY pending_total DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_commissions_approved(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        transition_commissions(&self.pool, ids, CommissionStatus::Pending, CommissionStatus::Approved).await
    }

    async fn mark_commissions_paid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        transition_commissions(&self.pool, ids, CommissionStatus::Approved, CommissionStatus::Paid).await
    }

    async fn mark_commissions_unpaid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        transition_commissions(&self.pool, ids, CommissionStatus::Approved, CommissionStatus::Unpaid).await
    }
}
