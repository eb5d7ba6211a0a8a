// db/payoutdb.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{commissiondb::transition_commissions, db::DBClient};
use crate::models::{
    commissionmodel::CommissionStatus,
    payoutmodel::{NewPayout, Payout, PayoutStatus, Settlement},
};

const PAYOUT_COLUMNS: &str = r#"
    id, user_id, commission_ids, week_start, week_end, total_amount,
    tds_amount, tds_percent, net_amount, beneficiary_name, account_number,
    ifsc_code, beneficiary_email, status, remarks, transaction_type,
    transaction_date, utr_number, instruction_file, created_at, updated_at
"#;

#[async_trait]
pub trait PayoutExt {
    /// Approves the referenced commissions and inserts the payout in one
    /// transaction. Returns `None` (and changes nothing) if any referenced
    /// commission is no longer pending.
    async fn approve_and_create_payout(&self, payout: &NewPayout) -> Result<Option<Payout>, sqlx::Error>;

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>, sqlx::Error>;

    /// Approved payouts for the user created at or after `since`, oldest first.
    async fn find_reconcilable_payouts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payout>, sqlx::Error>;

    /// Applies a bank outcome to an approved payout and cascades it to the
    /// payout's commissions in one transaction. `None` if the payout is no
    /// longer approved.
    async fn settle_payout(
        &self,
        payout_id: Uuid,
        settlement: &Settlement,
    ) -> Result<Option<Payout>, sqlx::Error>;

    async fn list_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, sqlx::Error>;

    /// Stamps every approved payout of the week that is not in an instruction
    /// file yet with `file_name` and returns them, oldest first. Concurrent
    /// callers never claim the same payout.
    async fn claim_unexported_payouts(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
        file_name: &str,
    ) -> Result<Vec<Payout>, sqlx::Error>;

    /// Undoes a claim whose file could not be written.
    async fn release_payout_export(&self, file_name: &str) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl PayoutExt for DBClient {
    async fn approve_and_create_payout(&self, payout: &NewPayout) -> Result<Option<Payout>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let approved = transition_commissions(
            &mut *tx,
            &payout.commission_ids,
            CommissionStatus::Pending,
            CommissionStatus::Approved,
        )
        .await?;

        if approved != payout.commission_ids.len() as u64 {
            tracing::warn!(
                user_id = %payout.user_id,
                expected = payout.commission_ids.len(),
                approved,
                "Commission set changed during approval, rolling back payout"
            );
            tx.rollback().await?;
            return Ok(None);
        }

        let created = sqlx::query_as::<_, Payout>(&format!(
            r#"
            INSERT INTO payouts
            (user_id, commission_ids, week_start, week_end, total_amount, tds_amount,
             tds_percent, net_amount, beneficiary_name, account_number, ifsc_code,
             beneficiary_email, status, remarks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'approved', $13)
            RETURNING {}
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(payout.user_id)
        .bind(&payout.commission_ids)
        .bind(payout.week_start)
        .bind(payout.week_end)
        .bind(&payout.total_amount)
        .bind(&payout.tds.amount)
        .bind(&payout.tds.percent)
        .bind(&payout.net_amount)
        .bind(&payout.beneficiary.name)
        .bind(&payout.beneficiary.account_number)
        .bind(&payout.beneficiary.ifsc_code)
        .bind(&payout.beneficiary.email)
        .bind(&payout.remarks)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>, sqlx::Error> {
        sqlx::query_as::<_, Payout>(&format!("SELECT {} FROM payouts WHERE id = $1", PAYOUT_COLUMNS))
            .bind(payout_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_reconcilable_payouts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payout>, sqlx::Error> {
        sqlx::query_as::<_, Payout>(&format!(
            r#"
            SELECT {} FROM payouts
            WHERE user_id = $1 AND status = 'approved' AND created_at >= $2
            ORDER BY created_at ASC
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    async fn settle_payout(
        &self,
        payout_id: Uuid,
        settlement: &Settlement,
    ) -> Result<Option<Payout>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let settled = sqlx::query_as::<_, Payout>(&format!(
            r#"
            UPDATE payouts
            SET status = $2,
                transaction_type = $3,
                transaction_date = $4,
                utr_number = $5,
                remarks = $6,
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {}
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(payout_id)
        .bind(settlement.payout_status())
        .bind(&settlement.transaction_type)
        .bind(settlement.transaction_date)
        .bind(&settlement.utr_number)
        .bind(&settlement.remarks)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payout) = settled else {
            tx.rollback().await?;
            return Ok(None);
        };

        let target = if settlement.succeeded {
            CommissionStatus::Paid
        } else {
            CommissionStatus::Unpaid
        };

        let moved = transition_commissions(
            &mut *tx,
            &payout.commission_ids,
            CommissionStatus::Approved,
            target,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            payout_id = %payout.id,
            status = payout.status.to_str(),
            commissions = moved,
            "Payout settled"
        );

        Ok(Some(payout))
    }

    async fn list_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, sqlx::Error> {
        sqlx::query_as::<_, Payout>(&format!(
            r#"
            SELECT {} FROM payouts
            WHERE ($1::payout_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn claim_unexported_payouts(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
        file_name: &str,
    ) -> Result<Vec<Payout>, sqlx::Error> {
        let mut claimed = sqlx::query_as::<_, Payout>(&format!(
            r#"
            UPDATE payouts
            SET instruction_file = $3, updated_at = NOW()
            WHERE week_start = $1 AND week_end = $2
              AND status = 'approved' AND instruction_file IS NULL
            RETURNING {}
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(week_start)
        .bind(week_end)
        .bind(file_name)
        .fetch_all(&self.pool)
        .await?;

        claimed.sort_by_key(|p| p.created_at);
        Ok(claimed)
    }

    async fn release_payout_export(&self, file_name: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET instruction_file = NULL, updated_at = NOW()
            WHERE instruction_file = $1 AND status = 'approved'
            "#,
        )
        .bind(file_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
