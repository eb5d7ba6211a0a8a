// db/paymentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::Payment;

const PAYMENT_COLUMNS: &str = r#"
    id, user_id, course_id, gateway_order_id, gateway_payment_id, amount,
    currency, method, status, created_at, captured_at
"#;

#[async_trait]
pub trait PaymentExt {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, sqlx::Error>;

    /// Moves a `created` or `failed` payment to `captured`, so a retried
    /// attempt on the same order still fulfils. Only one caller can win; the
    /// rest get `None`.
    async fn claim_captured_payment(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        method: Option<&str>,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn mark_payment_failed(&self, order_id: &str) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS))
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_payment_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE gateway_order_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn claim_captured_payment(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        method: Option<&str>,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'captured',
                gateway_payment_id = $2,
                method = COALESCE($3, method),
                captured_at = NOW()
            WHERE gateway_order_id = $1 AND status IN ('created', 'failed')
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .bind(gateway_payment_id)
        .bind(method)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_payment_failed(&self, order_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'failed' WHERE gateway_order_id = $1 AND status = 'created'",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
