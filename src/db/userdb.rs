// db/userdb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{IndustryEarning, Kyc, User};

const USER_COLUMNS: &str = r#"
    id, name, email, referral_code, referred_by, role, kyc_status,
    enrolled_course_ids, created_at, updated_at
"#;

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<User>, sqlx::Error>;

    async fn get_kyc(&self, user_id: Uuid) -> Result<Option<Kyc>, sqlx::Error>;

    /// Promotes a plain `user` to `affiliate`. Returns false when nothing changed.
    async fn promote_to_affiliate(&self, user_id: Uuid) -> Result<bool, sqlx::Error>;

    /// Appends to the profile enrollment list unless the course is already there.
    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn increment_industry_earning(
        &self,
        user_id: Uuid,
        label: &str,
        amount: &BigDecimal,
    ) -> Result<(), sqlx::Error>;

    async fn get_industry_earnings(&self, user_id: Uuid) -> Result<Vec<IndustryEarning>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE referral_code = $1",
            USER_COLUMNS
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_kyc(&self, user_id: Uuid) -> Result<Option<Kyc>, sqlx::Error> {
        sqlx::query_as::<_, Kyc>(
            r#"
            SELECT id, user_id, beneficiary_name, account_number, ifsc_code,
                   bank_name, created_at, updated_at
            FROM kyc_details
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn promote_to_affiliate(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = 'affiliate', updated_at = NOW()
            WHERE id = $1 AND role = 'user'
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET enrolled_course_ids = array_append(enrolled_course_ids, $2),
                updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(enrolled_course_ids))
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_industry_earning(
        &self,
        user_id: Uuid,
        label: &str,
        amount: &BigDecimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO industry_earnings (user_id, label, total)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, label)
            DO UPDATE SET total = industry_earnings.total + EXCLUDED.total,
                          updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(label)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_industry_earnings(&self, user_id: Uuid) -> Result<Vec<IndustryEarning>, sqlx::Error> {
        sqlx::query_as::<_, IndustryEarning>(
            r#"
            SELECT user_id, label, total, updated_at
            FROM industry_earnings
            WHERE user_id = $1
            ORDER BY total DESC, label
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
