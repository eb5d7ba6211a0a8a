// db/enrollmentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::coursemodel::Enrollment;

#[async_trait]
pub trait EnrollmentExt {
    async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error>;

    /// Returns `None` when the (user, course) pair is already enrolled.
    async fn create_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<Enrollment>, sqlx::Error>;

    /// Course ids the user currently has access to.
    async fn get_accessible_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>;
}

#[async_trait]
impl EnrollmentExt for DBClient {
    async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    async fn create_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (user_id, course_id, payment_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING id, user_id, course_id, payment_id, status, progress, created_at
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_accessible_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT course_id FROM enrollments
            WHERE user_id = $1 AND status IN ('active', 'completed')
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
