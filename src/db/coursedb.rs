// db/coursedb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::coursemodel::Course;

const COURSE_COLUMNS: &str = r#"
    id, title, is_bundle, price, discounted_price, commission_percent,
    bundle_position, industry, related_course_ids, related_bundle_ids,
    enrolled_count, created_at, updated_at
"#;

#[async_trait]
pub trait CourseExt {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, sqlx::Error>;

    /// All bundles, cheapest first.
    async fn get_bundles_by_price(&self) -> Result<Vec<Course>, sqlx::Error>;

    async fn increment_enrolled_count(&self, course_id: Uuid) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl CourseExt for DBClient {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS))
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_bundles_by_price(&self) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            SELECT {} FROM courses
            WHERE is_bundle = TRUE
            ORDER BY price ASC, bundle_position ASC NULLS LAST, created_at ASC
            "#,
            COURSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn increment_enrolled_count(&self, course_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE courses
            SET enrolled_count = enrolled_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
