// models/coursemodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_INDUSTRY_LABEL: &str = "general";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub is_bundle: bool,
    pub price: BigDecimal,
    pub discounted_price: BigDecimal,
    pub commission_percent: BigDecimal,
    pub bundle_position: Option<i32>,
    pub industry: Option<String>,
    pub related_course_ids: Vec<Uuid>,
    /// Lower-priced bundles unlocked together with this one.
    pub related_bundle_ids: Vec<Uuid>,
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn industry_label(&self) -> &str {
        self.industry
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_INDUSTRY_LABEL)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Revoked,
}

impl EnrollmentStatus {
    pub fn grants_access(&self) -> bool {
        matches!(self, EnrollmentStatus::Active | EnrollmentStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: EnrollmentStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
}
