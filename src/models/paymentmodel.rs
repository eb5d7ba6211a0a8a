// models/paymentmodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Captured,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub method: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub captured_at: Option<DateTime<Utc>>,
}

/// Verified gateway notification for a pre-created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    pub currency: Option<String>,
    pub method: Option<String>,
}

impl PaymentEvent {
    pub fn is_captured(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("captured")
    }
}
