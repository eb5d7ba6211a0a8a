// models/commissionmodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::usermodel::KycStatus;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "commission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Unpaid,
    Paid,
}

impl CommissionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Unpaid => "unpaid",
            CommissionStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommissionLedgerEntry {
    pub id: Uuid,
    /// Affiliate earning the commission.
    pub user_id: Uuid,
    /// Purchaser who was referred.
    pub referral_user_id: Uuid,
    /// Payment that triggered the accrual.
    pub transaction_id: Uuid,
    pub bundle_course_id: Uuid,
    pub amount: BigDecimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommission {
    pub user_id: Uuid,
    pub referral_user_id: Uuid,
    pub transaction_id: Uuid,
    pub bundle_course_id: Uuid,
    pub amount: BigDecimal,
}

/// Affiliate with pending commissions in a date window.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingAffiliate {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub kyc_status: KycStatus,
    pub pending_total: BigDecimal,
    pub entry_count: i64,
}
