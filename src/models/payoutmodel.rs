// models/payoutmodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Paid,
    Unpaid,
    Failed,
}

impl PayoutStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Unpaid => "unpaid",
            PayoutStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub commission_ids: Vec<Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_amount: BigDecimal,
    pub tds_amount: BigDecimal,
    pub tds_percent: BigDecimal,
    pub net_amount: BigDecimal,
    pub beneficiary_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub beneficiary_email: String,
    pub status: PayoutStatus,
    pub remarks: Option<String>,
    pub transaction_type: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub utr_number: Option<String>,
    /// Bank instruction file this payout was exported in, once written.
    pub instruction_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tds {
    pub amount: BigDecimal,
    pub percent: BigDecimal,
}

impl Payout {
    pub fn tds(&self) -> Tds {
        Tds {
            amount: self.tds_amount.clone(),
            percent: self.tds_percent.clone(),
        }
    }
}

/// Bank details copied from KYC when the payout is approved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Beneficiary {
    pub name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewPayout {
    pub user_id: Uuid,
    pub commission_ids: Vec<Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_amount: BigDecimal,
    pub tds: Tds,
    pub net_amount: BigDecimal,
    pub beneficiary: Beneficiary,
    pub remarks: Option<String>,
}

/// Outcome reported by the bank for one payout.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub succeeded: bool,
    pub transaction_type: String,
    pub transaction_date: DateTime<Utc>,
    pub utr_number: Option<String>,
    pub remarks: String,
}

impl Settlement {
    pub fn payout_status(&self) -> PayoutStatus {
        if self.succeeded {
            PayoutStatus::Paid
        } else {
            PayoutStatus::Failed
        }
    }
}
