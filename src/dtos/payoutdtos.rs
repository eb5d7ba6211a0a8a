use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    payoutmodel::{Beneficiary, Payout, PayoutStatus, Tds},
    usermodel::KycStatus,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePayoutRequestDto {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportWeekRequestDto {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibleQueryDto {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutListQueryDto {
    pub status: Option<PayoutStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub commission_ids: Vec<Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_amount: BigDecimal,
    pub tds: Tds,
    pub net_amount: BigDecimal,
    pub beneficiary: Beneficiary,
    pub status: PayoutStatus,
    pub remarks: Option<String>,
    pub transaction_type: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub utr_number: Option<String>,
    pub instruction_file: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Payout> for PayoutResponseDto {
    fn from(payout: Payout) -> Self {
        Self {
            tds: payout.tds(),
            beneficiary: Beneficiary {
                name: payout.beneficiary_name,
                account_number: payout.account_number,
                ifsc_code: payout.ifsc_code,
                email: payout.beneficiary_email,
            },
            id: payout.id,
            user_id: payout.user_id,
            commission_ids: payout.commission_ids,
            week_start: payout.week_start,
            week_end: payout.week_end,
            total_amount: payout.total_amount,
            net_amount: payout.net_amount,
            status: payout.status,
            remarks: payout.remarks,
            transaction_type: payout.transaction_type,
            transaction_date: payout.transaction_date,
            utr_number: payout.utr_number,
            instruction_file: payout.instruction_file,
            created_at: payout.created_at,
            updated_at: payout.updated_at,
        }
    }
}
