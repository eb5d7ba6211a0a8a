use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        commissionmodel::{CommissionLedgerEntry, CommissionStatus},
        usermodel::IndustryEarning,
    },
    utils::currency::sum_money,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionTotalsDto {
    pub pending: BigDecimal,
    pub approved: BigDecimal,
    pub paid: BigDecimal,
    pub unpaid: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionSummaryDto {
    pub totals: CommissionTotalsDto,
    pub industry_earnings: Vec<IndustryEarning>,
    pub entries: Vec<CommissionLedgerEntry>,
}

impl CommissionSummaryDto {
    pub fn new(entries: Vec<CommissionLedgerEntry>, industry_earnings: Vec<IndustryEarning>) -> Self {
        let total_for = |status: CommissionStatus| {
            sum_money(entries.iter().filter(|e| e.status == status).map(|e| &e.amount))
        };

        Self {
            totals: CommissionTotalsDto {
                pending: total_for(CommissionStatus::Pending),
                approved: total_for(CommissionStatus::Approved),
                paid: total_for(CommissionStatus::Paid),
                unpaid: total_for(CommissionStatus::Unpaid),
            },
            industry_earnings,
            entries,
        }
    }
}
