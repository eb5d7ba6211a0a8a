// service/reconciliation_service.rs
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    models::payoutmodel::{Payout, PayoutStatus, Settlement},
    service::{
        error::ServiceError,
        notification_service::PayoutNotifier,
        payout_service::day_start,
        row_source::{Row, RowSource},
    },
    utils::currency::{parse_amount, within_tolerance, PAYOUT_TRANSACTION_TYPE, RECONCILIATION_LOOKBACK_DAYS},
};

const COL_EMAIL: &str = "beneficiary email id";
const COL_AMOUNT: &str = "amount";
const COL_TRANSACTION_TYPE: &str = "transaction type";
const COL_TRANSACTION_DATE: &str = "transaction date";
const COL_UTR: &str = "utr number";
const COL_STATUS: &str = "status";
const COL_ERRORS: &str = "errors";

const MAX_TRANSACTION_TYPE_CHARS: usize = 64;

/// One bank response line after column lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct BankResponseRow {
    pub email: String,
    pub amount: BigDecimal,
    pub transaction_type: Option<String>,
    pub transaction_date: Option<String>,
    pub utr_number: Option<String>,
    pub status: String,
    pub errors: Option<String>,
}

fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Collapses runs of whitespace and caps the length of the bank's free-text
/// transaction type.
pub fn normalize_transaction_type(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_TRANSACTION_TYPE_CHARS)
        .collect()
}

impl BankResponseRow {
    pub fn from_row(row: &Row) -> Result<Self, String> {
        let email = cell(row, COL_EMAIL).ok_or_else(|| "Missing Beneficiary Email ID".to_string())?;
        let amount = cell(row, COL_AMOUNT).ok_or_else(|| "Missing Amount".to_string())?;
        let status = cell(row, COL_STATUS).ok_or_else(|| "Missing Status".to_string())?;

        Ok(Self {
            email: email.to_lowercase(),
            amount: parse_amount(amount)?,
            transaction_type: cell(row, COL_TRANSACTION_TYPE).map(normalize_transaction_type),
            transaction_date: cell(row, COL_TRANSACTION_DATE).map(str::to_string),
            utr_number: cell(row, COL_UTR).map(str::to_string),
            status: status.to_string(),
            errors: cell(row, COL_ERRORS).map(str::to_string),
        })
    }

    pub fn succeeded(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// Bank date formats seen in response files. Anything else falls back to `now`.
pub fn parse_transaction_date(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return now;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(day_start)
        .unwrap_or(now)
}

/// Closest net amount within tolerance wins; equal distance goes to the
/// oldest payout.
pub fn select_payout<'a>(candidates: &'a [Payout], amount: &BigDecimal) -> Option<&'a Payout> {
    candidates
        .iter()
        .filter(|p| within_tolerance(&p.net_amount, amount))
        .min_by(|a, b| {
            let delta_a = (&a.net_amount - amount).abs();
            let delta_b = (&b.net_amount - amount).abs();
            delta_a.cmp(&delta_b).then_with(|| a.created_at.cmp(&b.created_at))
        })
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Matched {
        row: usize,
        payout_id: Uuid,
        user_id: Uuid,
        status: PayoutStatus,
        notified: bool,
    },
    Skipped {
        row: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub total_rows: usize,
    pub paid: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rows: Vec<RowOutcome>,
}

impl ReconciliationReport {
    fn push(&mut self, outcome: RowOutcome) {
        self.total_rows += 1;
        match &outcome {
            RowOutcome::Matched { status: PayoutStatus::Paid, .. } => self.paid += 1,
            RowOutcome::Matched { .. } => self.failed += 1,
            RowOutcome::Skipped { row, reason } => {
                tracing::warn!(row, reason = %reason, "Bank response row skipped");
                self.skipped += 1;
            }
        }
        self.rows.push(outcome);
    }
}

#[derive(Clone)]
pub struct ReconciliationService<S> {
    store: Arc<S>,
    notifier: Arc<dyn PayoutNotifier>,
}

impl<S> fmt::Debug for ReconciliationService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationService").finish_non_exhaustive()
    }
}

impl<S: Store> ReconciliationService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn PayoutNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Applies every row of a bank response file. Bad rows are reported and
    /// skipped; they never stop the import.
    pub async fn reconcile(&self, source: &dyn RowSource) -> Result<ReconciliationReport, ServiceError> {
        let now = Utc::now();
        let mut report = ReconciliationReport::default();

        // Collected up front so the iterator is not held across awaits.
        let rows: Vec<Result<Row, ServiceError>> = source.rows()?.collect();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let outcome = match row {
                Ok(row) => match self.process_row(row_number, &row, now).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(row = row_number, error = %e, "Bank response row failed");
                        RowOutcome::Skipped {
                            row: row_number,
                            reason: e.to_string(),
                        }
                    }
                },
                Err(e) => RowOutcome::Skipped {
                    row: row_number,
                    reason: e.to_string(),
                },
            };
            report.push(outcome);
        }

        tracing::info!(
            rows = report.total_rows,
            paid = report.paid,
            failed = report.failed,
            skipped = report.skipped,
            "Bank reconciliation finished"
        );

        Ok(report)
    }

    async fn process_row(
        &self,
        row_number: usize,
        row: &Row,
        now: DateTime<Utc>,
    ) -> Result<RowOutcome, ServiceError> {
        let skipped = |reason: String| {
            Ok(RowOutcome::Skipped {
                row: row_number,
                reason,
            })
        };

        let bank_row = match BankResponseRow::from_row(row) {
            Ok(bank_row) => bank_row,
            Err(reason) => return skipped(reason),
        };

        let Some(user) = self.store.get_user_by_email(&bank_row.email).await? else {
            return skipped(format!("No user with email {}", bank_row.email));
        };

        let since = now - Duration::days(RECONCILIATION_LOOKBACK_DAYS);
        let candidates = self.store.find_reconcilable_payouts(user.id, since).await?;

        let Some(payout) = select_payout(&candidates, &bank_row.amount) else {
            return skipped(format!(
                "No approved payout matching {} for {}",
                bank_row.amount, bank_row.email
            ));
        };

        let succeeded = bank_row.succeeded();
        let failure_reason = bank_row
            .errors
            .clone()
            .unwrap_or_else(|| format!("Bank reported status {}", bank_row.status));
        let transaction_type = bank_row
            .transaction_type
            .clone()
            .unwrap_or_else(|| PAYOUT_TRANSACTION_TYPE.to_string());

        let remarks = if succeeded {
            format!(
                "Paid via {} UTR {}",
                transaction_type,
                bank_row.utr_number.as_deref().unwrap_or("-")
            )
        } else {
            format!("Payout failed: {}", failure_reason)
        };

        let settlement = Settlement {
            succeeded,
            transaction_type,
            transaction_date: parse_transaction_date(bank_row.transaction_date.as_deref(), now),
            utr_number: bank_row.utr_number.clone(),
            remarks,
        };

        let Some(settled) = self.store.settle_payout(payout.id, &settlement).await? else {
            return skipped(format!("Payout {} is no longer approved", payout.id));
        };

        let notification = if succeeded {
            self.notifier.payout_succeeded(&settled, &user.name).await
        } else {
            self.notifier.payout_failed(&settled, &user.name, &failure_reason).await
        };

        let notified = match notification {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(payout_id = %settled.id, error = %e, "Payout notification not delivered");
                false
            }
        };

        Ok(RowOutcome::Matched {
            row: row_number,
            payout_id: settled.id,
            user_id: user.id,
            status: settled.status,
            notified,
        })
    }
}
