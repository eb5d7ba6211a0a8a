// service/payout_service.rs
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use num_traits::Zero;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        commissionmodel::PendingAffiliate,
        payoutmodel::{Beneficiary, NewPayout, Payout, PayoutStatus, Tds},
        usermodel::{Kyc, KycStatus, User},
    },
    service::error::ServiceError,
    utils::{
        bank::{is_valid_account_number, is_valid_ifsc},
        currency::{
            format_money, sum_money, withhold_tds, DEFAULT_TDS_PERCENT, PAYOUT_CURRENCY,
            PAYOUT_TRANSACTION_TYPE,
        },
    },
};

const PAYOUT_FILE_PREFIX: &str = "payout-week-";
const PAYOUT_FILE_EXTENSION: &str = ".csv";

/// One line of the bank transfer instruction file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayoutInstructionRow {
    #[serde(rename = "Beneficiary Name")]
    pub beneficiary_name: String,
    #[serde(rename = "Beneficiary Account Number")]
    pub account_number: String,
    #[serde(rename = "IFSC")]
    pub ifsc_code: String,
    #[serde(rename = "Transaction Type")]
    pub transaction_type: String,
    #[serde(rename = "Total Amount")]
    pub total_amount: String,
    #[serde(rename = "TDS Amount")]
    pub tds_amount: String,
    #[serde(rename = "Amount")]
    pub net_amount: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Beneficiary Email ID")]
    pub beneficiary_email: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
}

impl PayoutInstructionRow {
    pub fn from_payout(payout: &Payout) -> Self {
        Self {
            beneficiary_name: payout.beneficiary_name.clone(),
            account_number: payout.account_number.clone(),
            ifsc_code: payout.ifsc_code.clone(),
            transaction_type: PAYOUT_TRANSACTION_TYPE.to_string(),
            total_amount: format_money(&payout.total_amount),
            tds_amount: format_money(&payout.tds_amount),
            net_amount: format_money(&payout.net_amount),
            currency: PAYOUT_CURRENCY.to_string(),
            beneficiary_email: payout.beneficiary_email.clone(),
            remarks: payout.remarks.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayoutItemOutcome {
    Created {
        user_id: Uuid,
        payout_id: Uuid,
        commission_count: usize,
        total_amount: BigDecimal,
        tds_amount: BigDecimal,
        net_amount: BigDecimal,
    },
    Skipped {
        user_id: Uuid,
        reason: String,
    },
    Failed {
        user_id: Uuid,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutBatchReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// `None` when there was nothing to export or the write failed.
    pub file_name: Option<String>,
    /// Set when the instruction file could not be written. The payouts stay
    /// unexported and the next batch or `export_week` for the week picks
    /// them up.
    pub file_error: Option<String>,
    pub items: Vec<PayoutItemOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutFile {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// `[week_start 00:00, week_end + 1 day 00:00)`, so the end date is included whole.
pub fn week_window(week_start: NaiveDate, week_end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (day_start(week_start), day_start(week_end + Duration::days(1)))
}

pub fn payout_file_name(week_start: NaiveDate, week_end: NaiveDate, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}{}-to-{}-{}{}",
        PAYOUT_FILE_PREFIX,
        week_start.format("%Y-%m-%d"),
        week_end.format("%Y-%m-%d"),
        generated_at.timestamp_millis(),
        PAYOUT_FILE_EXTENSION
    )
}

/// Only plain names of generated payout files may be served.
pub fn is_payout_file_name(name: &str) -> bool {
    name.starts_with(PAYOUT_FILE_PREFIX)
        && name.ends_with(PAYOUT_FILE_EXTENSION)
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Bank details for a payout, or the reason the affiliate cannot be paid.
pub fn beneficiary_from_kyc(user: &User, kyc: Option<&Kyc>) -> Result<Beneficiary, String> {
    if user.kyc_status != KycStatus::Approved {
        return Err(format!("KYC status is {}", user.kyc_status.to_str()));
    }

    let kyc = kyc.ok_or_else(|| "KYC details not submitted".to_string())?;

    let name = kyc
        .beneficiary_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "Beneficiary name missing".to_string())?;

    let account_number = kyc.account_number.as_deref().map(str::trim).unwrap_or_default();
    if !is_valid_account_number(account_number) {
        return Err("Bank account number missing or invalid".to_string());
    }

    let ifsc_code = kyc
        .ifsc_code
        .as_deref()
        .map(|code| code.trim().to_uppercase())
        .unwrap_or_default();
    if !is_valid_ifsc(&ifsc_code) {
        return Err("IFSC code missing or invalid".to_string());
    }

    Ok(Beneficiary {
        name: name.to_string(),
        account_number: account_number.to_string(),
        ifsc_code,
        email: user.email.clone(),
    })
}

pub fn payout_remarks(week_start: NaiveDate, week_end: NaiveDate, unpaid_carried: &BigDecimal) -> String {
    let mut remarks = format!(
        "Commission payout for {} to {}",
        week_start.format("%d %b %Y"),
        week_end.format("%d %b %Y")
    );
    if unpaid_carried > &BigDecimal::zero() {
        remarks.push_str(&format!(
            "; unpaid from last week {} {}",
            format_money(unpaid_carried),
            PAYOUT_CURRENCY
        ));
    }
    remarks
}

#[derive(Debug, Clone)]
pub struct PayoutService<S> {
    store: Arc<S>,
    export_dir: PathBuf,
}

impl<S: Store> PayoutService<S> {
    pub fn new(store: Arc<S>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: export_dir.into(),
        }
    }

    /// Admin-triggered batch for the given affiliates.
    pub async fn generate_payouts(
        &self,
        user_ids: &[Uuid],
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<PayoutBatchReport, ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::Validation("user_ids must not be empty".to_string()));
        }
        if week_end < week_start {
            return Err(ServiceError::Validation(
                "week_end must not be before week_start".to_string(),
            ));
        }

        self.run_batch(user_ids, week_start, week_end).await
    }

    /// Batch over every affiliate with pending commissions in the week.
    pub async fn generate_for_week(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<PayoutBatchReport, ServiceError> {
        let user_ids: Vec<Uuid> = self
            .list_eligible(week_start, week_end, None)
            .await?
            .into_iter()
            .map(|a| a.user_id)
            .collect();

        self.run_batch(&user_ids, week_start, week_end).await
    }

    async fn run_batch(
        &self,
        user_ids: &[Uuid],
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<PayoutBatchReport, ServiceError> {
        let (from, to) = week_window(week_start, week_end);

        let mut items = Vec::with_capacity(user_ids.len());
        let mut seen = Vec::with_capacity(user_ids.len());

        for user_id in user_ids {
            if seen.contains(user_id) {
                continue;
            }
            seen.push(*user_id);

            match self.process_affiliate(*user_id, from, to, week_start, week_end).await {
                Ok(outcome) => {
                    if let PayoutItemOutcome::Skipped { reason, .. } = &outcome {
                        tracing::warn!(user_id = %user_id, reason = %reason, "Affiliate skipped");
                    }
                    items.push(outcome);
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Payout generation failed");
                    items.push(PayoutItemOutcome::Failed {
                        user_id: *user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        // Payouts are already committed here, so an export failure is
        // reported rather than returned.
        let (file_name, file_error) = match self.export_week(week_start, week_end).await {
            Ok(file_name) => (file_name, None),
            Err(e) => {
                tracing::error!(%week_start, %week_end, error = %e, "Payout instruction export failed");
                (None, Some(e.to_string()))
            }
        };

        let count = |f: fn(&PayoutItemOutcome) -> bool| items.iter().filter(|i| f(i)).count();
        let report = PayoutBatchReport {
            week_start,
            week_end,
            created: count(|i| matches!(i, PayoutItemOutcome::Created { .. })),
            skipped: count(|i| matches!(i, PayoutItemOutcome::Skipped { .. })),
            failed: count(|i| matches!(i, PayoutItemOutcome::Failed { .. })),
            file_name,
            file_error,
            items,
        };

        tracing::info!(
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            file = ?report.file_name,
            "Payout batch finished"
        );

        Ok(report)
    }

    async fn process_affiliate(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<PayoutItemOutcome, ServiceError> {
        let skipped = |reason: &str| {
            Ok(PayoutItemOutcome::Skipped {
                user_id,
                reason: reason.to_string(),
            })
        };

        let pending = self.store.list_pending_commissions(user_id, from, to).await?;
        if pending.is_empty() {
            return skipped("No pending commissions in range");
        }

        let total_amount = sum_money(pending.iter().map(|c| &c.amount));

        let Some(user) = self.store.get_user(user_id).await? else {
            return skipped("User not found");
        };

        let kyc = self.store.get_kyc(user_id).await?;
        let beneficiary = match beneficiary_from_kyc(&user, kyc.as_ref()) {
            Ok(beneficiary) => beneficiary,
            Err(reason) => return skipped(reason.as_str()),
        };

        let tds_percent = BigDecimal::from(DEFAULT_TDS_PERCENT);
        let (tds_amount, net_amount) = withhold_tds(&total_amount, &tds_percent);

        let unpaid = self.store.list_unpaid_before(user_id, from).await?;
        let unpaid_total = sum_money(unpaid.iter().map(|c| &c.amount));

        let new_payout = NewPayout {
            user_id,
            commission_ids: pending.iter().map(|c| c.id).collect(),
            week_start,
            week_end,
            total_amount,
            tds: Tds {
                amount: tds_amount,
                percent: tds_percent,
            },
            net_amount,
            beneficiary,
            remarks: Some(payout_remarks(week_start, week_end, &unpaid_total)),
        };

        let Some(payout) = self.store.approve_and_create_payout(&new_payout).await? else {
            return skipped("Commissions changed while approving, rerun the batch");
        };

        tracing::info!(
            payout_id = %payout.id,
            user_id = %user_id,
            total = %payout.total_amount,
            tds = %payout.tds_amount,
            net = %payout.net_amount,
            "Payout approved"
        );

        Ok(PayoutItemOutcome::Created {
            user_id,
            payout_id: payout.id,
            commission_count: payout.commission_ids.len(),
            total_amount: payout.total_amount,
            tds_amount: payout.tds_amount,
            net_amount: payout.net_amount,
        })
    }

    /// Writes every approved payout of the week that is not in an instruction
    /// file yet into a new file. Returns `None` when there is nothing to
    /// export. On a failed write the payouts are released for the next call.
    pub async fn export_week(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<Option<String>, ServiceError> {
        let file_name = payout_file_name(week_start, week_end, Utc::now());
        let payouts = self
            .store
            .claim_unexported_payouts(week_start, week_end, &file_name)
            .await?;

        if payouts.is_empty() {
            tracing::info!(%week_start, %week_end, "No unexported payouts, nothing to write");
            return Ok(None);
        }

        let rows: Vec<PayoutInstructionRow> = payouts.iter().map(PayoutInstructionRow::from_payout).collect();

        if let Err(e) = self.write_instruction_file(&file_name, &rows).await {
            match self.store.release_payout_export(&file_name).await {
                Ok(released) => tracing::warn!(file = %file_name, released, "Released payouts after failed export"),
                Err(release_err) => tracing::error!(
                    file = %file_name,
                    error = %release_err,
                    "Failed to release payouts after failed export"
                ),
            }
            return Err(e);
        }

        Ok(Some(file_name))
    }

    async fn write_instruction_file(
        &self,
        file_name: &str,
        rows: &[PayoutInstructionRow],
    ) -> Result<(), ServiceError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let contents = writer.into_inner().map_err(|e| ServiceError::Io(e.into_error()))?;

        tokio::fs::create_dir_all(&self.export_dir).await?;
        let path = self.export_dir.join(file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = async {
            file.write_all(&contents).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // partial files must not be downloadable
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::error!(file = %file_name, error = %remove_err, "Failed to remove partial payout file");
            }
            return Err(e.into());
        }

        tracing::info!(file = %file_name, rows = rows.len(), "Payout instruction file written");
        Ok(())
    }

    pub async fn list_eligible(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
        kyc_status: Option<KycStatus>,
    ) -> Result<Vec<PendingAffiliate>, ServiceError> {
        let (from, to) = week_window(week_start, week_end);
        let affiliates = self.store.list_affiliates_with_pending(from, to).await?;

        Ok(affiliates
            .into_iter()
            .filter(|a| kyc_status.map_or(true, |status| a.kyc_status == status))
            .collect())
    }

    pub async fn list_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, ServiceError> {
        Ok(self.store.list_payouts(status).await?)
    }

    /// Generated instruction files, newest first.
    pub async fn list_files(&self) -> Result<Vec<PayoutFile>, ServiceError> {
        let mut entries = match tokio::fs::read_dir(&self.export_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_payout_file_name(&name) {
                continue;
            }
            let metadata = entry.metadata().await?;
            files.push(PayoutFile {
                name,
                size_bytes: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then_with(|| b.name.cmp(&a.name)));
        Ok(files)
    }

    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, ServiceError> {
        if !is_payout_file_name(name) {
            return Err(ServiceError::Validation(format!("Invalid payout file name: {}", name)));
        }

        match tokio::fs::read(self.export_dir.join(name)).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ServiceError::PayoutFileNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
