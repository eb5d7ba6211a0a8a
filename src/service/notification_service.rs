// service/notification_service.rs
use async_trait::async_trait;

use crate::{
    mail::mails::{send_payout_failure_email, send_payout_success_email},
    models::payoutmodel::Payout,
    service::error::ServiceError,
    utils::currency::format_money,
};

/// Outbound messages about settled payouts. Delivery is best-effort: callers
/// log the error and carry on.
#[async_trait]
pub trait PayoutNotifier: Send + Sync {
    async fn payout_succeeded(&self, payout: &Payout, name: &str) -> Result<(), ServiceError>;

    async fn payout_failed(&self, payout: &Payout, name: &str, reason: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PayoutNotifier for NotificationService {
    async fn payout_succeeded(&self, payout: &Payout, name: &str) -> Result<(), ServiceError> {
        let transaction_date = payout
            .transaction_date
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_default();

        tracing::info!(
            "Payout success notification: payout {} to {}",
            payout.id,
            payout.beneficiary_email
        );

        send_payout_success_email(
            &payout.beneficiary_email,
            name,
            &format_money(&payout.total_amount),
            &format_money(&payout.tds_amount),
            &format_money(&payout.net_amount),
            payout.utr_number.as_deref().unwrap_or("-"),
            &transaction_date,
        )
        .await
        .map_err(|e| ServiceError::Notification(e.to_string()))
    }

    async fn payout_failed(&self, payout: &Payout, name: &str, reason: &str) -> Result<(), ServiceError> {
        tracing::info!(
            "Payout failure notification: payout {} to {}",
            payout.id,
            payout.beneficiary_email
        );

        send_payout_failure_email(
            &payout.beneficiary_email,
            name,
            &format_money(&payout.net_amount),
            reason,
        )
        .await
        .map_err(|e| ServiceError::Notification(e.to_string()))
    }
}
