// service/accrual_service.rs
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        commissionmodel::NewCommission,
        paymentmodel::{Payment, PaymentEvent, PaymentStatus},
    },
    service::{
        enrollment_cascade::{CascadeReport, EnrollmentCascade},
        error::ServiceError,
        tier_resolver::{CommissionRule, TierResolver},
    },
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommissionResult {
    Recorded {
        commission_id: Uuid,
        sponsor_id: Uuid,
        amount: BigDecimal,
        rule: CommissionRule,
    },
    AlreadyRecorded { sponsor_id: Uuid },
    NoSponsor,
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FulfilmentReport {
    pub payment_id: Uuid,
    pub enrollment: CascadeReport,
    pub commission: CommissionResult,
    pub promoted_to_affiliate: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccrualOutcome {
    Fulfilled(FulfilmentReport),
    AlreadyProcessed { payment_id: Uuid },
    PaymentFailed { payment_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct AccrualService<S> {
    store: Arc<S>,
    cascade: EnrollmentCascade<S>,
    tier_resolver: TierResolver<S>,
}

impl<S: Store> AccrualService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            cascade: EnrollmentCascade::new(store.clone()),
            tier_resolver: TierResolver::new(store.clone()),
            store,
        }
    }

    /// Entry point for verified gateway notifications. Only the delivery that
    /// wins the captured-claim on the payment runs fulfilment.
    pub async fn process_payment_event(&self, event: &PaymentEvent) -> Result<AccrualOutcome, ServiceError> {
        let payment = self
            .store
            .get_payment_by_order_id(&event.order_id)
            .await?
            .ok_or_else(|| ServiceError::PaymentNotFound(event.order_id.clone()))?;

        if !event.is_captured() {
            let marked = self.store.mark_payment_failed(&event.order_id).await?;
            tracing::warn!(
                order_id = %event.order_id,
                status = %event.status,
                marked,
                "Payment not captured"
            );
            return Ok(AccrualOutcome::PaymentFailed { payment_id: payment.id });
        }

        let claimed = self
            .store
            .claim_captured_payment(&event.order_id, &event.payment_id, event.method.as_deref())
            .await?;

        let Some(captured) = claimed else {
            tracing::info!(
                order_id = %event.order_id,
                gateway_payment_id = %event.payment_id,
                "Payment already processed, ignoring delivery"
            );
            return Ok(AccrualOutcome::AlreadyProcessed { payment_id: payment.id });
        };

        let report = self.fulfil(&captured).await?;
        Ok(AccrualOutcome::Fulfilled(report))
    }

    /// Re-runs fulfilment for a captured payment. Every step is guarded by a
    /// storage constraint, so this only fills what an earlier run left out.
    pub async fn replay_payment(&self, payment_id: Uuid) -> Result<FulfilmentReport, ServiceError> {
        let payment = self
            .store
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| ServiceError::PaymentNotFound(payment_id.to_string()))?;

        if payment.status != PaymentStatus::Captured {
            return Err(ServiceError::PaymentNotCaptured(payment.id));
        }

        tracing::info!(payment_id = %payment.id, "Replaying payment fulfilment");
        self.fulfil(&payment).await
    }

    async fn fulfil(&self, payment: &Payment) -> Result<FulfilmentReport, ServiceError> {
        let enrollment = self.cascade.enroll_for_payment(payment).await?;
        let commission = self.accrue_commission(payment).await?;
        let promoted_to_affiliate = self.store.promote_to_affiliate(payment.user_id).await?;

        if promoted_to_affiliate {
            tracing::info!(user_id = %payment.user_id, "User promoted to affiliate");
        }

        Ok(FulfilmentReport {
            payment_id: payment.id,
            enrollment,
            commission,
            promoted_to_affiliate,
        })
    }

    async fn accrue_commission(&self, payment: &Payment) -> Result<CommissionResult, ServiceError> {
        let purchaser = self
            .store
            .get_user(payment.user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(payment.user_id))?;

        let Some(code) = purchaser.referred_by.as_deref().filter(|c| !c.trim().is_empty()) else {
            return Ok(CommissionResult::NoSponsor);
        };

        let Some(sponsor) = self.store.get_user_by_referral_code(code).await? else {
            tracing::warn!(
                purchaser_id = %purchaser.id,
                referral_code = %code,
                "Referral code does not resolve to a user"
            );
            return Ok(CommissionResult::NoSponsor);
        };

        if sponsor.id == purchaser.id {
            return Ok(CommissionResult::Skipped {
                reason: "Sponsor cannot earn on their own purchase".to_string(),
            });
        }

        let Some(purchased) = self.store.get_course(payment.course_id).await? else {
            tracing::error!(
                payment_id = %payment.id,
                course_id = %payment.course_id,
                "Purchased course missing, commission not created"
            );
            return Ok(CommissionResult::Skipped {
                reason: format!("Course {} not found", payment.course_id),
            });
        };

        let quote = self
            .tier_resolver
            .quote(sponsor.id, &purchased, &payment.amount)
            .await?;

        if quote.amount == 0 {
            return Ok(CommissionResult::Skipped {
                reason: "Commission amount is zero".to_string(),
            });
        }

        let amount = BigDecimal::from(quote.amount);
        let recorded = self
            .store
            .record_commission(&NewCommission {
                user_id: sponsor.id,
                referral_user_id: purchaser.id,
                transaction_id: payment.id,
                bundle_course_id: purchased.id,
                amount: amount.clone(),
            })
            .await?;

        let Some(entry) = recorded else {
            tracing::info!(
                sponsor_id = %sponsor.id,
                payment_id = %payment.id,
                "Commission already recorded"
            );
            return Ok(CommissionResult::AlreadyRecorded { sponsor_id: sponsor.id });
        };

        self.store
            .increment_industry_earning(sponsor.id, purchased.industry_label(), &amount)
            .await?;

        tracing::info!(
            commission_id = %entry.id,
            sponsor_id = %sponsor.id,
            purchaser_id = %purchaser.id,
            amount = %amount,
            rule = ?quote.rule,
            "Commission recorded"
        );

        Ok(CommissionResult::Recorded {
            commission_id: entry.id,
            sponsor_id: sponsor.id,
            amount,
            rule: quote.rule,
        })
    }
}
