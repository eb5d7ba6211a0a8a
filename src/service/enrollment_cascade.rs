// service/enrollment_cascade.rs
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{coursemodel::Course, paymentmodel::Payment},
    service::error::ServiceError,
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct CascadeReport {
    pub enrolled: Vec<Uuid>,
    pub already_enrolled: Vec<Uuid>,
    pub missing: Vec<Uuid>,
}

/// Courses unlocked by buying `purchased`, in order and without repeats:
/// the purchase, its sub-courses, then each lower bundle followed by that
/// bundle's sub-courses.
pub fn cascade_targets(purchased: &Course, lower_bundles: &[Course]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    let mut push = |id: Uuid| {
        if seen.insert(id) {
            targets.push(id);
        }
    };

    push(purchased.id);
    purchased.related_course_ids.iter().copied().for_each(&mut push);

    for bundle in lower_bundles {
        push(bundle.id);
        bundle.related_course_ids.iter().copied().for_each(&mut push);
    }

    targets
}

#[derive(Debug, Clone)]
pub struct EnrollmentCascade<S> {
    store: Arc<S>,
}

impl<S: Store> EnrollmentCascade<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Enrolls the payer in everything the payment unlocks. Safe to replay:
    /// only missing enrollments are created, and counters move once per
    /// enrollment actually inserted.
    pub async fn enroll_for_payment(&self, payment: &Payment) -> Result<CascadeReport, ServiceError> {
        let mut report = CascadeReport::default();

        let Some(purchased) = self.store.get_course(payment.course_id).await? else {
            tracing::warn!(
                payment_id = %payment.id,
                course_id = %payment.course_id,
                "Purchased course missing, nothing to enroll"
            );
            report.missing.push(payment.course_id);
            return Ok(report);
        };

        let mut lower_bundles = Vec::with_capacity(purchased.related_bundle_ids.len());
        for bundle_id in &purchased.related_bundle_ids {
            match self.store.get_course(*bundle_id).await? {
                Some(bundle) => lower_bundles.push(bundle),
                None => {
                    tracing::warn!(bundle_id = %bundle_id, "Related bundle missing, skipping");
                    report.missing.push(*bundle_id);
                }
            }
        }

        let known: HashSet<Uuid> = std::iter::once(purchased.id)
            .chain(lower_bundles.iter().map(|b| b.id))
            .collect();

        for course_id in cascade_targets(&purchased, &lower_bundles) {
            if !known.contains(&course_id) && self.store.get_course(course_id).await?.is_none() {
                tracing::warn!(course_id = %course_id, "Related course missing, skipping");
                report.missing.push(course_id);
                continue;
            }

            if self.store.is_enrolled(payment.user_id, course_id).await? {
                report.already_enrolled.push(course_id);
                continue;
            }

            match self
                .store
                .create_enrollment(payment.user_id, course_id, payment.id)
                .await?
            {
                Some(_) => {
                    self.store.add_enrolled_course(payment.user_id, course_id).await?;
                    self.store.increment_enrolled_count(course_id).await?;
                    report.enrolled.push(course_id);
                }
                // Lost a race with a concurrent delivery.
                None => report.already_enrolled.push(course_id),
            }
        }

        tracing::info!(
            payment_id = %payment.id,
            user_id = %payment.user_id,
            enrolled = report.enrolled.len(),
            already_enrolled = report.already_enrolled.len(),
            missing = report.missing.len(),
            "Enrollment cascade finished"
        );

        Ok(report)
    }
}
