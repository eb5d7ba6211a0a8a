// service/tier_resolver.rs
use std::collections::HashSet;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    models::coursemodel::Course,
    service::error::ServiceError,
    utils::currency::floor_percent_of,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionRule {
    /// Sponsor owns no bundle: sold bundle's rate on the amount paid.
    SponsorHoldsNoBundle,
    /// Sold tier is at or below the sponsor's own: sold bundle's rate on the amount paid.
    SameOrLowerTier,
    /// Sold tier is above the sponsor's own: sponsor's rate on the sponsor's bundle price.
    CappedAtSponsorTier,
    /// Plain course, not a bundle: course rate on the amount paid.
    StandaloneCourse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionQuote {
    /// Whole rupees, floored.
    pub amount: i64,
    pub rule: CommissionRule,
    pub sponsor_bundle_id: Option<Uuid>,
}

/// The most expensive bundle the sponsor has access to. `bundles_by_price`
/// must be sorted cheapest first.
pub fn sponsor_held_bundle<'a>(bundles_by_price: &'a [Course], held: &HashSet<Uuid>) -> Option<&'a Course> {
    bundles_by_price.iter().filter(|bundle| held.contains(&bundle.id)).last()
}

pub fn resolve_commission(
    purchased: &Course,
    amount_paid: &BigDecimal,
    sponsor_bundle: Option<&Course>,
) -> CommissionQuote {
    if !purchased.is_bundle {
        return CommissionQuote {
            amount: floor_percent_of(&purchased.commission_percent, amount_paid),
            rule: CommissionRule::StandaloneCourse,
            sponsor_bundle_id: sponsor_bundle.map(|b| b.id),
        };
    }

    match sponsor_bundle {
        None => CommissionQuote {
            amount: floor_percent_of(&purchased.commission_percent, amount_paid),
            rule: CommissionRule::SponsorHoldsNoBundle,
            sponsor_bundle_id: None,
        },
        Some(held) if purchased.discounted_price <= held.discounted_price => CommissionQuote {
            amount: floor_percent_of(&purchased.commission_percent, amount_paid),
            rule: CommissionRule::SameOrLowerTier,
            sponsor_bundle_id: Some(held.id),
        },
        Some(held) => CommissionQuote {
            amount: floor_percent_of(&held.commission_percent, &held.discounted_price),
            rule: CommissionRule::CappedAtSponsorTier,
            sponsor_bundle_id: Some(held.id),
        },
    }
}

#[derive(Debug, Clone)]
pub struct TierResolver<S> {
    store: Arc<S>,
}

impl<S: Store> TierResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn quote(
        &self,
        sponsor_id: Uuid,
        purchased: &Course,
        amount_paid: &BigDecimal,
    ) -> Result<CommissionQuote, ServiceError> {
        let bundles = self.store.get_bundles_by_price().await?;
        let held: HashSet<Uuid> = self
            .store
            .get_accessible_course_ids(sponsor_id)
            .await?
            .into_iter()
            .collect();

        let sponsor_bundle = sponsor_held_bundle(&bundles, &held);
        let quote = resolve_commission(purchased, amount_paid, sponsor_bundle);

        tracing::debug!(
            sponsor_id = %sponsor_id,
            course_id = %purchased.id,
            rule = ?quote.rule,
            amount = quote.amount,
            "Commission quoted"
        );

        Ok(quote)
    }
}
