// db/memorydb.rs
//
// In-process store used by the service tests. Each trait method takes the
// lock once, so conditional updates and unique inserts behave atomically the
// same way the Postgres statements do.
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use num_traits::Zero;
use uuid::Uuid;

use super::{
    commissiondb::CommissionExt, coursedb::CourseExt, enrollmentdb::EnrollmentExt,
    paymentdb::PaymentExt, payoutdb::PayoutExt, userdb::UserExt,
};
use crate::models::{
    commissionmodel::{CommissionLedgerEntry, CommissionStatus, NewCommission, PendingAffiliate},
    coursemodel::{Course, Enrollment, EnrollmentStatus},
    paymentmodel::{Payment, PaymentStatus},
    payoutmodel::{NewPayout, Payout, PayoutStatus, Settlement},
    usermodel::{IndustryEarning, Kyc, KycStatus, User, UserRole},
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    kycs: Vec<Kyc>,
    earnings: Vec<IndustryEarning>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    payments: Vec<Payment>,
    commissions: Vec<CommissionLedgerEntry>,
    payouts: Vec<Payout>,
}

impl MemoryState {
    fn transition(&mut self, ids: &[Uuid], from: CommissionStatus, to: CommissionStatus) -> u64 {
        let mut moved = 0;
        for entry in self.commissions.iter_mut() {
            if ids.contains(&entry.id) && entry.status == from {
                entry.status = to;
                entry.updated_at = Utc::now();
                moved += 1;
            }
        }
        moved
    }

    fn payment_captured(&self, payment_id: Uuid) -> bool {
        self.payments
            .iter()
            .any(|p| p.id == payment_id && p.status == PaymentStatus::Captured)
    }
}

#[derive(Default)]
pub struct MemoryDB {
    state: Mutex<MemoryState>,
}

impl MemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) -> User {
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn insert_kyc(&self, kyc: Kyc) {
        self.state.lock().unwrap().kycs.push(kyc);
    }

    pub fn insert_course(&self, course: Course) -> Course {
        self.state.lock().unwrap().courses.push(course.clone());
        course
    }

    pub fn insert_payment(&self, payment: Payment) -> Payment {
        self.state.lock().unwrap().payments.push(payment.clone());
        payment
    }

    pub fn insert_enrollment(&self, user_id: Uuid, course_id: Uuid) {
        self.state.lock().unwrap().enrollments.push(Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            payment_id: None,
            status: EnrollmentStatus::Active,
            progress: 0,
            created_at: Utc::now(),
        });
    }

    pub fn insert_commission(&self, entry: CommissionLedgerEntry) -> CommissionLedgerEntry {
        self.state.lock().unwrap().commissions.push(entry.clone());
        entry
    }

    pub fn set_payout_created_at(&self, payout_id: Uuid, created_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        if let Some(payout) = state.payouts.iter_mut().find(|p| p.id == payout_id) {
            payout.created_at = created_at;
        }
    }

    pub fn commission(&self, id: Uuid) -> CommissionLedgerEntry {
        self.state
            .lock()
            .unwrap()
            .commissions
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("commission exists")
    }

    pub fn commissions(&self) -> Vec<CommissionLedgerEntry> {
        self.state.lock().unwrap().commissions.clone()
    }

    pub fn enrollments_for(&self, user_id: Uuid) -> Vec<Enrollment> {
        self.state
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn course(&self, id: Uuid) -> Course {
        self.state
            .lock()
            .unwrap()
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("course exists")
    }

    pub fn user(&self, id: Uuid) -> User {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("user exists")
    }

    pub fn payouts(&self) -> Vec<Payout> {
        self.state.lock().unwrap().payouts.clone()
    }
}

#[async_trait]
impl UserExt for MemoryDB {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.state.lock().unwrap().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let email = email.trim();
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<User>, sqlx::Error> {
        let code = code.trim();
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.referral_code == code)
            .cloned())
    }

    async fn get_kyc(&self, user_id: Uuid) -> Result<Option<Kyc>, sqlx::Error> {
        Ok(self.state.lock().unwrap().kycs.iter().find(|k| k.user_id == user_id).cloned())
    }

    async fn promote_to_affiliate(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state.users.iter_mut().find(|u| u.id == user_id && u.role == UserRole::User) {
            Some(user) => {
                user.role = UserRole::Affiliate;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state
            .users
            .iter_mut()
            .find(|u| u.id == user_id && !u.enrolled_course_ids.contains(&course_id))
        {
            Some(user) => {
                user.enrolled_course_ids.push(course_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_industry_earning(
        &self,
        user_id: Uuid,
        label: &str,
        amount: &BigDecimal,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state
            .earnings
            .iter_mut()
            .find(|e| e.user_id == user_id && e.label == label)
        {
            Some(earning) => {
                earning.total = &earning.total + amount;
                earning.updated_at = Utc::now();
            }
            None => state.earnings.push(IndustryEarning {
                user_id,
                label: label.to_string(),
                total: amount.clone(),
                updated_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn get_industry_earnings(&self, user_id: Uuid) -> Result<Vec<IndustryEarning>, sqlx::Error> {
        let mut earnings: Vec<IndustryEarning> = self
            .state
            .lock()
            .unwrap()
            .earnings
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        earnings.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
        Ok(earnings)
    }
}

#[async_trait]
impl CourseExt for MemoryDB {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, sqlx::Error> {
        Ok(self.state.lock().unwrap().courses.iter().find(|c| c.id == course_id).cloned())
    }

    async fn get_bundles_by_price(&self) -> Result<Vec<Course>, sqlx::Error> {
        let mut bundles: Vec<Course> = self
            .state
            .lock()
            .unwrap()
            .courses
            .iter()
            .filter(|c| c.is_bundle)
            .cloned()
            .collect();
        bundles.sort_by(|a, b| {
            a.price
                .cmp(&b.price)
                .then_with(|| a.bundle_position.unwrap_or(i32::MAX).cmp(&b.bundle_position.unwrap_or(i32::MAX)))
        });
        Ok(bundles)
    }

    async fn increment_enrolled_count(&self, course_id: Uuid) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(course) = state.courses.iter_mut().find(|c| c.id == course_id) {
            course.enrolled_count += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentExt for MemoryDB {
    async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id))
    }

    async fn create_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state
            .enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id)
        {
            return Ok(None);
        }
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            payment_id: Some(payment_id),
            status: EnrollmentStatus::Active,
            progress: 0,
            created_at: Utc::now(),
        };
        state.enrollments.push(enrollment.clone());
        Ok(Some(enrollment))
    }

    async fn get_accessible_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id && e.status.grants_access())
            .map(|e| e.course_id)
            .collect())
    }
}

#[async_trait]
impl PaymentExt for MemoryDB {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        Ok(self.state.lock().unwrap().payments.iter().find(|p| p.id == payment_id).cloned())
    }

    async fn get_payment_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .payments
            .iter()
            .find(|p| p.gateway_order_id == order_id)
            .cloned())
    }

    async fn claim_captured_payment(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        method: Option<&str>,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state
            .payments
            .iter_mut()
            .find(|p| {
                p.gateway_order_id == order_id
                    && matches!(p.status, PaymentStatus::Created | PaymentStatus::Failed)
            })
        {
            Some(payment) => {
                payment.status = PaymentStatus::Captured;
                payment.gateway_payment_id = Some(gateway_payment_id.to_string());
                if let Some(method) = method {
                    payment.method = Some(method.to_string());
                }
                payment.captured_at = Some(Utc::now());
                Ok(Some(payment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_payment_failed(&self, order_id: &str) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        match state
            .payments
            .iter_mut()
            .find(|p| p.gateway_order_id == order_id && p.status == PaymentStatus::Created)
        {
            Some(payment) => {
                payment.status = PaymentStatus::Failed;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CommissionExt for MemoryDB {
    async fn record_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Option<CommissionLedgerEntry>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state
            .commissions
            .iter()
            .any(|c| c.user_id == commission.user_id && c.transaction_id == commission.transaction_id)
        {
            return Ok(None);
        }
        let now = Utc::now();
        let entry = CommissionLedgerEntry {
            id: Uuid::new_v4(),
            user_id: commission.user_id,
            referral_user_id: commission.referral_user_id,
            transaction_id: commission.transaction_id,
            bundle_course_id: commission.bundle_course_id,
            amount: commission.amount.clone(),
            status: CommissionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.commissions.push(entry.clone());
        Ok(Some(entry))
    }

    async fn list_pending_commissions(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<CommissionLedgerEntry> = state
            .commissions
            .iter()
            .filter(|c| {
                c.user_id == user_id
                    && c.status == CommissionStatus::Pending
                    && c.created_at >= from
                    && c.created_at < to
                    && state.payment_captured(c.transaction_id)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|c| c.created_at);
        Ok(entries)
    }

    async fn list_unpaid_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .commissions
            .iter()
            .filter(|c| c.user_id == user_id && c.status == CommissionStatus::Unpaid && c.created_at < before)
            .cloned()
            .collect())
    }

    async fn list_user_commissions(&self, user_id: Uuid) -> Result<Vec<CommissionLedgerEntry>, sqlx::Error> {
        let mut entries: Vec<CommissionLedgerEntry> = self
            .state
            .lock()
            .unwrap()
            .commissions
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn list_affiliates_with_pending(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PendingAffiliate>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut grouped: HashMap<Uuid, (BigDecimal, i64)> = HashMap::new();
        for c in state.commissions.iter().filter(|c| {
            c.status == CommissionStatus::Pending
                && c.created_at >= from
                && c.created_at < to
                && state.payment_captured(c.transaction_id)
        }) {
            let slot = grouped.entry(c.user_id).or_insert((BigDecimal::zero(), 0));
            slot.0 = &slot.0 + &c.amount;
            slot.1 += 1;
        }

        let mut affiliates: Vec<PendingAffiliate> = grouped
            .into_iter()
            .filter_map(|(user_id, (pending_total, entry_count))| {
                state.users.iter().find(|u| u.id == user_id).map(|u| PendingAffiliate {
                    user_id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    kyc_status: u.kyc_status,
                    pending_total,
                    entry_count,
                })
            })
            .collect();
        affiliates.sort_by(|a, b| b.pending_total.cmp(&a.pending_total));
        Ok(affiliates)
    }

    async fn mark_commissions_approved(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .transition(ids, CommissionStatus::Pending, CommissionStatus::Approved))
    }

    async fn mark_commissions_paid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .transition(ids, CommissionStatus::Approved, CommissionStatus::Paid))
    }

    async fn mark_commissions_unpaid(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .transition(ids, CommissionStatus::Approved, CommissionStatus::Unpaid))
    }
}

#[async_trait]
impl PayoutExt for MemoryDB {
    async fn approve_and_create_payout(&self, payout: &NewPayout) -> Result<Option<Payout>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let all_pending = payout.commission_ids.iter().all(|id| {
            state
                .commissions
                .iter()
                .any(|c| c.id == *id && c.status == CommissionStatus::Pending)
        });
        if !all_pending {
            return Ok(None);
        }

        state.transition(&payout.commission_ids, CommissionStatus::Pending, CommissionStatus::Approved);

        let now = Utc::now();
        let created = Payout {
            id: Uuid::new_v4(),
            user_id: payout.user_id,
            commission_ids: payout.commission_ids.clone(),
            week_start: payout.week_start,
            week_end: payout.week_end,
            total_amount: payout.total_amount.clone(),
            tds_amount: payout.tds.amount.clone(),
            tds_percent: payout.tds.percent.clone(),
            net_amount: payout.net_amount.clone(),
            beneficiary_name: payout.beneficiary.name.clone(),
            account_number: payout.beneficiary.account_number.clone(),
            ifsc_code: payout.beneficiary.ifsc_code.clone(),
            beneficiary_email: payout.beneficiary.email.clone(),
            status: PayoutStatus::Approved,
            remarks: payout.remarks.clone(),
            transaction_type: None,
            transaction_date: None,
            utr_number: None,
            instruction_file: None,
            created_at: now,
            updated_at: now,
        };
        state.payouts.push(created.clone());
        Ok(Some(created))
    }

    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<Payout>, sqlx::Error> {
        Ok(self.state.lock().unwrap().payouts.iter().find(|p| p.id == payout_id).cloned())
    }

    async fn find_reconcilable_payouts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Payout>, sqlx::Error> {
        let mut payouts: Vec<Payout> = self
            .state
            .lock()
            .unwrap()
            .payouts
            .iter()
            .filter(|p| p.user_id == user_id && p.status == PayoutStatus::Approved && p.created_at >= since)
            .cloned()
            .collect();
        payouts.sort_by_key(|p| p.created_at);
        Ok(payouts)
    }

    async fn settle_payout(
        &self,
        payout_id: Uuid,
        settlement: &Settlement,
    ) -> Result<Option<Payout>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let settled = match state
            .payouts
            .iter_mut()
            .find(|p| p.id == payout_id && p.status == PayoutStatus::Approved)
        {
            Some(payout) => {
                payout.status = settlement.payout_status();
                payout.transaction_type = Some(settlement.transaction_type.clone());
                payout.transaction_date = Some(settlement.transaction_date);
                payout.utr_number = settlement.utr_number.clone();
                payout.remarks = Some(settlement.remarks.clone());
                payout.updated_at = Utc::now();
                payout.clone()
            }
            None => return Ok(None),
        };

        let target = if settlement.succeeded {
            CommissionStatus::Paid
        } else {
            CommissionStatus::Unpaid
        };
        state.transition(&settled.commission_ids, CommissionStatus::Approved, target);
        Ok(Some(settled))
    }

    async fn list_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, sqlx::Error> {
        let mut payouts: Vec<Payout> = self
            .state
            .lock()
            .unwrap()
            .payouts
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        payouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payouts)
    }

    async fn claim_unexported_payouts(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
        file_name: &str,
    ) -> Result<Vec<Payout>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let mut claimed = Vec::new();
        for payout in state.payouts.iter_mut() {
            if payout.week_start == week_start
                && payout.week_end == week_end
                && payout.status == PayoutStatus::Approved
                && payout.instruction_file.is_none()
            {
                payout.instruction_file = Some(file_name.to_string());
                payout.updated_at = Utc::now();
                claimed.push(payout.clone());
            }
        }
        claimed.sort_by_key(|p| p.created_at);
        Ok(claimed)
    }

    async fn release_payout_export(&self, file_name: &str) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let mut released = 0;
        for payout in state.payouts.iter_mut() {
            if payout.status == PayoutStatus::Approved
                && payout.instruction_file.as_deref() == Some(file_name)
            {
                payout.instruction_file = None;
                payout.updated_at = Utc::now();
                released += 1;
            }
        }
        Ok(released)
    }
}

/// Builders for test records.
pub mod fixtures {
    use super::*;

    pub fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    pub fn user(name: &str, referral_code: &str, referred_by: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            referral_code: referral_code.to_string(),
            referred_by: referred_by.map(str::to_string),
            role: UserRole::User,
            kyc_status: KycStatus::NotSubmitted,
            enrolled_course_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approved_kyc_user(name: &str, referral_code: &str) -> User {
        User {
            role: UserRole::Affiliate,
            kyc_status: KycStatus::Approved,
            ..user(name, referral_code, None)
        }
    }

    pub fn kyc(user_id: Uuid, name: &str) -> Kyc {
        let now = Utc::now();
        Kyc {
            id: Uuid::new_v4(),
            user_id,
            beneficiary_name: Some(name.to_string()),
            account_number: Some("123456789012".to_string()),
            ifsc_code: Some("HDFC0001234".to_string()),
            bank_name: Some("HDFC Bank".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn course(title: &str, price: &str, percent: &str) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            is_bundle: false,
            price: dec(price),
            discounted_price: dec(price),
            commission_percent: dec(percent),
            bundle_position: None,
            industry: None,
            related_course_ids: Vec::new(),
            related_bundle_ids: Vec::new(),
            enrolled_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bundle(title: &str, price: &str, percent: &str) -> Course {
        Course {
            is_bundle: true,
            ..course(title, price, percent)
        }
    }

    pub fn payment(user_id: Uuid, course_id: Uuid, amount: &str, order_id: &str) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            gateway_order_id: order_id.to_string(),
            gateway_payment_id: None,
            amount: dec(amount),
            currency: "INR".to_string(),
            method: None,
            status: PaymentStatus::Created,
            created_at: Utc::now(),
            captured_at: None,
        }
    }

    pub fn captured_payment(user_id: Uuid, course_id: Uuid, amount: &str) -> Payment {
        Payment {
            status: PaymentStatus::Captured,
            gateway_payment_id: Some(format!("pay_{}", Uuid::new_v4().simple())),
            captured_at: Some(Utc::now()),
            ..payment(user_id, course_id, amount, &format!("order_{}", Uuid::new_v4().simple()))
        }
    }

    pub fn commission(
        user_id: Uuid,
        payment: &Payment,
        amount: &str,
        status: CommissionStatus,
        created_at: DateTime<Utc>,
    ) -> CommissionLedgerEntry {
        CommissionLedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            referral_user_id: payment.user_id,
            transaction_id: payment.id,
            bundle_course_id: payment.course_id,
            amount: dec(amount),
            status,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn test_ledger_transitions_require_prior_state() {
        let db = MemoryDB::new();
        let buyer = db.insert_user(user("Buyer", "BUY1", None));
        let course = db.insert_course(bundle("A", "1000", "10"));
        let payment = db.insert_payment(captured_payment(buyer.id, course.id, "1000"));
        let affiliate = Uuid::new_v4();
        let entry = db.insert_commission(commission(
            affiliate,
            &payment,
            "100",
            CommissionStatus::Pending,
            Utc::now(),
        ));

        // paid requires approved
        assert_eq!(db.mark_commissions_paid(&[entry.id]).await.unwrap(), 0);
        assert_eq!(db.commission(entry.id).status, CommissionStatus::Pending);

        assert_eq!(db.mark_commissions_approved(&[entry.id]).await.unwrap(), 1);
        assert_eq!(db.mark_commissions_approved(&[entry.id]).await.unwrap(), 0);

        assert_eq!(db.mark_commissions_unpaid(&[entry.id]).await.unwrap(), 1);
        assert_eq!(db.commission(entry.id).status, CommissionStatus::Unpaid);
        assert_eq!(db.mark_commissions_paid(&[entry.id]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_commission_is_unique_per_affiliate_and_payment() {
        let db = MemoryDB::new();
        let new = NewCommission {
            user_id: Uuid::new_v4(),
            referral_user_id: Uuid::new_v4(),
            transaction_id: Uuid::new_v4(),
            bundle_course_id: Uuid::new_v4(),
            amount: dec("400"),
        };

        assert!(db.record_commission(&new).await.unwrap().is_some());
        assert!(db.record_commission(&new).await.unwrap().is_none());
        assert_eq!(db.commissions().len(), 1);
    }
}
