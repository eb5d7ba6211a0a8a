pub mod commissiondb;
pub mod coursedb;
pub mod db;
pub mod enrollmentdb;
#[cfg(test)]
pub mod memorydb;
pub mod paymentdb;
pub mod payoutdb;
pub mod userdb;

use commissiondb::CommissionExt;
use coursedb::CourseExt;
use enrollmentdb::EnrollmentExt;
use paymentdb::PaymentExt;
use payoutdb::PayoutExt;
use userdb::UserExt;

/// Everything the commission and payout pipeline needs from persistence.
pub trait Store:
    UserExt + CourseExt + EnrollmentExt + PaymentExt + CommissionExt + PayoutExt + Send + Sync + 'static
{
}

impl<T> Store for T where
    T: UserExt + CourseExt + EnrollmentExt + PaymentExt + CommissionExt + PayoutExt + Send + Sync + 'static
{
}
