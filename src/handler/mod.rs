pub mod commission;
pub mod payment;
pub mod payout;
