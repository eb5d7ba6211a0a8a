pub mod commissionmodel;
pub mod coursemodel;
pub mod paymentmodel;
pub mod payoutmodel;
pub mod usermodel;
