pub mod bank;
pub mod currency;
pub mod token;
