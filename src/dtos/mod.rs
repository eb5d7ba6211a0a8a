pub mod commissiondtos;
pub mod payoutdtos;
