pub mod accrual_service;
pub mod background_jobs;
pub mod enrollment_cascade;
pub mod error;
pub mod notification_service;
pub mod payout_service;
pub mod reconciliation_service;
pub mod row_source;
pub mod tier_resolver;
