pub mod background_jobs;
pub mod contract_service;
pub mod dispute_service;
pub mod error;
pub mod escrow_manager;
pub mod milestone_service;
pub mod notification_service;
pub mod payment_recorder;
pub mod refund_service;
pub mod wallet_ledger;
