pub mod contractdb;
pub mod db;
pub mod disputedb;
pub mod escrowdb;
pub mod milestonedb;
pub mod paymentdb;
pub mod refunddb;
pub mod walletdb;
