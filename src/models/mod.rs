pub mod contractmodels;
pub mod disputemodels;
pub mod escrowmodels;
pub mod milestonemodels;
pub mod paymentmodels;
pub mod usermodel;
pub mod walletmodels;
