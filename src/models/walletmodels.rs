// models/walletmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which bucket of a wallet a credit lands in. Debits only ever touch
/// `Available`; escrow funding moves value between buckets of the same
/// wallet so the row total stays constant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceBucket {
    Available,
    Pending,
    Escrow,
}

impl BalanceBucket {
    /// Column name for the bucket. Closed set, so this can never splat an
    /// arbitrary field into the UPDATE.
    pub fn column(&self) -> &'static str {
        match self {
            BalanceBucket::Available => "available",
            BalanceBucket::Pending => "pending",
            BalanceBucket::Escrow => "escrow",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletBalance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub available: i64,
    pub pending: i64,
    pub escrow: i64,
    pub currency: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WalletBalance {
    pub fn total(&self) -> i64 {
        self.available + self.pending + self.escrow
    }
}

/// Read-model returned by `WalletLedger::get_balance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceView {
    pub user_id: Uuid,
    pub available: i64,
    pub pending: i64,
    pub escrow: i64,
    pub total: i64,
    pub currency: String,
}

impl From<WalletBalance> for BalanceView {
    fn from(w: WalletBalance) -> Self {
        let total = w.total();
        Self {
            user_id: w.user_id,
            available: w.available,
            pending: w.pending,
            escrow: w.escrow,
            total,
            currency: w.currency,
        }
    }
}

pub fn generate_payment_reference() -> String {
    format!(
        "GPY_{}",
        uuid::Uuid::new_v4()
            .to_string()
            .replace("-", "")
            .to_uppercase()[..16]
            .to_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let r = generate_payment_reference();
        assert!(r.starts_with("GPY_"));
        assert_eq!(r.len(), 20);
        assert_ne!(r, generate_payment_reference());
    }

    #[test]
    fn test_bucket_columns_closed_set() {
        assert_eq!(BalanceBucket::Available.column(), "available");
        assert_eq!(BalanceBucket::Pending.column(), "pending");
        assert_eq!(BalanceBucket::Escrow.column(), "escrow");
    }
}
