// models/escrowmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "escrow_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    Pending,
    Active,
    Released,
    Refunded,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Escrow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub client_id: Uuid,
    pub amount: i64,
    pub released_amount: i64,
    pub status: EscrowStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Escrow {
    /// Funds not yet drawn down by releases or refunds.
    pub fn remaining(&self) -> i64 {
        self.amount - self.released_amount
    }

    /// A release of `amount` is legal only against an active escrow and
    /// only up to the undrawn remainder.
    pub fn can_release(&self, amount: i64) -> bool {
        self.status == EscrowStatus::Active && amount > 0 && amount <= self.remaining()
    }

    /// Refunds are legal against active and expired escrows, bounded by the
    /// same drawdown counter as releases.
    pub fn can_refund(&self, amount: i64) -> bool {
        matches!(self.status, EscrowStatus::Active | EscrowStatus::Expired)
            && amount > 0
            && amount <= self.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escrow(status: EscrowStatus, amount: i64, released: i64) -> Escrow {
        Escrow {
            id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            amount,
            released_amount: released,
            status,
            expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_release_bounds() {
        let e = escrow(EscrowStatus::Active, 100_000, 40_000);
        assert_eq!(e.remaining(), 60_000);
        assert!(e.can_release(60_000));
        assert!(!e.can_release(60_001));
        assert!(!e.can_release(0));
        assert!(!e.can_release(-5));
    }

    #[test]
    fn test_release_requires_active() {
        for status in [
            EscrowStatus::Pending,
            EscrowStatus::Released,
            EscrowStatus::Refunded,
            EscrowStatus::Expired,
        ] {
            assert!(!escrow(status, 100_000, 0).can_release(1));
        }
    }

    #[test]
    fn test_refund_allows_expired() {
        assert!(escrow(EscrowStatus::Expired, 100_000, 40_000).can_refund(60_000));
        assert!(escrow(EscrowStatus::Active, 100_000, 0).can_refund(100_000));
        assert!(!escrow(EscrowStatus::Refunded, 100_000, 40_000).can_refund(1));
        assert!(!escrow(EscrowStatus::Released, 100_000, 100_000).can_refund(1));
    }

    #[test]
    fn test_lifetime_drawdown_never_exceeds_amount() {
        // releases and refunds share released_amount, so once drained
        // nothing further can move out
        let e = escrow(EscrowStatus::Active, 100_000, 100_000);
        assert_eq!(e.remaining(), 0);
        assert!(!e.can_release(1));
        assert!(!e.can_refund(1));
    }
}
