// models/disputemodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    InProgress,
    Resolved,
}

impl DisputeStatus {
    pub fn can_transition_to(&self, to: DisputeStatus) -> bool {
        use DisputeStatus::*;
        // resolving straight from open is allowed when no admin was assigned
        matches!(
            (self, to),
            (Open, InProgress) | (Open, Resolved) | (InProgress, Resolved)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dispute {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub raised_by_id: Uuid,
    pub dispute_type: String,
    pub description: String,
    pub status: DisputeStatus,
    pub assigned_to_id: Option<Uuid>,
    pub resolution: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "refund_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

/// A refund request against either a payment or an escrow (exactly one).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Option<Uuid>,
    pub escrow_id: Option<Uuid>,
    pub requested_by_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub status: RefundStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispute_transitions() {
        use DisputeStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Resolved));

        assert!(!Resolved.can_transition_to(Open));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Open));
    }
}
