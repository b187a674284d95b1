// models/contractmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "contract_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Pending,
    Active,
    Completed,
    Disputed,
    Cancelled,
}

impl ContractStatus {
    /// Whether the lifecycle permits moving from `self` to `to`.
    /// `Disputed` is entered/left only through the dispute path and
    /// `Cancelled`/`Completed` are terminal.
    pub fn can_transition_to(&self, to: ContractStatus) -> bool {
        use ContractStatus::*;
        matches!(
            (self, to),
            (Pending, Active)
                | (Pending, Cancelled)
                | (Active, Completed)
                | (Active, Disputed)
                | (Active, Cancelled)
                | (Disputed, Active)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contract {
    pub id: Uuid,
    pub project_id: Uuid,
    pub proposal_id: Uuid,
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: i64,
    pub status: ContractStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contract {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.freelancer_id == user_id
    }

    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.client_id {
            Some(self.freelancer_id)
        } else if user_id == self.freelancer_id {
            Some(self.client_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub project_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: i64,
    pub accepted: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_transitions() {
        use ContractStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Disputed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(Disputed.can_transition_to(Active));

        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Disputed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Disputed));
    }

    fn contract(client: Uuid, freelancer: Uuid) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            proposal_id: Uuid::new_v4(),
            client_id: client,
            freelancer_id: freelancer,
            amount: 100_000,
            status: ContractStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_party_checks() {
        let client = Uuid::new_v4();
        let freelancer = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let c = contract(client, freelancer);

        assert!(c.is_party(client));
        assert!(c.is_party(freelancer));
        assert!(!c.is_party(stranger));
        assert_eq!(c.counterparty(client), Some(freelancer));
        assert_eq!(c.counterparty(freelancer), Some(client));
        assert_eq!(c.counterparty(stranger), None);
    }
}
