// models/milestonemodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "milestone_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl MilestoneStatus {
    /// `Approved` is terminal; `Rejected` loops back to `Pending` for
    /// resubmission.
    pub fn can_transition_to(&self, to: MilestoneStatus) -> bool {
        use MilestoneStatus::*;
        matches!(
            (self, to),
            (Pending, Submitted) | (Submitted, Approved) | (Submitted, Rejected) | (Rejected, Pending)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Milestone {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub status: MilestoneStatus,
    pub deliverables: Option<String>,
    pub notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Closed set of fields a caller may change on a pending milestone.
/// Anything outside this set is rejected at the boundary instead of being
/// splatted onto the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MilestoneUpdate {
    SetTitle(String),
    SetDescription(String),
    SetAmount(i64),
    SetNotes(String),
}

impl MilestoneUpdate {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MilestoneUpdate::SetTitle(t) if t.trim().is_empty() => {
                Err("Title cannot be empty".to_string())
            }
            MilestoneUpdate::SetAmount(a) if *a <= 0 => {
                Err("Amount must be positive".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_transitions() {
        use MilestoneStatus::*;
        assert!(Pending.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));

        // approved is terminal
        assert!(!Approved.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Submitted));
        assert!(!Approved.can_transition_to(Rejected));
        // no skipping submission
        assert!(!Pending.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Rejected));
    }

    #[test]
    fn test_update_command_validation() {
        assert!(MilestoneUpdate::SetTitle("Design pass".into()).validate().is_ok());
        assert!(MilestoneUpdate::SetTitle("  ".into()).validate().is_err());
        assert!(MilestoneUpdate::SetAmount(40_000).validate().is_ok());
        assert!(MilestoneUpdate::SetAmount(0).validate().is_err());
        assert!(MilestoneUpdate::SetAmount(-100).validate().is_err());
        assert!(MilestoneUpdate::SetNotes(String::new()).validate().is_ok());
    }
}
