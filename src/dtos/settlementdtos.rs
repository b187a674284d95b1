// dtos/settlementdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Request amounts cross the boundary as 2-decimal values and are converted
// to cents exactly once, at the service entry point.

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateEscrowDto {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReleaseEscrowDto {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefundEscrowDto {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMilestoneDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitMilestoneDto {
    #[validate(length(min = 1, message = "Deliverables are required"))]
    pub deliverables: String,

    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateDirectHireDto {
    pub freelancer_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OpenDisputeDto {
    #[validate(length(min = 1, max = 64, message = "Dispute type is required"))]
    pub dispute_type: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRefundDto {
    pub payment_id: Option<Uuid>,
    pub escrow_id: Option<Uuid>,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    #[serde(default)]
    pub reason: String,
}

impl CreateRefundDto {
    /// Exactly one target, never both, never neither.
    pub fn validate_target(&self) -> Result<(), String> {
        match (self.payment_id, self.escrow_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err("Refund must target a payment or an escrow, not both".into()),
            (None, None) => Err("Refund must target a payment or an escrow".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        let dto = CreateEscrowDto {
            amount: 1000.0,
            expires_at: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateEscrowDto {
            amount: 0.0,
            expires_at: None,
        };
        assert!(dto.validate().is_err());

        let dto = ReleaseEscrowDto { amount: -5.0 };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_refund_target_exclusivity() {
        let both = CreateRefundDto {
            payment_id: Some(Uuid::new_v4()),
            escrow_id: Some(Uuid::new_v4()),
            amount: 10.0,
            reason: String::new(),
        };
        assert!(both.validate_target().is_err());

        let neither = CreateRefundDto {
            payment_id: None,
            escrow_id: None,
            amount: 10.0,
            reason: String::new(),
        };
        assert!(neither.validate_target().is_err());

        let escrow_only = CreateRefundDto {
            payment_id: None,
            escrow_id: Some(Uuid::new_v4()),
            amount: 10.0,
            reason: String::new(),
        };
        assert!(escrow_only.validate_target().is_ok());
    }
}
