// service/milestone_service.rs
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        contractdb::ContractExt,
        db::DBClient,
        milestonedb::{MilestoneExt, MilestoneSettlement},
    },
    dtos::settlementdtos::{CreateMilestoneDto, SubmitMilestoneDto},
    models::{
        contractmodels::{Contract, ContractStatus},
        milestonemodels::{Milestone, MilestoneStatus, MilestoneUpdate},
        paymentmodels::{Invoice, Payment},
        usermodel::Actor,
    },
    service::{error::ServiceError, notification_service::NotificationService},
    utils::currency::{amount_to_cents, split_settlement},
};

#[derive(Debug, Serialize)]
pub struct MilestoneSettlementResult {
    pub milestone: Milestone,
    pub payment: Payment,
    pub invoice: Invoice,
}

/// Tracks contract work units through submission and approval, and drives
/// settlement on approval.
#[derive(Debug, Clone)]
pub struct MilestoneService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    fee_bps: i64,
}

impl MilestoneService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        fee_bps: i64,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            fee_bps,
        }
    }

    pub async fn create(
        &self,
        actor: Actor,
        contract_id: Uuid,
        dto: CreateMilestoneDto,
    ) -> Result<Milestone, ServiceError> {
        dto.validate()?;
        let contract = self.require_contract(contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        if contract.status != ContractStatus::Active {
            return Err(ServiceError::InvalidState(format!(
                "Cannot add milestones to a {:?} contract",
                contract.status
            )));
        }

        Ok(self
            .db_client
            .create_milestone(
                contract_id,
                dto.title,
                dto.description,
                amount_to_cents(dto.amount),
            )
            .await?)
    }

    pub async fn submit(
        &self,
        actor: Actor,
        milestone_id: Uuid,
        dto: SubmitMilestoneDto,
    ) -> Result<Milestone, ServiceError> {
        dto.validate()?;
        let milestone = self.require_milestone(milestone_id).await?;
        let contract = self.require_contract(milestone.contract_id).await?;
        if actor.id != contract.freelancer_id {
            return Err(ServiceError::Forbidden(actor.id));
        }

        self.db_client
            .submit_milestone(milestone_id, dto.deliverables, dto.notes)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Milestone is {:?}, only pending milestones can be submitted",
                    milestone.status
                ))
            })
    }

    /// Approval settles the milestone: fee split, escrow drawdown (or
    /// direct debit), freelancer credit, payment and invoice — one
    /// transaction in the db layer. A second approve finds the milestone
    /// already approved and fails with `InvalidState`; exactly one Payment
    /// ever exists per milestone.
    pub async fn approve(
        &self,
        actor: Actor,
        milestone_id: Uuid,
        notes: Option<String>,
    ) -> Result<MilestoneSettlementResult, ServiceError> {
        let milestone = self.require_milestone(milestone_id).await?;
        let contract = self.require_contract(milestone.contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        if contract.status == ContractStatus::Disputed {
            return Err(ServiceError::InvalidState(
                "Contract is frozen by an open dispute".to_string(),
            ));
        }
        if milestone.status != MilestoneStatus::Submitted {
            return Err(ServiceError::InvalidState(format!(
                "Milestone is {:?}, only submitted milestones can be approved",
                milestone.status
            )));
        }

        let (platform_fee, freelancer_amount) = split_settlement(milestone.amount, self.fee_bps);

        let outcome = self
            .db_client
            .settle_milestone(milestone_id, &contract, platform_fee, freelancer_amount, notes)
            .await?;

        match outcome {
            MilestoneSettlement::Settled {
                milestone,
                payment,
                invoice,
            } => {
                tracing::info!(
                    "milestone {} settled: {} cents to freelancer {}, fee {} cents, invoice {}",
                    milestone.id,
                    freelancer_amount,
                    contract.freelancer_id,
                    platform_fee,
                    invoice.invoice_number
                );
                self.notification_service.notify_milestone_approved(
                    milestone.id,
                    contract.freelancer_id,
                    freelancer_amount,
                );
                Ok(MilestoneSettlementResult {
                    milestone,
                    payment,
                    invoice,
                })
            }
            MilestoneSettlement::NotSubmitted => Err(ServiceError::InvalidState(
                "Milestone is no longer awaiting approval".to_string(),
            )),
            MilestoneSettlement::InsufficientFunds => Err(ServiceError::InsufficientFunds {
                required: milestone.amount,
            }),
        }
    }

    pub async fn reject(
        &self,
        actor: Actor,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Milestone, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Rejection reason is required".to_string(),
            ));
        }
        let milestone = self.require_milestone(milestone_id).await?;
        let contract = self.require_contract(milestone.contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }

        self.db_client
            .reject_milestone(milestone_id, reason)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Milestone is {:?}, only submitted milestones can be rejected",
                    milestone.status
                ))
            })
    }

    pub async fn delete(&self, actor: Actor, milestone_id: Uuid) -> Result<(), ServiceError> {
        let milestone = self.require_milestone(milestone_id).await?;
        let contract = self.require_contract(milestone.contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }

        if self.db_client.delete_milestone(milestone_id).await? {
            Ok(())
        } else {
            Err(ServiceError::InvalidState(
                "Only pending milestones can be deleted".to_string(),
            ))
        }
    }

    pub async fn update(
        &self,
        actor: Actor,
        milestone_id: Uuid,
        updates: Vec<MilestoneUpdate>,
    ) -> Result<Milestone, ServiceError> {
        if updates.is_empty() {
            return Err(ServiceError::Validation("No updates supplied".to_string()));
        }
        for update in &updates {
            update.validate().map_err(ServiceError::Validation)?;
        }

        let milestone = self.require_milestone(milestone_id).await?;
        let contract = self.require_contract(milestone.contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }

        self.db_client
            .update_milestone(milestone_id, &updates)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("Only pending milestones can be updated".to_string())
            })
    }

    pub async fn get(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.require_milestone(milestone_id).await
    }

    pub async fn list_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<Milestone>, ServiceError> {
        Ok(self
            .db_client
            .list_milestones_for_contract(contract_id)
            .await?)
    }

    async fn require_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        self.db_client
            .get_contract(contract_id)
            .await?
            .ok_or(ServiceError::not_found("Contract", contract_id))
    }

    async fn require_milestone(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.db_client
            .get_milestone(milestone_id)
            .await?
            .ok_or(ServiceError::not_found("Milestone", milestone_id))
    }
}
