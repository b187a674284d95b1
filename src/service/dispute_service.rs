// service/dispute_service.rs
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{contractdb::ContractExt, db::DBClient, disputedb::DisputeExt},
    dtos::settlementdtos::OpenDisputeDto,
    models::{
        contractmodels::{Contract, ContractStatus},
        disputemodels::Dispute,
        usermodel::Actor,
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

#[derive(Debug, Serialize)]
pub struct DisputeOpenResult {
    pub dispute: Dispute,
    pub contract: Contract,
}

#[derive(Debug, Serialize)]
pub struct DisputeResolutionResult {
    pub dispute: Dispute,
    /// `None` when the contract was no longer in `disputed` (cancelled by
    /// an admin while frozen).
    pub contract: Option<Contract>,
}

/// Freezes and unfreezes contracts under dispute. While frozen, escrow
/// mutation is refused everywhere; resolution itself never moves funds.
#[derive(Debug, Clone)]
pub struct DisputeService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl DisputeService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn open(
        &self,
        actor: Actor,
        contract_id: Uuid,
        dto: OpenDisputeDto,
    ) -> Result<DisputeOpenResult, ServiceError> {
        dto.validate()?;
        let contract = self
            .db_client
            .get_contract(contract_id)
            .await?
            .ok_or(ServiceError::not_found("Contract", contract_id))?;

        if !contract.is_party(actor.id) {
            return Err(ServiceError::Forbidden(actor.id));
        }
        if contract.status != ContractStatus::Active {
            return Err(ServiceError::InvalidState(format!(
                "Disputes can only be opened on active contracts, contract is {:?}",
                contract.status
            )));
        }

        let (dispute, contract) = self
            .db_client
            .open_dispute(contract_id, actor.id, dto.dispute_type, dto.description)
            .await?
            .ok_or_else(|| {
                // the guarded flip lost a race with another status change
                ServiceError::InvalidState("Contract is no longer active".to_string())
            })?;

        tracing::info!(
            "dispute {} opened on contract {} by {}",
            dispute.id,
            contract_id,
            actor.id
        );
        if let Some(counterparty) = contract.counterparty(actor.id) {
            self.notification_service.notify_dispute_opened(
                dispute.id,
                contract_id,
                actor.id,
                counterparty,
            );
        }

        Ok(DisputeOpenResult { dispute, contract })
    }

    pub async fn assign(
        &self,
        actor: Actor,
        dispute_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Dispute, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(actor.id));
        }

        let dispute = self
            .db_client
            .assign_dispute(dispute_id, admin_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("Only open disputes can be assigned".to_string())
            })?;

        self.notification_service
            .notify_dispute_assigned(dispute.id, admin_id);
        Ok(dispute)
    }

    /// Stores the resolution and unfreezes the contract. Any escrow
    /// release or refund the resolution calls for is a separate, explicit
    /// EscrowManager invocation by the admin.
    pub async fn resolve(
        &self,
        actor: Actor,
        dispute_id: Uuid,
        resolution: String,
    ) -> Result<DisputeResolutionResult, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(actor.id));
        }
        if resolution.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Resolution text is required".to_string(),
            ));
        }

        let (dispute, contract) = self
            .db_client
            .resolve_dispute(dispute_id, resolution)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("Dispute is already resolved".to_string())
            })?;

        tracing::info!("dispute {} resolved by admin {}", dispute.id, actor.id);

        let parties = match &contract {
            Some(c) => vec![c.client_id, c.freelancer_id],
            None => vec![dispute.raised_by_id],
        };
        self.notification_service
            .notify_dispute_resolved(dispute.id, parties);

        Ok(DisputeResolutionResult { dispute, contract })
    }

    pub async fn get(&self, dispute_id: Uuid) -> Result<Dispute, ServiceError> {
        self.db_client
            .get_dispute(dispute_id)
            .await?
            .ok_or(ServiceError::not_found("Dispute", dispute_id))
    }

    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, ServiceError> {
        Ok(self
            .db_client
            .list_disputes_for_contract(contract_id)
            .await?)
    }
}
