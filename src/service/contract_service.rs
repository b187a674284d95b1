// service/contract_service.rs
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{contractdb::ContractExt, db::DBClient},
    dtos::settlementdtos::CreateDirectHireDto,
    models::{
        contractmodels::{Contract, ContractStatus, Project, Proposal},
        usermodel::Actor,
    },
    service::error::ServiceError,
    utils::currency::amount_to_cents,
};

#[derive(Debug, Serialize)]
pub struct DirectHireResult {
    pub project: Project,
    pub proposal: Proposal,
    pub contract: Contract,
}

/// Owns contract status and direct-hire creation.
#[derive(Debug, Clone)]
pub struct ContractService {
    db_client: Arc<DBClient>,
}

impl ContractService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Direct hire writes project, accepted proposal and contract as one
    /// transaction.
    pub async fn create_direct_hire(
        &self,
        actor: Actor,
        dto: CreateDirectHireDto,
    ) -> Result<DirectHireResult, ServiceError> {
        dto.validate()?;
        if actor.id == dto.freelancer_id {
            return Err(ServiceError::Validation(
                "Client and freelancer must be different users".to_string(),
            ));
        }

        let (project, proposal, contract) = self
            .db_client
            .create_direct_hire(
                actor.id,
                dto.freelancer_id,
                dto.title,
                dto.description,
                amount_to_cents(dto.amount),
            )
            .await?;

        tracing::info!(
            "direct hire: contract {} between client {} and freelancer {}",
            contract.id,
            contract.client_id,
            contract.freelancer_id
        );
        Ok(DirectHireResult {
            project,
            proposal,
            contract,
        })
    }

    pub async fn activate(&self, actor: Actor, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.require_contract(contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        self.db_client
            .update_contract_status(contract_id, ContractStatus::Pending, ContractStatus::Active)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Contract is {:?}, only pending contracts can be activated",
                    contract.status
                ))
            })
    }

    pub async fn complete(&self, actor: Actor, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.require_contract(contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        self.db_client
            .update_contract_status(contract_id, ContractStatus::Active, ContractStatus::Completed)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Contract is {:?}, only active contracts can be completed",
                    contract.status
                ))
            })
    }

    /// Soft transition; the row is retained. Funded escrow is NOT refunded
    /// here — that is an explicit, separately invoked EscrowManager call.
    pub async fn cancel(&self, actor: Actor, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.require_contract(contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        self.db_client
            .cancel_contract(contract_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "Contract is {:?}, only pending or active contracts can be cancelled",
                    contract.status
                ))
            })
    }

    pub async fn get(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        self.require_contract(contract_id).await
    }

    async fn require_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        self.db_client
            .get_contract(contract_id)
            .await?
            .ok_or(ServiceError::not_found("Contract", contract_id))
    }
}
