// service/escrow_manager.rs
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        contractdb::ContractExt,
        db::DBClient,
        escrowdb::EscrowExt,
    },
    dtos::settlementdtos::{CreateEscrowDto, RefundEscrowDto, ReleaseEscrowDto},
    models::{
        contractmodels::{Contract, ContractStatus},
        escrowmodels::{Escrow, EscrowStatus},
        usermodel::Actor,
    },
    service::error::ServiceError,
    utils::currency::amount_to_cents,
};

/// Funds, releases and refunds contract-scoped escrow on top of the wallet
/// primitives. Every mutation is gated on the contract not being frozen by
/// a dispute.
#[derive(Debug, Clone)]
pub struct EscrowManager {
    db_client: Arc<DBClient>,
}

impl EscrowManager {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn create(
        &self,
        actor: Actor,
        contract_id: Uuid,
        dto: CreateEscrowDto,
    ) -> Result<Escrow, ServiceError> {
        dto.validate()?;
        let amount = amount_to_cents(dto.amount);

        let contract = self.require_contract(contract_id).await?;
        if actor.id != contract.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        match contract.status {
            ContractStatus::Pending | ContractStatus::Active => {}
            status => {
                return Err(ServiceError::InvalidState(format!(
                    "Cannot fund escrow on a {:?} contract",
                    status
                )))
            }
        }

        // debit + insert happen in one transaction; a refused debit leaves
        // nothing behind
        let escrow = self
            .db_client
            .fund_escrow(contract_id, contract.client_id, amount, dto.expires_at)
            .await?
            .ok_or(ServiceError::InsufficientFunds { required: amount })?;

        tracing::info!(
            "escrow {} funded with {} cents for contract {}",
            escrow.id,
            amount,
            contract_id
        );
        Ok(escrow)
    }

    pub async fn release(
        &self,
        actor: Actor,
        escrow_id: Uuid,
        dto: ReleaseEscrowDto,
    ) -> Result<Escrow, ServiceError> {
        dto.validate()?;
        let amount = amount_to_cents(dto.amount);

        let escrow = self.require_escrow(escrow_id).await?;
        if actor.id != escrow.client_id {
            return Err(ServiceError::Forbidden(actor.id));
        }
        let contract = self.require_contract(escrow.contract_id).await?;
        self.reject_if_disputed(&contract)?;

        if escrow.status != EscrowStatus::Active {
            return Err(ServiceError::InvalidState(format!(
                "Cannot release a {:?} escrow",
                escrow.status
            )));
        }
        if amount > escrow.remaining() {
            return Err(ServiceError::Validation(format!(
                "Release of {} cents exceeds remaining escrow balance of {}",
                amount,
                escrow.remaining()
            )));
        }

        let released = self
            .db_client
            .release_escrow(escrow_id, contract.freelancer_id, amount)
            .await?
            .ok_or_else(|| {
                // the guarded drawdown lost a race with another mutation
                ServiceError::InvalidState("Escrow is no longer releasable".to_string())
            })?;

        tracing::info!(
            "released {} cents from escrow {} to freelancer {}",
            amount,
            escrow_id,
            contract.freelancer_id
        );
        Ok(released)
    }

    pub async fn refund(
        &self,
        actor: Actor,
        escrow_id: Uuid,
        dto: RefundEscrowDto,
    ) -> Result<Escrow, ServiceError> {
        dto.validate()?;
        let amount = amount_to_cents(dto.amount);

        let escrow = self.require_escrow(escrow_id).await?;
        if actor.id != escrow.client_id && !actor.is_admin() {
            return Err(ServiceError::Forbidden(actor.id));
        }
        let contract = self.require_contract(escrow.contract_id).await?;
        self.reject_if_disputed(&contract)?;

        if !matches!(escrow.status, EscrowStatus::Active | EscrowStatus::Expired) {
            return Err(ServiceError::InvalidState(format!(
                "Cannot refund a {:?} escrow",
                escrow.status
            )));
        }
        if amount > escrow.remaining() {
            return Err(ServiceError::Validation(format!(
                "Refund of {} cents exceeds remaining escrow balance of {}",
                amount,
                escrow.remaining()
            )));
        }

        let refunded = self
            .db_client
            .refund_escrow(escrow_id, amount)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("Escrow is no longer refundable".to_string())
            })?;

        tracing::info!(
            "refunded {} cents from escrow {} to client {}",
            amount,
            escrow_id,
            escrow.client_id
        );
        Ok(refunded)
    }

    /// Lazy sweep: flip every overdue active escrow to expired. Called
    /// opportunistically on listing reads and from the scheduled worker,
    /// so correctness never depends on read traffic.
    pub async fn sweep_expired(&self) -> Result<Vec<Escrow>, ServiceError> {
        let expired = self.db_client.expire_due_escrows().await?;
        if !expired.is_empty() {
            tracing::info!("escrow sweep expired {} escrow(s)", expired.len());
        }
        Ok(expired)
    }

    pub async fn get(&self, escrow_id: Uuid) -> Result<Escrow, ServiceError> {
        self.require_escrow(escrow_id).await
    }

    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<Escrow>, ServiceError> {
        self.sweep_expired().await?;
        Ok(self.db_client.list_escrows_for_contract(contract_id).await?)
    }

    fn reject_if_disputed(&self, contract: &Contract) -> Result<(), ServiceError> {
        if contract.status == ContractStatus::Disputed {
            return Err(ServiceError::InvalidState(
                "Contract is frozen by an open dispute".to_string(),
            ));
        }
        Ok(())
    }

    async fn require_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        self.db_client
            .get_contract(contract_id)
            .await?
            .ok_or(ServiceError::not_found("Contract", contract_id))
    }

    async fn require_escrow(&self, escrow_id: Uuid) -> Result<Escrow, ServiceError> {
        self.db_client
            .get_escrow(escrow_id)
            .await?
            .ok_or(ServiceError::not_found("Escrow", escrow_id))
    }
}
