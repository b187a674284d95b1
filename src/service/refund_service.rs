// service/refund_service.rs
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        db::DBClient,
        escrowdb::EscrowExt,
        paymentdb::PaymentExt,
        refunddb::{RefundExt, RefundProcessing},
    },
    dtos::settlementdtos::CreateRefundDto,
    models::{disputemodels::Refund, usermodel::Actor},
    service::error::ServiceError,
    utils::currency::amount_to_cents,
};

/// Collaborator surface over Refund rows: request, admin review, and
/// processing of approved refunds.
#[derive(Debug, Clone)]
pub struct RefundService {
    db_client: Arc<DBClient>,
}

impl RefundService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn request(&self, actor: Actor, dto: CreateRefundDto) -> Result<Refund, ServiceError> {
        dto.validate()?;
        dto.validate_target().map_err(ServiceError::Validation)?;
        let amount = amount_to_cents(dto.amount);

        // the requester must be a party to whatever the refund targets
        if let Some(payment_id) = dto.payment_id {
            let payment = self
                .db_client
                .get_payment(payment_id)
                .await?
                .ok_or(ServiceError::not_found("Payment", payment_id))?;
            if payment.from_user_id != actor.id && payment.to_user_id != actor.id {
                return Err(ServiceError::Forbidden(actor.id));
            }
            if amount > payment.freelancer_amount {
                return Err(ServiceError::Validation(
                    "Refund exceeds the settled amount".to_string(),
                ));
            }
        }
        if let Some(escrow_id) = dto.escrow_id {
            let escrow = self
                .db_client
                .get_escrow(escrow_id)
                .await?
                .ok_or(ServiceError::not_found("Escrow", escrow_id))?;
            if escrow.client_id != actor.id && !actor.is_admin() {
                return Err(ServiceError::Forbidden(actor.id));
            }
            if amount > escrow.remaining() {
                return Err(ServiceError::Validation(
                    "Refund exceeds the remaining escrow balance".to_string(),
                ));
            }
        }

        Ok(self
            .db_client
            .create_refund(dto.payment_id, dto.escrow_id, actor.id, amount, dto.reason)
            .await?)
    }

    pub async fn review(
        &self,
        actor: Actor,
        refund_id: Uuid,
        approve: bool,
    ) -> Result<Refund, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(actor.id));
        }
        self.db_client
            .review_refund(refund_id, approve)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("Only pending refunds can be reviewed".to_string())
            })
    }

    /// Execute an approved refund. The status flip and the fund movement
    /// commit or roll back together.
    pub async fn process(&self, actor: Actor, refund_id: Uuid) -> Result<Refund, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(actor.id));
        }
        let refund = self
            .db_client
            .get_refund(refund_id)
            .await?
            .ok_or(ServiceError::not_found("Refund", refund_id))?;

        match self.db_client.process_refund(refund_id).await? {
            RefundProcessing::Processed { refund, escrow } => {
                tracing::info!(
                    "refund {} processed for {} cents ({})",
                    refund.id,
                    refund.amount,
                    if escrow.is_some() { "escrow" } else { "payment" }
                );
                Ok(refund)
            }
            RefundProcessing::InvalidState => Err(ServiceError::InvalidState(
                "Refund is not approved or its target cannot cover it".to_string(),
            )),
            RefundProcessing::InsufficientFunds => Err(ServiceError::InsufficientFunds {
                required: refund.amount,
            }),
        }
    }

    pub async fn get(&self, refund_id: Uuid) -> Result<Refund, ServiceError> {
        self.db_client
            .get_refund(refund_id)
            .await?
            .ok_or(ServiceError::not_found("Refund", refund_id))
    }
}
