// service/payment_recorder.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, paymentdb::PaymentExt},
    models::paymentmodels::{Invoice, Payment},
    service::error::ServiceError,
};

/// Read surface over the immutable audit trail (Payment, Invoice). The
/// rows themselves are written by the settlement transactions in the db
/// layer; funds have always moved by the time a row exists.
#[derive(Debug, Clone)]
pub struct PaymentRecorder {
    db_client: Arc<DBClient>,
}

impl PaymentRecorder {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        self.db_client
            .get_payment(payment_id)
            .await?
            .ok_or(ServiceError::not_found("Payment", payment_id))
    }

    pub async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, ServiceError> {
        Ok(self.db_client.get_payment_by_reference(reference).await?)
    }

    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.list_payments_for_contract(contract_id).await?)
    }

    pub async fn get_invoice(&self, payment_id: Uuid) -> Result<Invoice, ServiceError> {
        self.db_client
            .get_invoice_for_payment(payment_id)
            .await?
            .ok_or(ServiceError::not_found("Invoice", payment_id))
    }
}
