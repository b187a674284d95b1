// db/refunddb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use super::{escrowdb, paymentdb, walletdb};
use crate::models::disputemodels::{Refund, RefundStatus};
use crate::models::escrowmodels::Escrow;
use crate::models::walletmodels::BalanceBucket;

const REFUND_COLUMNS: &str = r#"
    id,
    payment_id,
    escrow_id,
    requested_by_id,
    amount,
    reason,
    status,
    created_at,
    updated_at
"#;

/// Outcome of processing an approved refund.
#[derive(Debug)]
pub enum RefundProcessing {
    Processed {
        refund: Refund,
        escrow: Option<Escrow>,
    },
    /// Refund was not `approved`, or its target was not in a refundable
    /// state. Nothing was written.
    InvalidState,
    /// Payment-scoped reversal: the payee's available balance could not
    /// cover the claw-back. Nothing was written.
    InsufficientFunds,
}

#[async_trait]
pub trait RefundExt {
    async fn create_refund(
        &self,
        payment_id: Option<Uuid>,
        escrow_id: Option<Uuid>,
        requested_by_id: Uuid,
        amount: i64,
        reason: String,
    ) -> Result<Refund, Error>;

    async fn get_refund(&self, refund_id: Uuid) -> Result<Option<Refund>, Error>;

    /// pending -> approved/rejected. `None` if not pending.
    async fn review_refund(&self, refund_id: Uuid, approve: bool)
        -> Result<Option<Refund>, Error>;

    /// Execute an approved refund in one transaction: the guarded
    /// approved -> processed flip plus the fund movement it stands for.
    async fn process_refund(&self, refund_id: Uuid) -> Result<RefundProcessing, Error>;
}

#[async_trait]
impl RefundExt for DBClient {
    async fn create_refund(
        &self,
        payment_id: Option<Uuid>,
        escrow_id: Option<Uuid>,
        requested_by_id: Uuid,
        amount: i64,
        reason: String,
    ) -> Result<Refund, Error> {
        sqlx::query_as::<_, Refund>(&format!(
            r#"
            INSERT INTO refunds (payment_id, escrow_id, requested_by_id, amount, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REFUND_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(escrow_id)
        .bind(requested_by_id)
        .bind(amount)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_refund(&self, refund_id: Uuid) -> Result<Option<Refund>, Error> {
        sqlx::query_as::<_, Refund>(&format!(
            "SELECT {REFUND_COLUMNS} FROM refunds WHERE id = $1"
        ))
        .bind(refund_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn review_refund(
        &self,
        refund_id: Uuid,
        approve: bool,
    ) -> Result<Option<Refund>, Error> {
        let to = if approve {
            RefundStatus::Approved
        } else {
            RefundStatus::Rejected
        };
        sqlx::query_as::<_, Refund>(&format!(
            r#"
            UPDATE refunds
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'::refund_status
            RETURNING {REFUND_COLUMNS}
            "#
        ))
        .bind(refund_id)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn process_refund(&self, refund_id: Uuid) -> Result<RefundProcessing, Error> {
        let mut tx = self.pool.begin().await?;

        let refund = sqlx::query_as::<_, Refund>(&format!(
            r#"
            UPDATE refunds
            SET status = 'processed'::refund_status, updated_at = NOW()
            WHERE id = $1 AND status = 'approved'::refund_status
            RETURNING {REFUND_COLUMNS}
            "#
        ))
        .bind(refund_id)
        .fetch_optional(&mut *tx)
        .await?;

        let refund = match refund {
            Some(refund) => refund,
            None => return Ok(RefundProcessing::InvalidState),
        };

        if let Some(escrow_id) = refund.escrow_id {
            let escrow =
                match escrowdb::draw_down_refund_tx(&mut tx, escrow_id, refund.amount).await? {
                    Some(escrow) => escrow,
                    None => return Ok(RefundProcessing::InvalidState),
                };
            if !walletdb::move_escrow_to_available_tx(&mut tx, escrow.client_id, refund.amount)
                .await?
            {
                return Err(Error::Protocol(
                    "wallet escrow bucket under-funded for refund".into(),
                ));
            }
            tx.commit().await?;
            return Ok(RefundProcessing::Processed {
                refund,
                escrow: Some(escrow),
            });
        }

        // payment-scoped: claw the approved amount back from the payee into
        // the payer's available balance. Only a refund of the full net
        // payout flips the payment to reversed; a partial refund leaves it
        // completed so the audit row still describes the settled amount.
        let payment_id = match refund.payment_id {
            Some(id) => id,
            None => return Ok(RefundProcessing::InvalidState),
        };
        let payment = match paymentdb::lock_completed_payment_tx(&mut tx, payment_id).await? {
            Some(payment) => payment,
            None => return Ok(RefundProcessing::InvalidState),
        };
        if refund.amount > payment.freelancer_amount {
            return Ok(RefundProcessing::InvalidState);
        }
        if payment.fully_reversed_by(refund.amount)
            && paymentdb::reverse_payment_tx(&mut tx, payment_id)
                .await?
                .is_none()
        {
            return Ok(RefundProcessing::InvalidState);
        }

        if !walletdb::debit_available_tx(&mut tx, payment.to_user_id, refund.amount).await? {
            return Ok(RefundProcessing::InsufficientFunds);
        }
        walletdb::ensure_wallet_tx(&mut tx, payment.from_user_id).await?;
        walletdb::credit_bucket_tx(
            &mut tx,
            payment.from_user_id,
            refund.amount,
            BalanceBucket::Available,
        )
        .await?;

        tx.commit().await?;
        Ok(RefundProcessing::Processed {
            refund,
            escrow: None,
        })
    }
}
