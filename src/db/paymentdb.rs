// db/paymentdb.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Error, Postgres, Row, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodels::*;
use crate::models::walletmodels::generate_payment_reference;

const PAYMENT_COLUMNS: &str = r#"
    id,
    contract_id,
    milestone_id,
    from_user_id,
    to_user_id,
    amount,
    platform_fee,
    freelancer_amount,
    reference,
    status,
    created_at
"#;

const INVOICE_COLUMNS: &str = r#"
    id,
    invoice_number,
    payment_id,
    items,
    total,
    status,
    created_at
"#;

#[async_trait]
pub trait PaymentExt {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, Error>;
    async fn get_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, Error>;
    async fn list_payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, Error>;
    async fn get_invoice_for_payment(&self, payment_id: Uuid) -> Result<Option<Invoice>, Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE contract_id = $1 ORDER BY created_at"
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_invoice_for_payment(&self, payment_id: Uuid) -> Result<Option<Invoice>, Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Immutable audit insert. Funds have already moved inside the same
/// transaction by the time this runs, so the row is born `completed`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_payment_tx(
    tx: &mut Transaction<'_, Postgres>,
    contract_id: Uuid,
    milestone_id: Option<Uuid>,
    from_user_id: Uuid,
    to_user_id: Uuid,
    amount: i64,
    platform_fee: i64,
    freelancer_amount: i64,
) -> Result<Payment, Error> {
    sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments
            (contract_id, milestone_id, from_user_id, to_user_id,
             amount, platform_fee, freelancer_amount, reference, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed'::payment_status)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(milestone_id)
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(amount)
    .bind(platform_fee)
    .bind(freelancer_amount)
    .bind(generate_payment_reference())
    .fetch_one(&mut **tx)
    .await
}

/// Next monotonic invoice suffix for the calendar month, handed out by an
/// atomic counter upsert.
pub(crate) async fn next_invoice_seq_tx(
    tx: &mut Transaction<'_, Postgres>,
    period: &str,
) -> Result<i64, Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO invoice_counters (period, last_seq)
        VALUES ($1, 1)
        ON CONFLICT (period) DO UPDATE SET
            last_seq = invoice_counters.last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(period)
    .fetch_one(&mut **tx)
    .await?;
    row.try_get::<i64, _>("last_seq")
}

/// One invoice per payment, marked paid, numbered within the current month.
pub(crate) async fn create_invoice_tx(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
    description: &str,
) -> Result<Invoice, Error> {
    let period = invoice_period(Utc::now());
    let seq = next_invoice_seq_tx(tx, &period).await?;
    let invoice_number = format_invoice_number(&period, seq);

    let items = serde_json::json!([{
        "description": description,
        "amount": payment.amount,
        "platform_fee": payment.platform_fee,
        "freelancer_amount": payment.freelancer_amount,
    }]);

    sqlx::query_as::<_, Invoice>(&format!(
        r#"
        INSERT INTO invoices (invoice_number, payment_id, items, total, status)
        VALUES ($1, $2, $3, $4, 'paid'::invoice_status)
        RETURNING {INVOICE_COLUMNS}
        "#
    ))
    .bind(invoice_number)
    .bind(payment.id)
    .bind(items)
    .bind(payment.amount)
    .fetch_one(&mut **tx)
    .await
}

/// Lock a completed payment row for the rest of a refund transaction, so
/// the reversal decision cannot race a concurrent refund of the same
/// payment.
pub(crate) async fn lock_completed_payment_tx(
    tx: &mut Transaction<'_, Postgres>,
    payment_id: Uuid,
) -> Result<Option<Payment>, Error> {
    sqlx::query_as::<_, Payment>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS} FROM payments
        WHERE id = $1 AND status = 'completed'::payment_status
        FOR UPDATE
        "#
    ))
    .bind(payment_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Guarded reversal flip used by payment-scoped refunds.
pub(crate) async fn reverse_payment_tx(
    tx: &mut Transaction<'_, Postgres>,
    payment_id: Uuid,
) -> Result<Option<Payment>, Error> {
    sqlx::query_as::<_, Payment>(&format!(
        r#"
        UPDATE payments
        SET status = 'reversed'::payment_status
        WHERE id = $1 AND status = 'completed'::payment_status
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(payment_id)
    .fetch_optional(&mut **tx)
    .await
}
