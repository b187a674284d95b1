// db/escrowdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use super::walletdb;
use crate::models::escrowmodels::*;

const ESCROW_COLUMNS: &str = r#"
    id,
    contract_id,
    client_id,
    amount,
    released_amount,
    status,
    expires_at,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait EscrowExt {
    /// Fund an escrow: conditional debit of the client's available balance
    /// plus the escrow insert, in one transaction. `None` means the debit
    /// predicate failed (insufficient funds) and nothing was written.
    async fn fund_escrow(
        &self,
        contract_id: Uuid,
        client_id: Uuid,
        amount: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Escrow>, Error>;

    /// Draw down an active escrow and credit the freelancer, in one
    /// transaction. `None` means the escrow was not active or the amount
    /// exceeded the undrawn remainder; nothing was written.
    async fn release_escrow(
        &self,
        escrow_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
    ) -> Result<Option<Escrow>, Error>;

    /// Return escrowed funds to the client. Counts against the same
    /// drawdown counter as releases; refunding the full remainder flips the
    /// escrow to `refunded`, a partial refund leaves it in place so further
    /// releases against the remainder stay legal.
    async fn refund_escrow(&self, escrow_id: Uuid, amount: i64) -> Result<Option<Escrow>, Error>;

    async fn get_escrow(&self, escrow_id: Uuid) -> Result<Option<Escrow>, Error>;

    async fn list_escrows_for_contract(&self, contract_id: Uuid) -> Result<Vec<Escrow>, Error>;

    /// Transition every active escrow past its expiry to `expired`.
    async fn expire_due_escrows(&self) -> Result<Vec<Escrow>, Error>;
}

#[async_trait]
impl EscrowExt for DBClient {
    async fn fund_escrow(
        &self,
        contract_id: Uuid,
        client_id: Uuid,
        amount: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Escrow>, Error> {
        let mut tx = self.pool.begin().await?;

        walletdb::ensure_wallet_tx(&mut tx, client_id).await?;
        if !walletdb::move_available_to_escrow_tx(&mut tx, client_id, amount).await? {
            // rollback on drop; no insert happens
            return Ok(None);
        }

        let escrow = sqlx::query_as::<_, Escrow>(&format!(
            r#"
            INSERT INTO escrows (contract_id, client_id, amount, expires_at, status)
            VALUES ($1, $2, $3, $4, 'active'::escrow_status)
            RETURNING {ESCROW_COLUMNS}
            "#
        ))
        .bind(contract_id)
        .bind(client_id)
        .bind(amount)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(escrow))
    }

    async fn release_escrow(
        &self,
        escrow_id: Uuid,
        freelancer_id: Uuid,
        amount: i64,
    ) -> Result<Option<Escrow>, Error> {
        let mut tx = self.pool.begin().await?;

        let escrow = match draw_down_release_tx(&mut tx, escrow_id, amount).await? {
            Some(escrow) => escrow,
            None => return Ok(None),
        };

        settle_release_wallets_tx(&mut tx, escrow.client_id, freelancer_id, amount, amount).await?;

        tx.commit().await?;
        Ok(Some(escrow))
    }

    async fn refund_escrow(&self, escrow_id: Uuid, amount: i64) -> Result<Option<Escrow>, Error> {
        let mut tx = self.pool.begin().await?;

        let escrow = match draw_down_refund_tx(&mut tx, escrow_id, amount).await? {
            Some(escrow) => escrow,
            None => return Ok(None),
        };

        if !walletdb::move_escrow_to_available_tx(&mut tx, escrow.client_id, amount).await? {
            return Err(Error::Protocol(
                "wallet escrow bucket under-funded for refund".into(),
            ));
        }

        tx.commit().await?;
        Ok(Some(escrow))
    }

    async fn get_escrow(&self, escrow_id: Uuid) -> Result<Option<Escrow>, Error> {
        sqlx::query_as::<_, Escrow>(&format!(
            "SELECT {ESCROW_COLUMNS} FROM escrows WHERE id = $1"
        ))
        .bind(escrow_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_escrows_for_contract(&self, contract_id: Uuid) -> Result<Vec<Escrow>, Error> {
        sqlx::query_as::<_, Escrow>(&format!(
            "SELECT {ESCROW_COLUMNS} FROM escrows WHERE contract_id = $1 ORDER BY created_at"
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn expire_due_escrows(&self) -> Result<Vec<Escrow>, Error> {
        sqlx::query_as::<_, Escrow>(&format!(
            r#"
            UPDATE escrows
            SET status = 'expired'::escrow_status, updated_at = NOW()
            WHERE status = 'active'::escrow_status
              AND expires_at IS NOT NULL
              AND expires_at < NOW()
            RETURNING {ESCROW_COLUMNS}
            "#
        ))
        .fetch_all(&self.pool)
        .await
    }
}

/// Guarded release drawdown: one statement checks the status, bounds the
/// drawdown against the remainder, and flips to `released` once drained.
pub(crate) async fn draw_down_release_tx(
    tx: &mut Transaction<'_, Postgres>,
    escrow_id: Uuid,
    amount: i64,
) -> Result<Option<Escrow>, Error> {
    sqlx::query_as::<_, Escrow>(&format!(
        r#"
        UPDATE escrows
        SET released_amount = released_amount + $2,
            status = CASE
                WHEN released_amount + $2 = amount THEN 'released'::escrow_status
                ELSE status
            END,
            updated_at = NOW()
        WHERE id = $1
          AND status = 'active'::escrow_status
          AND released_amount + $2 <= amount
        RETURNING {ESCROW_COLUMNS}
        "#
    ))
    .bind(escrow_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await
}

/// Guarded refund drawdown. Accepts expired escrows too; a full-remainder
/// refund flips to `refunded`, a partial one keeps the current status.
pub(crate) async fn draw_down_refund_tx(
    tx: &mut Transaction<'_, Postgres>,
    escrow_id: Uuid,
    amount: i64,
) -> Result<Option<Escrow>, Error> {
    sqlx::query_as::<_, Escrow>(&format!(
        r#"
        UPDATE escrows
        SET released_amount = released_amount + $2,
            status = CASE
                WHEN released_amount + $2 = amount THEN 'refunded'::escrow_status
                ELSE status
            END,
            updated_at = NOW()
        WHERE id = $1
          AND status IN ('active'::escrow_status, 'expired'::escrow_status)
          AND released_amount + $2 <= amount
        RETURNING {ESCROW_COLUMNS}
        "#
    ))
    .bind(escrow_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await
}

/// Guarded drawdown against the contract's active escrow, used by milestone
/// settlement when the contract is escrow-funded. The status and bound
/// guards are repeated in the outer WHERE: a settlement whose subquery
/// picked the row before a concurrent drawdown committed re-checks them
/// after the lock wait and misses instead of overdrawing.
pub(crate) async fn draw_down_contract_escrow_tx(
    tx: &mut Transaction<'_, Postgres>,
    contract_id: Uuid,
    amount: i64,
) -> Result<Option<Escrow>, Error> {
    sqlx::query_as::<_, Escrow>(&format!(
        r#"
        UPDATE escrows
        SET released_amount = released_amount + $2,
            status = CASE
                WHEN released_amount + $2 = amount THEN 'released'::escrow_status
                ELSE status
            END,
            updated_at = NOW()
        WHERE id = (
            SELECT id FROM escrows
            WHERE contract_id = $1
              AND status = 'active'::escrow_status
              AND released_amount + $2 <= amount
            ORDER BY created_at
            LIMIT 1
        )
          AND status = 'active'::escrow_status
          AND released_amount + $2 <= amount
        RETURNING {ESCROW_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await
}

/// Wallet side of a release: the escrowed amount leaves the client's escrow
/// bucket and the payee's credit lands in available. The two amounts differ
/// when a platform fee is withheld.
pub(crate) async fn settle_release_wallets_tx(
    tx: &mut Transaction<'_, Postgres>,
    client_id: Uuid,
    freelancer_id: Uuid,
    escrow_amount: i64,
    freelancer_amount: i64,
) -> Result<(), Error> {
    if !walletdb::debit_escrow_bucket_tx(tx, client_id, escrow_amount).await? {
        return Err(Error::Protocol(
            "wallet escrow bucket under-funded for release".into(),
        ));
    }
    walletdb::ensure_wallet_tx(tx, freelancer_id).await?;
    walletdb::credit_bucket_tx(
        tx,
        freelancer_id,
        freelancer_amount,
        crate::models::walletmodels::BalanceBucket::Available,
    )
    .await?;
    Ok(())
}
