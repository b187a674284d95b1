// db/walletdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::walletmodels::*;

const WALLET_COLUMNS: &str = r#"
    id,
    user_id,
    available,
    pending,
    escrow,
    currency,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait WalletLedgerExt {
    /// Fetch a user's balance, creating a zero-balance row on first access.
    async fn get_or_create_wallet_balance(&self, user_id: Uuid) -> Result<WalletBalance, Error>;

    /// Unconditional additive update to one bucket.
    async fn credit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        bucket: BalanceBucket,
    ) -> Result<WalletBalance, Error>;

    /// Single conditional statement: subtract from available only if
    /// available >= amount. The bool is the only success signal; false
    /// guarantees zero side effects.
    async fn debit_wallet_atomic(&self, user_id: Uuid, amount: i64) -> Result<bool, Error>;
}

#[async_trait]
impl WalletLedgerExt for DBClient {
    async fn get_or_create_wallet_balance(&self, user_id: Uuid) -> Result<WalletBalance, Error> {
        let mut tx = self.pool.begin().await?;
        ensure_wallet_tx(&mut tx, user_id).await?;
        let wallet = sqlx::query_as::<_, WalletBalance>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallet_balances WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(wallet)
    }

    async fn credit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        bucket: BalanceBucket,
    ) -> Result<WalletBalance, Error> {
        let mut tx = self.pool.begin().await?;
        ensure_wallet_tx(&mut tx, user_id).await?;
        let wallet = credit_bucket_tx(&mut tx, user_id, amount, bucket).await?;
        tx.commit().await?;
        Ok(wallet)
    }

    async fn debit_wallet_atomic(&self, user_id: Uuid, amount: i64) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE wallet_balances
            SET available = available - $2, updated_at = NOW()
            WHERE user_id = $1 AND available >= $2
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Lazily initialize a wallet row inside the caller's transaction.
pub(crate) async fn ensure_wallet_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_balances (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Unconditional credit to a bucket. The column name comes from the closed
/// `BalanceBucket` set, never from caller input.
pub(crate) async fn credit_bucket_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    bucket: BalanceBucket,
) -> Result<WalletBalance, Error> {
    let column = bucket.column();
    sqlx::query_as::<_, WalletBalance>(&format!(
        r#"
        UPDATE wallet_balances
        SET {column} = {column} + $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING {WALLET_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await
}

/// Conditional debit of `available` inside the caller's transaction.
pub(crate) async fn debit_available_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
) -> Result<bool, Error> {
    let result = sqlx::query(
        r#"
        UPDATE wallet_balances
        SET available = available - $2, updated_at = NOW()
        WHERE user_id = $1 AND available >= $2
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Move funds from available into the escrow bucket of the same wallet.
/// The row total stays constant; the condition makes funding race-free.
pub(crate) async fn move_available_to_escrow_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
) -> Result<bool, Error> {
    let result = sqlx::query(
        r#"
        UPDATE wallet_balances
        SET available = available - $2, escrow = escrow + $2, updated_at = NOW()
        WHERE user_id = $1 AND available >= $2
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Return escrowed funds to available (refund path).
pub(crate) async fn move_escrow_to_available_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
) -> Result<bool, Error> {
    let result = sqlx::query(
        r#"
        UPDATE wallet_balances
        SET escrow = escrow - $2, available = available + $2, updated_at = NOW()
        WHERE user_id = $1 AND escrow >= $2
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Draw settled funds out of the client's escrow bucket (release path).
pub(crate) async fn debit_escrow_bucket_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
) -> Result<bool, Error> {
    let result = sqlx::query(
        r#"
        UPDATE wallet_balances
        SET escrow = escrow - $2, updated_at = NOW()
        WHERE user_id = $1 AND escrow >= $2
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}
