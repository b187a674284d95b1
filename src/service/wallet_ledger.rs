// service/wallet_ledger.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, walletdb::WalletLedgerExt},
    models::walletmodels::{BalanceBucket, BalanceView, WalletBalance},
    service::error::ServiceError,
};

/// Owns per-user balances. Every component that moves money goes through
/// this service or the walletdb primitives it fronts; nothing mutates a
/// balance row any other way.
#[derive(Debug, Clone)]
pub struct WalletLedger {
    db_client: Arc<DBClient>,
}

impl WalletLedger {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Lazily creates a zero balance on first access.
    pub async fn get_balance(&self, user_id: Uuid) -> Result<BalanceView, ServiceError> {
        let wallet = self.db_client.get_or_create_wallet_balance(user_id).await?;
        Ok(wallet.into())
    }

    /// Unconditional additive update, used for releases, refunds and
    /// payouts.
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        bucket: BalanceBucket,
    ) -> Result<WalletBalance, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::Validation(
                "Credit amount must be positive".to_string(),
            ));
        }
        Ok(self.db_client.credit_wallet(user_id, amount, bucket).await?)
    }

    /// The core primitive: check and mutation as one datastore statement.
    /// A false return means the predicate refused the debit with zero side
    /// effects; that outcome is a business decision and is never retried
    /// here.
    pub async fn debit_atomic(&self, user_id: Uuid, amount: i64) -> Result<bool, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::Validation(
                "Debit amount must be positive".to_string(),
            ));
        }
        let debited = self.db_client.debit_wallet_atomic(user_id, amount).await?;
        if !debited {
            tracing::info!(
                "debit of {} cents refused for user {}: insufficient funds",
                amount,
                user_id
            );
        }
        Ok(debited)
    }
}
