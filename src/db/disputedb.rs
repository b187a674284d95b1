// db/disputedb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::contractdb::set_contract_status_tx;
use super::db::DBClient;
use crate::models::contractmodels::{Contract, ContractStatus};
use crate::models::disputemodels::*;

const DISPUTE_COLUMNS: &str = r#"
    id,
    contract_id,
    raised_by_id,
    dispute_type,
    description,
    status,
    assigned_to_id,
    resolution,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait DisputeExt {
    /// Freeze the contract and open the dispute in one transaction.
    /// `None` means the contract was not `active`; nothing was written.
    async fn open_dispute(
        &self,
        contract_id: Uuid,
        raised_by_id: Uuid,
        dispute_type: String,
        description: String,
    ) -> Result<Option<(Dispute, Contract)>, Error>;

    /// open -> in_progress, recording the assigned admin.
    async fn assign_dispute(
        &self,
        dispute_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Dispute>, Error>;

    /// Store the resolution and unfreeze the contract (disputed -> active)
    /// in one transaction. Fund movement is never part of resolution.
    async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolution: String,
    ) -> Result<Option<(Dispute, Option<Contract>)>, Error>;

    async fn get_dispute(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error>;

    async fn list_disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, Error>;
}

#[async_trait]
impl DisputeExt for DBClient {
    async fn open_dispute(
        &self,
        contract_id: Uuid,
        raised_by_id: Uuid,
        dispute_type: String,
        description: String,
    ) -> Result<Option<(Dispute, Contract)>, Error> {
        let mut tx = self.pool.begin().await?;

        let contract = match set_contract_status_tx(
            &mut tx,
            contract_id,
            ContractStatus::Active,
            ContractStatus::Disputed,
        )
        .await?
        {
            Some(contract) => contract,
            None => return Ok(None),
        };

        let dispute = sqlx::query_as::<_, Dispute>(&format!(
            r#"
            INSERT INTO disputes (contract_id, raised_by_id, dispute_type, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {DISPUTE_COLUMNS}
            "#
        ))
        .bind(contract_id)
        .bind(raised_by_id)
        .bind(dispute_type)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((dispute, contract)))
    }

    async fn assign_dispute(
        &self,
        dispute_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Option<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(&format!(
            r#"
            UPDATE disputes
            SET status = 'in_progress'::dispute_status,
                assigned_to_id = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'open'::dispute_status
            RETURNING {DISPUTE_COLUMNS}
            "#
        ))
        .bind(dispute_id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolution: String,
    ) -> Result<Option<(Dispute, Option<Contract>)>, Error> {
        let mut tx = self.pool.begin().await?;

        let dispute = sqlx::query_as::<_, Dispute>(&format!(
            r#"
            UPDATE disputes
            SET status = 'resolved'::dispute_status,
                resolution = $2,
                updated_at = NOW()
            WHERE id = $1
              AND status IN ('open'::dispute_status, 'in_progress'::dispute_status)
            RETURNING {DISPUTE_COLUMNS}
            "#
        ))
        .bind(dispute_id)
        .bind(resolution)
        .fetch_optional(&mut *tx)
        .await?;

        let dispute = match dispute {
            Some(dispute) => dispute,
            None => return Ok(None),
        };

        // unfreeze; another open dispute on the same contract would have
        // been rejected at open time, so disputed -> active is safe here.
        // The flip can legitimately miss if the contract was cancelled by
        // an admin while frozen.
        let contract = set_contract_status_tx(
            &mut tx,
            dispute.contract_id,
            ContractStatus::Disputed,
            ContractStatus::Active,
        )
        .await?;

        tx.commit().await?;
        Ok(Some((dispute, contract)))
    }

    async fn get_dispute(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(&format!(
            "SELECT {DISPUTE_COLUMNS} FROM disputes WHERE id = $1"
        ))
        .bind(dispute_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_disputes_for_contract(&self, contract_id: Uuid) -> Result<Vec<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(&format!(
            "SELECT {DISPUTE_COLUMNS} FROM disputes WHERE contract_id = $1 ORDER BY created_at"
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
    }
}
