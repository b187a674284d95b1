// db/contractdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::contractmodels::*;

const CONTRACT_COLUMNS: &str = r#"
    id,
    project_id,
    proposal_id,
    client_id,
    freelancer_id,
    amount,
    status,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait ContractExt {
    /// Direct hire: project + accepted proposal + contract written as one
    /// transaction, never as three independent statements.
    async fn create_direct_hire(
        &self,
        client_id: Uuid,
        freelancer_id: Uuid,
        title: String,
        description: String,
        amount: i64,
    ) -> Result<(Project, Proposal, Contract), Error>;

    async fn get_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, Error>;

    /// Guarded status flip; `None` means the contract was not in `from`.
    async fn update_contract_status(
        &self,
        contract_id: Uuid,
        from: ContractStatus,
        to: ContractStatus,
    ) -> Result<Option<Contract>, Error>;

    /// Soft cancel from `pending` or `active`. Never touches escrow.
    async fn cancel_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, Error>;
}

#[async_trait]
impl ContractExt for DBClient {
    async fn create_direct_hire(
        &self,
        client_id: Uuid,
        freelancer_id: Uuid,
        title: String,
        description: String,
        amount: i64,
    ) -> Result<(Project, Proposal, Contract), Error> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (client_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, client_id, title, description, created_at
            "#,
        )
        .bind(client_id)
        .bind(&title)
        .bind(&description)
        .fetch_one(&mut *tx)
        .await?;

        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (project_id, freelancer_id, amount, accepted)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, project_id, freelancer_id, amount, accepted, created_at
            "#,
        )
        .bind(project.id)
        .bind(freelancer_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts (project_id, proposal_id, client_id, freelancer_id, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(project.id)
        .bind(proposal.id)
        .bind(client_id)
        .bind(freelancer_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((project, proposal, contract))
    }

    async fn get_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1"
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_contract_status(
        &self,
        contract_id: Uuid,
        from: ContractStatus,
        to: ContractStatus,
    ) -> Result<Option<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(contract_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn cancel_contract(&self, contract_id: Uuid) -> Result<Option<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = 'cancelled'::contract_status, updated_at = NOW()
            WHERE id = $1
              AND status IN ('pending'::contract_status, 'active'::contract_status)
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Guarded status flip inside the caller's transaction (dispute open and
/// resolve run this next to the dispute write).
pub(crate) async fn set_contract_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    contract_id: Uuid,
    from: ContractStatus,
    to: ContractStatus,
) -> Result<Option<Contract>, Error> {
    sqlx::query_as::<_, Contract>(&format!(
        r#"
        UPDATE contracts
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {CONTRACT_COLUMNS}
        "#
    ))
    .bind(contract_id)
    .bind(from)
    .bind(to)
    .fetch_optional(&mut **tx)
    .await
}
