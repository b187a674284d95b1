// db/milestonedb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use super::{escrowdb, paymentdb, walletdb};
use crate::models::contractmodels::Contract;
use crate::models::milestonemodels::*;
use crate::models::paymentmodels::{Invoice, Payment};
use crate::models::walletmodels::BalanceBucket;

const MILESTONE_COLUMNS: &str = r#"
    id,
    contract_id,
    title,
    description,
    amount,
    status,
    deliverables,
    notes,
    submitted_at,
    approved_at,
    created_at,
    updated_at
"#;

/// Outcome of the single-transaction milestone settlement.
#[derive(Debug)]
pub enum MilestoneSettlement {
    Settled {
        milestone: Milestone,
        payment: Payment,
        invoice: Invoice,
    },
    /// The guarded status flip hit zero rows: the milestone was not in
    /// `submitted` (already approved, rejected back to pending, or gone).
    NotSubmitted,
    /// No escrow could cover the amount and the direct client debit
    /// predicate failed. Nothing was written.
    InsufficientFunds,
}

#[async_trait]
pub trait MilestoneExt {
    async fn create_milestone(
        &self,
        contract_id: Uuid,
        title: String,
        description: String,
        amount: i64,
    ) -> Result<Milestone, Error>;

    async fn get_milestone(&self, milestone_id: Uuid) -> Result<Option<Milestone>, Error>;

    async fn list_milestones_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<Milestone>, Error>;

    /// pending -> submitted, stamping submitted_at. `None` if not pending.
    async fn submit_milestone(
        &self,
        milestone_id: Uuid,
        deliverables: String,
        notes: Option<String>,
    ) -> Result<Option<Milestone>, Error>;

    /// submitted -> pending, appending the rejection reason to notes and
    /// clearing submitted_at, in one update. `None` if not submitted.
    async fn reject_milestone(
        &self,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Option<Milestone>, Error>;

    /// Delete is only legal while pending; returns whether a row went away.
    async fn delete_milestone(&self, milestone_id: Uuid) -> Result<bool, Error>;

    /// Apply a closed set of update commands to a pending milestone.
    /// `None` if the milestone left `pending` part-way (all-or-nothing).
    async fn update_milestone(
        &self,
        milestone_id: Uuid,
        updates: &[MilestoneUpdate],
    ) -> Result<Option<Milestone>, Error>;

    /// The settlement transaction: guarded submitted -> approved flip,
    /// escrow drawdown (or direct client debit when no escrow covers it),
    /// freelancer credit, payment insert, invoice insert. All-or-nothing.
    async fn settle_milestone(
        &self,
        milestone_id: Uuid,
        contract: &Contract,
        platform_fee: i64,
        freelancer_amount: i64,
        notes: Option<String>,
    ) -> Result<MilestoneSettlement, Error>;
}

#[async_trait]
impl MilestoneExt for DBClient {
    async fn create_milestone(
        &self,
        contract_id: Uuid,
        title: String,
        description: String,
        amount: i64,
    ) -> Result<Milestone, Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            r#"
            INSERT INTO milestones (contract_id, title, description, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(contract_id)
        .bind(title)
        .bind(description)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_milestone(&self, milestone_id: Uuid) -> Result<Option<Milestone>, Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = $1"
        ))
        .bind(milestone_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_milestones_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<Milestone>, Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE contract_id = $1 ORDER BY created_at"
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn submit_milestone(
        &self,
        milestone_id: Uuid,
        deliverables: String,
        notes: Option<String>,
    ) -> Result<Option<Milestone>, Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'submitted'::milestone_status,
                deliverables = $2,
                notes = COALESCE($3, notes),
                submitted_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'::milestone_status
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(deliverables)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn reject_milestone(
        &self,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Option<Milestone>, Error> {
        // rejection lands the row straight back on pending so the
        // freelancer can resubmit
        sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'pending'::milestone_status,
                notes = COALESCE(notes || E'\n', '') || 'Rejected: ' || $2,
                submitted_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'submitted'::milestone_status
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_milestone(&self, milestone_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(
            "DELETE FROM milestones WHERE id = $1 AND status = 'pending'::milestone_status",
        )
        .bind(milestone_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_milestone(
        &self,
        milestone_id: Uuid,
        updates: &[MilestoneUpdate],
    ) -> Result<Option<Milestone>, Error> {
        let mut tx = self.pool.begin().await?;
        let mut latest: Option<Milestone> = None;

        for update in updates {
            // each command maps to a fixed column; the match is the closed
            // boundary that rejects anything outside the allowed set
            let (column, value): (&'static str, String) = match update {
                MilestoneUpdate::SetTitle(v) => ("title", v.clone()),
                MilestoneUpdate::SetDescription(v) => ("description", v.clone()),
                MilestoneUpdate::SetNotes(v) => ("notes", v.clone()),
                MilestoneUpdate::SetAmount(v) => {
                    let row = sqlx::query_as::<_, Milestone>(&format!(
                        r#"
                        UPDATE milestones
                        SET amount = $2, updated_at = NOW()
                        WHERE id = $1 AND status = 'pending'::milestone_status
                        RETURNING {MILESTONE_COLUMNS}
                        "#
                    ))
                    .bind(milestone_id)
                    .bind(v)
                    .fetch_optional(&mut *tx)
                    .await?;
                    match row {
                        Some(m) => {
                            latest = Some(m);
                            continue;
                        }
                        None => return Ok(None),
                    }
                }
            };

            let row = sqlx::query_as::<_, Milestone>(&format!(
                r#"
                UPDATE milestones
                SET {column} = $2, updated_at = NOW()
                WHERE id = $1 AND status = 'pending'::milestone_status
                RETURNING {MILESTONE_COLUMNS}
                "#
            ))
            .bind(milestone_id)
            .bind(value)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(m) => latest = Some(m),
                None => return Ok(None),
            }
        }

        tx.commit().await?;
        Ok(latest)
    }

    async fn settle_milestone(
        &self,
        milestone_id: Uuid,
        contract: &Contract,
        platform_fee: i64,
        freelancer_amount: i64,
        notes: Option<String>,
    ) -> Result<MilestoneSettlement, Error> {
        let mut tx = self.pool.begin().await?;

        // the guarded flip is the idempotency fence: a second approve hits
        // zero rows here and nothing below ever runs twice
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'approved'::milestone_status,
                notes = COALESCE($2, notes),
                approved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'submitted'::milestone_status
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await?;

        let milestone = match milestone {
            Some(m) => m,
            None => return Ok(MilestoneSettlement::NotSubmitted),
        };

        let amount = milestone.amount;

        // draw from the contract's active escrow when one covers the
        // amount, otherwise fall back to a direct conditional debit of the
        // client's available balance
        let escrow_funded =
            escrowdb::draw_down_contract_escrow_tx(&mut tx, contract.id, amount).await?;

        match escrow_funded {
            Some(escrow) => {
                escrowdb::settle_release_wallets_tx(
                    &mut tx,
                    escrow.client_id,
                    contract.freelancer_id,
                    amount,
                    freelancer_amount,
                )
                .await?;
            }
            None => {
                if !walletdb::debit_available_tx(&mut tx, contract.client_id, amount).await? {
                    return Ok(MilestoneSettlement::InsufficientFunds);
                }
                walletdb::ensure_wallet_tx(&mut tx, contract.freelancer_id).await?;
                walletdb::credit_bucket_tx(
                    &mut tx,
                    contract.freelancer_id,
                    freelancer_amount,
                    BalanceBucket::Available,
                )
                .await?;
            }
        }

        let payment = paymentdb::insert_payment_tx(
            &mut tx,
            contract.id,
            Some(milestone.id),
            contract.client_id,
            contract.freelancer_id,
            amount,
            platform_fee,
            freelancer_amount,
        )
        .await?;

        let invoice = paymentdb::create_invoice_tx(&mut tx, &payment, &milestone.title).await?;

        tx.commit().await?;
        Ok(MilestoneSettlement::Settled {
            milestone,
            payment,
            invoice,
        })
    }
}
