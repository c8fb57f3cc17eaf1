//! Account balances and the escrow transfers that ride on workflow
//! approvals. Every mutation happens under a row lock inside a transaction,
//! and every successful mutation appends one audit row per affected account.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use infra::models::LedgerTransactionRow;
use infra::pagination::LimitOffset;
use infra::repos::accounts::{self, ReasonCode};
use infra::repos::ledger_transactions::{self, CreateLedgerTransaction, LedgerTransactionRepo};
use infra::repos::users::UserRole;

use crate::directory::AccountDirectory;
use crate::error::{Result, WorkflowError};

/// Even split with integer division. The remainder on non-divisible amounts
/// is not distributed; the payer is still debited in full so the audit trail
/// stays deterministic.
pub(crate) fn split_even(amount: i64, recipients: usize) -> i64 {
    amount / recipients as i64
}

/// Atomically debit `from` and credit each of `to` an even share, inside the
/// caller's transaction. The payer row is locked before the funds check, so
/// the check and the debit are one unit; recipients are locked in id order.
pub async fn transfer_in(
    conn: &mut PgConnection,
    from: Uuid,
    to: &[Uuid],
    amount: i64,
    reason: ReasonCode,
    related_entity_id: Option<Uuid>,
) -> Result<()> {
    if amount <= 0 {
        return Err(WorkflowError::Validation(
            "transfer amount must be positive".into(),
        ));
    }
    if to.is_empty() {
        return Err(WorkflowError::Validation(
            "transfer requires at least one recipient".into(),
        ));
    }

    let available = accounts::balance_for_update(&mut *conn, from)
        .await?
        .ok_or(WorkflowError::AccountNotFound { account_id: from })?;

    if available < amount {
        return Err(WorkflowError::InsufficientFunds {
            required: amount,
            available,
            shortage: amount - available,
        });
    }

    accounts::apply_delta(&mut *conn, from, -amount).await?;
    ledger_transactions::insert(
        &mut *conn,
        CreateLedgerTransaction {
            account_id: from,
            delta: -amount,
            reason_code: reason,
            related_entity_id,
        },
    )
    .await?;

    let mut recipients = to.to_vec();
    recipients.sort();
    let share = split_even(amount, recipients.len());

    for recipient in recipients {
        accounts::balance_for_update(&mut *conn, recipient)
            .await?
            .ok_or(WorkflowError::AccountNotFound {
                account_id: recipient,
            })?;
        accounts::apply_delta(&mut *conn, recipient, share).await?;
        ledger_transactions::insert(
            &mut *conn,
            CreateLedgerTransaction {
                account_id: recipient,
                delta: share,
                reason_code: reason,
                related_entity_id,
            },
        )
        .await?;
    }

    tracing::info!(
        %from,
        recipients = to.len(),
        amount,
        share,
        reason = reason.as_str(),
        "ledger transfer applied"
    );

    Ok(())
}

#[derive(Clone)]
pub struct Ledger {
    pool: PgPool,
    directory: AccountDirectory,
}

impl Ledger {
    pub fn new(pool: PgPool) -> Self {
        let directory = AccountDirectory::new(pool.clone());
        Self { pool, directory }
    }

    pub async fn balance(&self, account_id: Uuid) -> Result<i64> {
        accounts::get_balance(&self.pool, account_id)
            .await?
            .ok_or(WorkflowError::AccountNotFound { account_id })
    }

    /// Standalone transfer in its own transaction. The workflows use
    /// [`transfer_in`] directly so the debit commits or rolls back with the
    /// state transition it is coupled to.
    pub async fn transfer(
        &self,
        from: Uuid,
        to: &[Uuid],
        amount: i64,
        reason: ReasonCode,
        related_entity_id: Option<Uuid>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        transfer_in(&mut tx, from, to, amount, reason, related_entity_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Manual signed adjustment, admin only. Fails rather than letting a
    /// balance go negative.
    pub async fn adjust_balance(
        &self,
        admin_id: Uuid,
        account_id: Uuid,
        delta: i64,
        related_entity_id: Option<Uuid>,
    ) -> Result<i64> {
        self.directory
            .ensure_role(admin_id, UserRole::Admin, "adjust a balance")
            .await?;

        if delta == 0 {
            return Err(WorkflowError::Validation(
                "adjustment delta must be non-zero".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let balance = accounts::balance_for_update(&mut tx, account_id)
            .await?
            .ok_or(WorkflowError::AccountNotFound { account_id })?;

        let new_balance = balance + delta;
        if new_balance < 0 {
            return Err(WorkflowError::InvalidAmount {
                account_id,
                balance,
                delta,
            });
        }

        accounts::apply_delta(&mut tx, account_id, delta).await?;
        ledger_transactions::insert(
            &mut *tx,
            CreateLedgerTransaction {
                account_id,
                delta,
                reason_code: ReasonCode::ManualAdjustment,
                related_entity_id,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(%admin_id, %account_id, delta, new_balance, "manual balance adjustment");

        Ok(new_balance)
    }

    pub async fn history(
        &self,
        account_id: Uuid,
        page: Option<LimitOffset>,
    ) -> Result<Vec<LedgerTransactionRow>> {
        Ok(LedgerTransactionRepo::new(self.pool.clone())
            .get_by_account(account_id, page)
            .await?)
    }

    /// Recompute the per-account delta sum and compare it with the stored
    /// balance. True when the audit invariant holds.
    pub async fn audit_balance(&self, account_id: Uuid) -> Result<bool> {
        let balance = self.balance(account_id).await?;
        let sum = ledger_transactions::sum_deltas(&self.pool, account_id).await?;
        Ok(balance == sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_the_remainder() {
        assert_eq!(split_even(500_000, 1), 500_000);
        assert_eq!(split_even(500_000, 2), 250_000);
        assert_eq!(split_even(500_000, 3), 166_666);
        assert_eq!(split_even(100, 101), 0);
    }
}
