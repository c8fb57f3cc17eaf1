use std::fmt;
use std::str::FromStr;

use sqlx::{PgConnection, PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::AccountRow;

/// Reason codes recorded on every ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    TeamApprovalFee,
    JoinFee,
    ManualAdjustment,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::TeamApprovalFee => "team_approval_fee",
            ReasonCode::JoinFee => "join_fee",
            ReasonCode::ManualAdjustment => "manual_adjustment",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "team_approval_fee" => Ok(ReasonCode::TeamApprovalFee),
            "join_fee" => Ok(ReasonCode::JoinFee),
            "manual_adjustment" => Ok(ReasonCode::ManualAdjustment),
            _ => Err(format!("Unknown reason code: {}", s)),
        }
    }
}

pub struct AccountRepo {
    db: PgPool,
}

impl AccountRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT user_id, balance, created_at, updated_at FROM accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }
}

pub async fn get_balance<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT balance FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|r| r.0))
}

/// Lock the account row for the remainder of the transaction and return the
/// balance. The caller must hold the lock across the funds check and the
/// debit so no other writer can slip in between.
pub async fn balance_for_update(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<i64>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT balance FROM accounts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|r| r.0))
}

pub async fn apply_delta(conn: &mut PgConnection, user_id: Uuid, delta: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE accounts SET balance = balance + $2, updated_at = NOW() WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
