use sqlx::{PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::repos::accounts::ReasonCode;
use crate::{models::LedgerTransactionRow, pagination::LimitOffset};

#[derive(Debug, Clone)]
pub struct CreateLedgerTransaction {
    pub account_id: Uuid,
    pub delta: i64,
    pub reason_code: ReasonCode,
    pub related_entity_id: Option<Uuid>,
}

/// Append one audit row. The table is append-only; there is no update or
/// delete anywhere in this crate.
pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateLedgerTransaction,
) -> Result<LedgerTransactionRow> {
    let row = sqlx::query_as::<_, LedgerTransactionRow>(
        r#"
        INSERT INTO ledger_transactions (account_id, delta, reason_code, related_entity_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, delta, reason_code, related_entity_id, created_at
        "#,
    )
    .bind(data.account_id)
    .bind(data.delta)
    .bind(data.reason_code.as_str())
    .bind(data.related_entity_id)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Sum of all recorded deltas for an account. Must equal the current balance.
pub async fn sum_deltas<'e>(executor: impl PgExecutor<'e>, account_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        // SUM(bigint) widens to numeric; cast back so it decodes as i64.
        "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM ledger_transactions WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub struct LedgerTransactionRepo {
    db: PgPool,
}

impl LedgerTransactionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_by_account(
        &self,
        account_id: Uuid,
        page: Option<LimitOffset>,
    ) -> Result<Vec<LedgerTransactionRow>> {
        let page = page.unwrap_or_default();

        let rows = sqlx::query_as::<_, LedgerTransactionRow>(
            r#"
            SELECT id, account_id, delta, reason_code, related_entity_id, created_at
            FROM ledger_transactions
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn get_by_related_entity(
        &self,
        related_entity_id: Uuid,
    ) -> Result<Vec<LedgerTransactionRow>> {
        let rows = sqlx::query_as::<_, LedgerTransactionRow>(
            r#"
            SELECT id, account_id, delta, reason_code, related_entity_id, created_at
            FROM ledger_transactions
            WHERE related_entity_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(related_entity_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
