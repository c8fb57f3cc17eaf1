use std::fmt;
use std::str::FromStr;

use sqlx::{PgConnection, PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::{models::TeamRow, pagination::LimitOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "team_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Draft => "draft",
            TeamStatus::Pending => "pending",
            TeamStatus::Approved => "approved",
            TeamStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TeamStatus::Draft),
            "pending" => Ok(TeamStatus::Pending),
            "approved" => Ok(TeamStatus::Approved),
            "rejected" => Ok(TeamStatus::Rejected),
            _ => Err(format!("Unknown team status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTeamData {
    pub name: String,
    pub short_name: String,
    pub logo_ref: Option<String>,
    pub entry_fee: i64,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTeamData {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo_ref: Option<String>,
    pub entry_fee: Option<i64>,
}

impl UpdateTeamData {
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.short_name.is_some() || self.logo_ref.is_some()
    }
}

#[derive(Clone)]
pub struct TeamRepo {
    db: PgPool,
}

impl TeamRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<TeamRow>> {
        get_by_id(&self.db, id).await
    }

    /// New teams always land in `pending`; only an admin moves them on.
    pub async fn create(&self, data: CreateTeamData) -> Result<TeamRow> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            INSERT INTO teams (name, short_name, logo_ref, entry_fee, status, owner_id)
            VALUES ($1, $2, $3, $4, 'pending'::team_status, $5)
            RETURNING id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
                      owner_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.short_name)
        .bind(data.logo_ref)
        .bind(data.entry_fee)
        .bind(data.owner_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<TeamRow>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
                   owner_id, created_at, updated_at
            FROM teams
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn list_by_status(
        &self,
        status: TeamStatus,
        page: Option<LimitOffset>,
    ) -> Result<Vec<TeamRow>> {
        let page = page.unwrap_or_default();

        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
                   owner_id, created_at, updated_at
            FROM teams
            WHERE status = $1::team_status
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status.as_str())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
               owner_id, created_at, updated_at
        FROM teams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Lock the team row for the remainder of the transaction. Workflow
/// transitions re-validate state under this lock.
pub async fn get_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
               owner_id, created_at, updated_at
        FROM teams
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: TeamStatus,
    rejection_reason: Option<&str>,
) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        UPDATE teams
        SET status = $2::team_status,
            rejection_reason = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
                  owner_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(rejection_reason)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn update_fields<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateTeamData,
) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        UPDATE teams
        SET name = COALESCE($2, name),
            short_name = COALESCE($3, short_name),
            logo_ref = COALESCE($4, logo_ref),
            entry_fee = COALESCE($5, entry_fee),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, short_name, logo_ref, entry_fee, status, rejection_reason,
                  owner_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(data.name)
    .bind(data.short_name)
    .bind(data.logo_ref)
    .bind(data.entry_fee)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
