use std::fmt;
use std::str::FromStr;

use sqlx::{PgConnection, PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::JoinRequestRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateJoinRequest {
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub message: Option<String>,
}

pub struct JoinRequestRepo {
    db: PgPool,
}

impl JoinRequestRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: CreateJoinRequest) -> Result<JoinRequestRow> {
        let row = sqlx::query_as::<_, JoinRequestRow>(
            r#"
            INSERT INTO join_requests (team_id, athlete_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, team_id, athlete_id, message, status, rejection_reason,
                      requested_at, processed_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.athlete_id)
        .bind(data.message)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<JoinRequestRow>> {
        let row = sqlx::query_as::<_, JoinRequestRow>(
            r#"
            SELECT id, team_id, athlete_id, message, status, rejection_reason,
                   requested_at, processed_at
            FROM join_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn list_by_team(
        &self,
        team_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<JoinRequestRow>> {
        let rows = sqlx::query_as::<_, JoinRequestRow>(
            r#"
            SELECT id, team_id, athlete_id, message, status, rejection_reason,
                   requested_at, processed_at
            FROM join_requests
            WHERE team_id = $1
              AND ($2::text IS NULL OR status = $2::request_status)
            ORDER BY requested_at ASC
            "#,
        )
        .bind(team_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn list_by_athlete(&self, athlete_id: Uuid) -> Result<Vec<JoinRequestRow>> {
        let rows = sqlx::query_as::<_, JoinRequestRow>(
            r#"
            SELECT id, team_id, athlete_id, message, status, rejection_reason,
                   requested_at, processed_at
            FROM join_requests
            WHERE athlete_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(athlete_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

/// Lock the request row so two coaches (or a retry) cannot both resolve it.
pub async fn get_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<JoinRequestRow>> {
    let row = sqlx::query_as::<_, JoinRequestRow>(
        r#"
        SELECT id, team_id, athlete_id, message, status, rejection_reason,
               requested_at, processed_at
        FROM join_requests
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn mark_processed<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: RequestStatus,
    rejection_reason: Option<&str>,
) -> Result<JoinRequestRow> {
    let row = sqlx::query_as::<_, JoinRequestRow>(
        r#"
        UPDATE join_requests
        SET status = $2::request_status,
            rejection_reason = $3,
            processed_at = NOW()
        WHERE id = $1
        RETURNING id, team_id, athlete_id, message, status, rejection_reason,
                  requested_at, processed_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(rejection_reason)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn has_pending<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    athlete_id: Uuid,
) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM join_requests
            WHERE team_id = $1 AND athlete_id = $2 AND status = 'pending'
        )
        "#,
    )
    .bind(team_id)
    .bind(athlete_id)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}
