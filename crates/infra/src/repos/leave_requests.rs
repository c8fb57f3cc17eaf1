use sqlx::{PgConnection, PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::LeaveRequestRow;
use crate::repos::join_requests::RequestStatus;

#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub reason: Option<String>,
}

pub struct LeaveRequestRepo {
    db: PgPool,
}

impl LeaveRequestRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: CreateLeaveRequest) -> Result<LeaveRequestRow> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            INSERT INTO leave_requests (team_id, athlete_id, reason)
            VALUES ($1, $2, $3)
            RETURNING id, team_id, athlete_id, reason, status, requested_at, processed_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.athlete_id)
        .bind(data.reason)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<LeaveRequestRow>> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            SELECT id, team_id, athlete_id, reason, status, requested_at, processed_at
            FROM leave_requests
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
    ) -> Result<Vec<LeaveRequestRow>> {
        let rows = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            SELECT id, team_id, athlete_id, reason, status, requested_at, processed_at
            FROM leave_requests
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
}

pub async fn get_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<LeaveRequestRow>> {
    let row = sqlx::query_as::<_, LeaveRequestRow>(
        r#"
        SELECT id, team_id, athlete_id, reason, status, requested_at, processed_at
        FROM leave_requests
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
) -> Result<LeaveRequestRow> {
    let row = sqlx::query_as::<_, LeaveRequestRow>(
        r#"
        UPDATE leave_requests
        SET status = $2::request_status,
            processed_at = NOW()
        WHERE id = $1
        RETURNING id, team_id, athlete_id, reason, status, requested_at, processed_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
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
            SELECT 1 FROM leave_requests
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
