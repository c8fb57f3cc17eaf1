use sqlx::{PgConnection, PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::MatchLineupRow;
use crate::repos::roster::Position;

pub struct LineupRepo {
    db: PgPool,
}

impl LineupRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, match_id: Uuid, team_id: Uuid) -> Result<Vec<MatchLineupRow>> {
        list_for_match(&self.db, match_id, team_id).await
    }
}

pub async fn list_for_match<'e>(
    executor: impl PgExecutor<'e>,
    match_id: Uuid,
    team_id: Uuid,
) -> Result<Vec<MatchLineupRow>> {
    let rows = sqlx::query_as::<_, MatchLineupRow>(
        r#"
        SELECT id, match_id, team_id, athlete_id, position, submitted_at
        FROM match_lineups
        WHERE match_id = $1 AND team_id = $2
        ORDER BY position ASC
        "#,
    )
    .bind(match_id)
    .bind(team_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Replace a team's lineup for a match wholesale. The delete and the inserts
/// share the caller's transaction, so a failed submission leaves the old
/// lineup intact.
pub async fn replace(
    conn: &mut PgConnection,
    match_id: Uuid,
    team_id: Uuid,
    entries: &[(Uuid, Position)],
) -> Result<Vec<MatchLineupRow>> {
    sqlx::query("DELETE FROM match_lineups WHERE match_id = $1 AND team_id = $2")
        .bind(match_id)
        .bind(team_id)
        .execute(&mut *conn)
        .await?;

    let mut rows = Vec::with_capacity(entries.len());
    for (athlete_id, position) in entries {
        let row = sqlx::query_as::<_, MatchLineupRow>(
            r#"
            INSERT INTO match_lineups (match_id, team_id, athlete_id, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, match_id, team_id, athlete_id, position, submitted_at
            "#,
        )
        .bind(match_id)
        .bind(team_id)
        .bind(*athlete_id)
        .bind(*position)
        .fetch_one(&mut *conn)
        .await?;
        rows.push(row);
    }

    Ok(rows)
}
