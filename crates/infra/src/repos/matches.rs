use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::MatchRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            _ => Err(format!("Unknown match status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMatchData {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub match_date: NaiveDate,
    pub kickoff_time: NaiveTime,
    pub venue: Option<String>,
}

#[derive(Clone)]
pub struct MatchRepo {
    db: PgPool,
}

impl MatchRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MatchRow>> {
        get_by_id(&self.db, id).await
    }

    pub async fn create(&self, data: CreateMatchData) -> Result<MatchRow> {
        let row = sqlx::query_as::<_, MatchRow>(
            r#"
            INSERT INTO matches (home_team_id, away_team_id, match_date, kickoff_time, venue)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, home_team_id, away_team_id, match_date, kickoff_time, venue,
                      status, created_at, updated_at
            "#,
        )
        .bind(data.home_team_id)
        .bind(data.away_team_id)
        .bind(data.match_date)
        .bind(data.kickoff_time)
        .bind(data.venue)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<MatchRow>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, home_team_id, away_team_id, match_date, kickoff_time, venue,
                   status, created_at, updated_at
            FROM matches
            WHERE home_team_id = $1 OR away_team_id = $1
            ORDER BY match_date ASC, kickoff_time ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn set_status(&self, id: Uuid, status: MatchStatus) -> Result<Option<MatchRow>> {
        let row = sqlx::query_as::<_, MatchRow>(
            r#"
            UPDATE matches
            SET status = $2::match_status,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, home_team_id, away_team_id, match_date, kickoff_time, venue,
                      status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<MatchRow>> {
    let row = sqlx::query_as::<_, MatchRow>(
        r#"
        SELECT id, home_team_id, away_team_id, match_date, kickoff_time, venue,
               status, created_at, updated_at
        FROM matches
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}
