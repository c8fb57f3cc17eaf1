use std::fmt;
use std::str::FromStr;

use sqlx::{PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::models::TeamMemberRow;

/// The five basketball positions a lineup must cover exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "player_position", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Pg,
    Sg,
    Sf,
    Pf,
    C,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::Pg,
        Position::Sg,
        Position::Sf,
        Position::Pf,
        Position::C,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Pg => "pg",
            Position::Sg => "sg",
            Position::Sf => "sf",
            Position::Pf => "pf",
            Position::C => "c",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Error messages and logs use the conventional uppercase form.
        let s = match self {
            Position::Pg => "PG",
            Position::Sg => "SG",
            Position::Sf => "SF",
            Position::Pf => "PF",
            Position::C => "C",
        };
        f.write_str(s)
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pg" => Ok(Position::Pg),
            "sg" => Ok(Position::Sg),
            "sf" => Ok(Position::Sf),
            "pf" => Ok(Position::Pf),
            "c" => Ok(Position::C),
            _ => Err(format!("Unknown position: {}", s)),
        }
    }
}

pub struct RosterRepo {
    db: PgPool,
}

impl RosterRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_by_team(&self, team_id: Uuid) -> Result<Vec<TeamMemberRow>> {
        list_for_team(&self.db, team_id).await
    }

    pub async fn get_member(&self, team_id: Uuid, athlete_id: Uuid) -> Result<Option<TeamMemberRow>> {
        let row = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT id, team_id, athlete_id, jersey_number, position, joined_at
            FROM team_members
            WHERE team_id = $1 AND athlete_id = $2
            "#,
        )
        .bind(team_id)
        .bind(athlete_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }
}

pub async fn list_for_team<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
) -> Result<Vec<TeamMemberRow>> {
    let rows = sqlx::query_as::<_, TeamMemberRow>(
        r#"
        SELECT id, team_id, athlete_id, jersey_number, position, joined_at
        FROM team_members
        WHERE team_id = $1
        ORDER BY joined_at ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// The team the athlete currently belongs to, if any.
pub async fn athlete_team<'e>(
    executor: impl PgExecutor<'e>,
    athlete_id: Uuid,
) -> Result<Option<Uuid>> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT team_id FROM team_members WHERE athlete_id = $1")
            .bind(athlete_id)
            .fetch_optional(executor)
            .await?;

    Ok(row.map(|r| r.0))
}

pub async fn member_count<'e>(executor: impl PgExecutor<'e>, team_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(executor)
        .await?;

    Ok(row.0)
}

/// New members always start without a jersey number; the coach assigns one
/// later, individually or in bulk.
pub async fn insert_member<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    athlete_id: Uuid,
) -> Result<TeamMemberRow> {
    let row = sqlx::query_as::<_, TeamMemberRow>(
        r#"
        INSERT INTO team_members (team_id, athlete_id)
        VALUES ($1, $2)
        RETURNING id, team_id, athlete_id, jersey_number, position, joined_at
        "#,
    )
    .bind(team_id)
    .bind(athlete_id)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn remove_member<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    athlete_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND athlete_id = $2")
        .bind(team_id)
        .bind(athlete_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Overwrite jersey number and position with exactly the given values
/// (passing None clears the field).
pub async fn update_member<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    athlete_id: Uuid,
    jersey_number: Option<i16>,
    position: Option<Position>,
) -> Result<Option<TeamMemberRow>> {
    let row = sqlx::query_as::<_, TeamMemberRow>(
        r#"
        UPDATE team_members
        SET jersey_number = $3,
            position = $4
        WHERE team_id = $1 AND athlete_id = $2
        RETURNING id, team_id, athlete_id, jersey_number, position, joined_at
        "#,
    )
    .bind(team_id)
    .bind(athlete_id)
    .bind(jersey_number)
    .bind(position)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn set_jersey<'e>(
    executor: impl PgExecutor<'e>,
    member_id: Uuid,
    jersey_number: i16,
) -> Result<()> {
    sqlx::query("UPDATE team_members SET jersey_number = $2 WHERE id = $1")
        .bind(member_id)
        .bind(jersey_number)
        .execute(executor)
        .await?;

    Ok(())
}
