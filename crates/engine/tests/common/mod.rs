//! Shared fixtures for the database-backed tests. The suite runs against
//! the database named by `TEST_DATABASE_URL`; when the variable is unset
//! every test returns early so the suite still passes on machines without
//! Postgres.
#![allow(dead_code)] // not every test binary uses every fixture

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use infra::repos::teams::TeamStatus;
use infra::repos::users::UserRole;

pub async fn try_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let pool = infra::db::connect(&url, 5)
        .await
        .expect("failed to connect to the test database");
    infra::db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    Some(pool)
}

/// Insert an active user with the given role and a funded account.
pub async fn create_user(pool: &PgPool, role: UserRole, balance: i64) -> Uuid {
    let id: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, first_name, role)
        VALUES ($1, $2, $3::user_role)
        RETURNING id
        "#,
    )
    .bind(format!("{}@test.local", Uuid::new_v4()))
    .bind("Test")
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .expect("failed to insert user");

    sqlx::query("INSERT INTO accounts (user_id, balance) VALUES ($1, $2)")
        .bind(id.0)
        .bind(balance)
        .execute(pool)
        .await
        .expect("failed to insert account");

    id.0
}

pub async fn create_team(
    pool: &PgPool,
    owner_id: Uuid,
    status: TeamStatus,
    entry_fee: i64,
) -> Uuid {
    let id: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO teams (name, short_name, entry_fee, status, owner_id)
        VALUES ($1, $2, $3, $4::team_status, $5)
        RETURNING id
        "#,
    )
    .bind(format!("Team {}", Uuid::new_v4()))
    .bind("TST")
    .bind(entry_fee)
    .bind(status.as_str())
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .expect("failed to insert team");

    id.0
}

pub async fn add_member(pool: &PgPool, team_id: Uuid, athlete_id: Uuid) {
    sqlx::query("INSERT INTO team_members (team_id, athlete_id) VALUES ($1, $2)")
        .bind(team_id)
        .bind(athlete_id)
        .execute(pool)
        .await
        .expect("failed to insert team member");
}

pub async fn create_match(
    pool: &PgPool,
    home_team_id: Uuid,
    away_team_id: Uuid,
    match_date: NaiveDate,
    kickoff_time: NaiveTime,
) -> Uuid {
    let id: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO matches (home_team_id, away_team_id, match_date, kickoff_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(home_team_id)
    .bind(away_team_id)
    .bind(match_date)
    .bind(kickoff_time)
    .fetch_one(pool)
    .await
    .expect("failed to insert match");

    id.0
}

pub async fn balance(pool: &PgPool, user_id: Uuid) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT balance FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("account missing");
    row.0
}

/// Ledger rows tied to an entity, oldest first.
pub async fn ledger_rows_for(pool: &PgPool, related_entity_id: Uuid) -> Vec<(Uuid, i64, String)> {
    sqlx::query_as(
        r#"
        SELECT account_id, delta, reason_code
        FROM ledger_transactions
        WHERE related_entity_id = $1
        ORDER BY created_at ASC, delta ASC
        "#,
    )
    .bind(related_entity_id)
    .fetch_all(pool)
    .await
    .expect("failed to read ledger rows")
}
