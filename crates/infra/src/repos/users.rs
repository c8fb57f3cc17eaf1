use std::fmt;
use std::str::FromStr;

use sqlx::{PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::{models::UserRow, pagination::LimitOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Sponsor,
    Coach,
    Athlete,
    Referee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Sponsor => "sponsor",
            UserRole::Coach => "coach",
            UserRole::Athlete => "athlete",
            UserRole::Referee => "referee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "sponsor" => Ok(UserRole::Sponsor),
            "coach" => Ok(UserRole::Coach),
            "athlete" => Ok(UserRole::Athlete),
            "referee" => Ok(UserRole::Referee),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

pub struct UserRepo {
    db: PgPool,
}

impl UserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, first_name, last_name, role, profile, is_active, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn list(&self, filter: UserFilter, page: Option<LimitOffset>) -> Result<Vec<UserRow>> {
        let page = page.unwrap_or_default();

        let mut query = sqlx::QueryBuilder::new(
            "SELECT id, email, first_name, last_name, role, profile, is_active, created_at, updated_at FROM users WHERE 1=1"
        );

        if let Some(search) = &filter.search {
            let search_pattern = format!("%{}%", search.to_lowercase());
            query.push(" AND (");
            query.push("LOWER(email) LIKE ");
            query.push_bind(search_pattern.clone());
            query.push(" OR LOWER(first_name) LIKE ");
            query.push_bind(search_pattern);
            query.push(")");
        }

        if let Some(role) = filter.role {
            query.push(" AND role = ");
            query.push_bind(role);
        }

        if let Some(is_active) = filter.is_active {
            query.push(" AND is_active = ");
            query.push_bind(is_active);
        }

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        let rows: Vec<UserRow> = query.build_query_as::<UserRow>().fetch_all(&self.db).await?;

        Ok(rows)
    }
}

/// Resolve the role of an active user.
pub async fn get_role<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<Option<UserRole>> {
    let row: Option<(UserRole,)> =
        sqlx::query_as("SELECT role FROM users WHERE id = $1 AND is_active")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

    Ok(row.map(|r| r.0))
}

/// All active admin account ids, sorted for a deterministic fee-split order.
pub async fn list_admin_ids<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE role = 'admin' AND is_active ORDER BY id")
            .fetch_all(executor)
            .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}
