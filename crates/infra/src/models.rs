use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::repos::join_requests::RequestStatus;
use crate::repos::matches::MatchStatus;
use crate::repos::roster::Position;
use crate::repos::teams::TeamStatus;
use crate::repos::users::UserRole;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub profile: Option<serde_json::Value>, // JSONB field
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Decode the role-shaped profile payload, if one was stored.
    pub fn role_profile(&self) -> Result<Option<RoleProfile>, serde_json::Error> {
        self.profile.clone().map(serde_json::from_value).transpose()
    }
}

/// Registration/profile payloads are shaped by role. The closed set of
/// variants is tagged by the `role` field of the JSON document rather than
/// being a dynamically-shaped object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Athlete(AthleteProfile),
    Coach(CoachProfile),
    Sponsor(SponsorProfile),
    Referee(RefereeProfile),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachProfile {
    pub years_experience: Option<i32>,
    pub certification: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorProfile {
    pub company_name: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefereeProfile {
    pub license_number: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerTransactionRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta: i64,
    pub reason_code: String,
    pub related_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub short_name: String,
    pub logo_ref: Option<String>,
    pub entry_fee: i64,
    pub status: TeamStatus,
    pub rejection_reason: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamMemberRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub jersey_number: Option<i16>,
    pub position: Option<Position>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JoinRequestRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaveRequestRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub match_date: NaiveDate,
    pub kickoff_time: NaiveTime,
    pub venue: Option<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchLineupRow {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub athlete_id: Uuid,
    pub position: Position,
    pub submitted_at: DateTime<Utc>,
}
