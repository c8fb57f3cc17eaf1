//! Starting-lineup submission. Match dates and kickoff times are stored as
//! local wall-clock values in the league's fixed UTC+7 timezone; edits close
//! two hours before kickoff.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{MatchLineupRow, MatchRow};
use infra::repos::lineups;
use infra::repos::matches::{self, MatchStatus};
use infra::repos::roster;
use infra::repos::teams;

use crate::error::{Result, WorkflowError};
use crate::policy::{self, LineupSlot};

pub const BUSINESS_TZ_OFFSET_HOURS: i32 = 7;
pub const LINEUP_LOCK_HOURS: i64 = 2;

/// Kickoff as an absolute instant, interpreting the stored date and time in
/// the league timezone.
pub fn kickoff_instant(match_date: NaiveDate, kickoff_time: NaiveTime) -> DateTime<Utc> {
    let tz = FixedOffset::east_opt(BUSINESS_TZ_OFFSET_HOURS * 3600)
        .expect("fixed offset is in range");
    // A fixed offset has no DST gaps, so every local datetime maps to
    // exactly one instant.
    tz.from_local_datetime(&match_date.and_time(kickoff_time))
        .single()
        .expect("fixed-offset datetime is unambiguous")
        .with_timezone(&Utc)
}

/// Last instant at which the lineup is still editable.
pub fn editable_until(m: &MatchRow) -> DateTime<Utc> {
    kickoff_instant(m.match_date, m.kickoff_time) - Duration::hours(LINEUP_LOCK_HOURS)
}

/// Editable strictly before the cutoff, and only while the match is still
/// scheduled.
pub fn can_edit(m: &MatchRow, now: DateTime<Utc>) -> bool {
    m.status == MatchStatus::Scheduled && now < editable_until(m)
}

pub struct LineupScheduler {
    pool: PgPool,
}

impl LineupScheduler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit or replace a team's lineup for a match.
    pub async fn submit(
        &self,
        coach_id: Uuid,
        match_id: Uuid,
        team_id: Uuid,
        entries: Vec<LineupSlot>,
    ) -> Result<Vec<MatchLineupRow>> {
        self.submit_at(coach_id, match_id, team_id, entries, Utc::now())
            .await
    }

    /// Same as [`submit`](Self::submit) with an explicit clock, so the
    /// cutoff boundary is testable.
    pub async fn submit_at(
        &self,
        coach_id: Uuid,
        match_id: Uuid,
        team_id: Uuid,
        entries: Vec<LineupSlot>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchLineupRow>> {
        let m = matches::get_by_id(&self.pool, match_id)
            .await?
            .ok_or(WorkflowError::MatchNotFound { match_id })?;

        if m.home_team_id != team_id && m.away_team_id != team_id {
            return Err(WorkflowError::TeamNotInMatch { match_id, team_id });
        }
        if !can_edit(&m, now) {
            return Err(WorkflowError::LineupLocked {
                match_id,
                cutoff: editable_until(&m),
            });
        }

        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "submit a lineup for this team",
            });
        }

        let roster_ids: HashSet<Uuid> = roster::list_for_team(&mut *tx, team_id)
            .await?
            .iter()
            .map(|member| member.athlete_id)
            .collect();
        policy::validate_lineup(&entries, &roster_ids)?;

        let pairs: Vec<(Uuid, _)> = entries
            .iter()
            .map(|slot| (slot.athlete_id, slot.position))
            .collect();
        let rows = lineups::replace(&mut tx, match_id, team_id, &pairs).await?;

        tx.commit().await?;

        tracing::info!(%match_id, %team_id, %coach_id, "lineup submitted");

        Ok(rows)
    }

    /// Read side has no cutoff; lineups stay visible after lock.
    pub async fn lineup(&self, match_id: Uuid, team_id: Uuid) -> Result<Vec<MatchLineupRow>> {
        Ok(lineups::list_for_match(&self.pool, match_id, team_id).await?)
    }
}
