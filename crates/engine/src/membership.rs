//! Roster membership: join and leave requests, coach decisions, jersey
//! assignment. Decisions run in a single transaction with the request and
//! team rows locked, so capacity and the entry-fee transfer stay consistent
//! under concurrent approvals.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{JoinRequestRow, LeaveRequestRow, TeamMemberRow};
use infra::repos::accounts::ReasonCode;
use infra::repos::join_requests::{self, CreateJoinRequest, JoinRequestRepo, RequestStatus};
use infra::repos::leave_requests::{self, CreateLeaveRequest, LeaveRequestRepo};
use infra::repos::roster::{self, Position, RosterRepo};
use infra::repos::teams::{self, TeamStatus};
use infra::repos::users::UserRole;

use crate::directory::AccountDirectory;
use crate::error::{Result, WorkflowError};
use crate::ledger;
use crate::notify::{NotificationSink, WorkflowEvent};
use crate::policy::{self, RosterSlot};

/// How a coach resolves a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

pub struct MembershipWorkflow {
    pool: PgPool,
    directory: AccountDirectory,
    sink: Arc<dyn NotificationSink>,
}

impl MembershipWorkflow {
    pub fn new(pool: PgPool, sink: Arc<dyn NotificationSink>) -> Self {
        let directory = AccountDirectory::new(pool.clone());
        Self {
            pool,
            directory,
            sink,
        }
    }

    pub async fn roster(&self, team_id: Uuid) -> Result<Vec<TeamMemberRow>> {
        Ok(RosterRepo::new(self.pool.clone()).list_by_team(team_id).await?)
    }

    /// An athlete asks to join an approved team. One team per athlete and
    /// one pending request per (team, athlete) pair.
    pub async fn request_join(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
        message: Option<String>,
    ) -> Result<JoinRequestRow> {
        self.directory
            .ensure_role(athlete_id, UserRole::Athlete, "request to join a team")
            .await?;

        let team = teams::get_by_id(&self.pool, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;
        if team.status != TeamStatus::Approved {
            return Err(WorkflowError::Conflict(
                "team is not open for new members".into(),
            ));
        }

        if roster::athlete_team(&self.pool, athlete_id).await?.is_some() {
            return Err(WorkflowError::AlreadyInTeam { athlete_id });
        }
        if join_requests::has_pending(&self.pool, team_id, athlete_id).await? {
            return Err(WorkflowError::DuplicateRequest {
                team_id,
                athlete_id,
            });
        }

        let request = JoinRequestRepo::new(self.pool.clone())
            .create(CreateJoinRequest {
                team_id,
                athlete_id,
                message,
            })
            .await?;

        tracing::info!(request_id = %request.id, %team_id, %athlete_id, "join request filed");

        Ok(request)
    }

    /// Coach decision on a join request. Approval re-validates capacity and
    /// membership under the team lock, moves the entry fee from the athlete
    /// to the owner, and seats the athlete — all in one transaction.
    pub async fn process_join_request(
        &self,
        coach_id: Uuid,
        request_id: Uuid,
        decision: Decision,
        rejection_reason: Option<String>,
    ) -> Result<JoinRequestRow> {
        let mut tx = self.pool.begin().await?;

        let request = join_requests::get_for_update(&mut tx, request_id)
            .await?
            .ok_or(WorkflowError::RequestNotFound { request_id })?;
        // A resolved request reads as gone; double-processing is a retry.
        if request.status.is_terminal() {
            return Err(WorkflowError::RequestNotFound { request_id });
        }

        let team = teams::get_for_update(&mut tx, request.team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound {
                team_id: request.team_id,
            })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "decide join requests for this team",
            });
        }

        let processed = match decision {
            Decision::Approve => {
                let roster: Vec<RosterSlot> = roster::list_for_team(&mut *tx, team.id)
                    .await?
                    .iter()
                    .map(RosterSlot::from)
                    .collect();
                policy::validate_addition(&roster, request.athlete_id)?;

                // The athlete may have joined another team since filing.
                if roster::athlete_team(&mut *tx, request.athlete_id)
                    .await?
                    .is_some()
                {
                    return Err(WorkflowError::AlreadyInTeam {
                        athlete_id: request.athlete_id,
                    });
                }

                if team.entry_fee > 0 {
                    ledger::transfer_in(
                        &mut tx,
                        request.athlete_id,
                        &[team.owner_id],
                        team.entry_fee,
                        ReasonCode::JoinFee,
                        Some(team.id),
                    )
                    .await?;
                }

                roster::insert_member(&mut *tx, team.id, request.athlete_id).await?;
                join_requests::mark_processed(&mut *tx, request_id, RequestStatus::Approved, None)
                    .await?
            }
            Decision::Reject => {
                let reason = rejection_reason.as_deref().map(str::trim).unwrap_or("");
                if reason.is_empty() {
                    return Err(WorkflowError::Validation(
                        "a rejection reason is required".into(),
                    ));
                }
                join_requests::mark_processed(
                    &mut *tx,
                    request_id,
                    RequestStatus::Rejected,
                    Some(reason),
                )
                .await?
            }
        };

        tx.commit().await?;

        tracing::info!(
            %request_id,
            team_id = %processed.team_id,
            athlete_id = %processed.athlete_id,
            status = %processed.status,
            "join request resolved"
        );

        self.sink.emit(match decision {
            Decision::Approve => WorkflowEvent::JoinApproved {
                request_id,
                team_id: processed.team_id,
                athlete_id: processed.athlete_id,
            },
            Decision::Reject => WorkflowEvent::JoinRejected {
                request_id,
                team_id: processed.team_id,
                athlete_id: processed.athlete_id,
                reason: processed.rejection_reason.clone().unwrap_or_default(),
            },
        });

        Ok(processed)
    }

    /// An athlete asks to leave their team. Leaving needs coach sign-off.
    pub async fn request_leave(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
        reason: Option<String>,
    ) -> Result<LeaveRequestRow> {
        match roster::athlete_team(&self.pool, athlete_id).await? {
            Some(current) if current == team_id => {}
            _ => return Err(WorkflowError::AthleteNotOnRoster { athlete_id }),
        }
        if leave_requests::has_pending(&self.pool, team_id, athlete_id).await? {
            return Err(WorkflowError::DuplicateRequest {
                team_id,
                athlete_id,
            });
        }

        let request = LeaveRequestRepo::new(self.pool.clone())
            .create(CreateLeaveRequest {
                team_id,
                athlete_id,
                reason,
            })
            .await?;

        tracing::info!(request_id = %request.id, %team_id, %athlete_id, "leave request filed");

        Ok(request)
    }

    /// Approval removes the athlete from the roster, freeing their jersey
    /// number. No refund: the entry fee is not returned on departure.
    pub async fn process_leave_request(
        &self,
        coach_id: Uuid,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<LeaveRequestRow> {
        let mut tx = self.pool.begin().await?;

        let request = leave_requests::get_for_update(&mut tx, request_id)
            .await?
            .ok_or(WorkflowError::RequestNotFound { request_id })?;
        if request.status.is_terminal() {
            return Err(WorkflowError::RequestNotFound { request_id });
        }

        let team = teams::get_for_update(&mut tx, request.team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound {
                team_id: request.team_id,
            })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "decide leave requests for this team",
            });
        }

        let status = match decision {
            Decision::Approve => {
                let removed = roster::remove_member(&mut *tx, team.id, request.athlete_id).await?;
                if !removed {
                    return Err(WorkflowError::AthleteNotOnRoster {
                        athlete_id: request.athlete_id,
                    });
                }
                RequestStatus::Approved
            }
            Decision::Reject => RequestStatus::Rejected,
        };

        let processed = leave_requests::mark_processed(&mut *tx, request_id, status).await?;

        tx.commit().await?;

        tracing::info!(
            %request_id,
            team_id = %processed.team_id,
            athlete_id = %processed.athlete_id,
            status = %processed.status,
            "leave request resolved"
        );

        self.sink.emit(match decision {
            Decision::Approve => WorkflowEvent::LeaveApproved {
                request_id,
                team_id: processed.team_id,
                athlete_id: processed.athlete_id,
            },
            Decision::Reject => WorkflowEvent::LeaveRejected {
                request_id,
                team_id: processed.team_id,
                athlete_id: processed.athlete_id,
            },
        });

        Ok(processed)
    }

    /// Coach removes a player directly, without a leave request.
    pub async fn remove_player(
        &self,
        coach_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "remove players from this team",
            });
        }

        let removed = roster::remove_member(&mut *tx, team_id, athlete_id).await?;
        if !removed {
            return Err(WorkflowError::AthleteNotOnRoster { athlete_id });
        }

        tx.commit().await?;

        tracing::info!(%team_id, %athlete_id, %coach_id, "player removed from roster");

        self.sink.emit(WorkflowEvent::PlayerRemoved {
            team_id,
            athlete_id,
        });

        Ok(())
    }

    /// Coach sets a member's jersey number and position. Both fields are
    /// overwritten with exactly the given values; `None` clears.
    pub async fn update_member(
        &self,
        coach_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
        jersey_number: Option<i16>,
        position: Option<Position>,
    ) -> Result<TeamMemberRow> {
        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "edit roster entries for this team",
            });
        }

        let roster: Vec<RosterSlot> = roster::list_for_team(&mut *tx, team_id)
            .await?
            .iter()
            .map(RosterSlot::from)
            .collect();
        policy::validate_jersey(&roster, athlete_id, jersey_number)?;

        let member = roster::update_member(&mut *tx, team_id, athlete_id, jersey_number, position)
            .await?
            .ok_or(WorkflowError::AthleteNotOnRoster { athlete_id })?;

        tx.commit().await?;

        self.sink.emit(WorkflowEvent::JerseyUpdated {
            team_id,
            athlete_id,
            jersey_number: member.jersey_number,
        });

        Ok(member)
    }

    /// Assign a random free number to every member who has none. Returns how
    /// many players were assigned; running it again is a no-op.
    pub async fn bulk_assign_jerseys(&self, coach_id: Uuid, team_id: Uuid) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;
        if team.owner_id != coach_id {
            return Err(WorkflowError::Forbidden {
                user_id: coach_id,
                action: "assign jerseys for this team",
            });
        }

        let members = roster::list_for_team(&mut *tx, team_id).await?;
        let roster: Vec<RosterSlot> = members.iter().map(RosterSlot::from).collect();

        let unassigned: Vec<&TeamMemberRow> = members
            .iter()
            .filter(|m| m.jersey_number.is_none())
            .collect();
        if unassigned.is_empty() {
            return Ok(0);
        }

        let mut available = policy::available_jerseys(&roster);
        if available.len() < unassigned.len() {
            return Err(WorkflowError::InsufficientNumbers {
                available: available.len(),
                unassigned: unassigned.len(),
            });
        }

        {
            use rand::seq::SliceRandom;
            available.shuffle(&mut rand::rng());
        }

        let mut assigned: Vec<(Uuid, i16)> = Vec::with_capacity(unassigned.len());
        for (member, number) in unassigned.iter().zip(available) {
            roster::set_jersey(&mut *tx, member.id, number).await?;
            assigned.push((member.athlete_id, number));
        }

        tx.commit().await?;

        tracing::info!(%team_id, count = assigned.len(), "jersey numbers assigned in bulk");

        for (athlete_id, number) in &assigned {
            self.sink.emit(WorkflowEvent::JerseyUpdated {
                team_id,
                athlete_id: *athlete_id,
                jersey_number: Some(*number),
            });
        }

        Ok(assigned.len())
    }

    pub async fn join_requests(
        &self,
        team_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<JoinRequestRow>> {
        Ok(JoinRequestRepo::new(self.pool.clone())
            .list_by_team(team_id, status)
            .await?)
    }

    pub async fn leave_requests(
        &self,
        team_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<LeaveRequestRow>> {
        Ok(LeaveRequestRepo::new(self.pool.clone())
            .list_by_team(team_id, status)
            .await?)
    }
}
