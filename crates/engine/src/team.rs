//! Team lifecycle state machine. A coach proposes, an admin approves or
//! rejects, and approval debits the fixed creation fee from the owner into
//! the admin accounts in the same transaction as the status change.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use infra::models::TeamRow;
use infra::repos::accounts::ReasonCode;
use infra::repos::roster;
use infra::repos::teams::{self, CreateTeamData, TeamRepo, TeamStatus, UpdateTeamData};
use infra::repos::users::UserRole;

use crate::config::WorkflowConfig;
use crate::directory::AccountDirectory;
use crate::error::{Result, WorkflowError};
use crate::ledger;
use crate::notify::{NotificationSink, WorkflowEvent};
use crate::policy;

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub short_name: String,
    pub logo_ref: Option<String>,
    pub entry_fee: i64,
}

pub struct TeamWorkflow {
    pool: PgPool,
    directory: AccountDirectory,
    sink: Arc<dyn NotificationSink>,
    config: WorkflowConfig,
}

impl TeamWorkflow {
    pub fn new(pool: PgPool, sink: Arc<dyn NotificationSink>, config: WorkflowConfig) -> Self {
        let directory = AccountDirectory::new(pool.clone());
        Self {
            pool,
            directory,
            sink,
            config,
        }
    }

    pub async fn get(&self, team_id: Uuid) -> Result<TeamRow> {
        TeamRepo::new(self.pool.clone())
            .get(team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })
    }

    /// A coach proposes a team; it lands in `pending` awaiting admin review.
    pub async fn create(&self, owner_id: Uuid, data: NewTeam) -> Result<TeamRow> {
        self.directory
            .ensure_role(owner_id, UserRole::Coach, "create a team")
            .await?;

        if data.name.trim().is_empty() || data.short_name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "team name and short name are required".into(),
            ));
        }
        if data.entry_fee < 0 {
            return Err(WorkflowError::Validation(
                "entry fee must not be negative".into(),
            ));
        }

        let team = TeamRepo::new(self.pool.clone())
            .create(CreateTeamData {
                name: data.name,
                short_name: data.short_name,
                logo_ref: data.logo_ref,
                entry_fee: data.entry_fee,
                owner_id,
            })
            .await?;

        tracing::info!(team_id = %team.id, %owner_id, "team created, pending approval");

        Ok(team)
    }

    /// Admin approval: `pending → approved` plus the creation-fee escrow.
    /// The fee debit and the status change commit or roll back together; on
    /// `InsufficientFunds` the team stays `pending`.
    pub async fn approve(&self, admin_id: Uuid, team_id: Uuid) -> Result<TeamRow> {
        self.directory
            .ensure_role(admin_id, UserRole::Admin, "approve a team")
            .await?;

        let admins = self.directory.list_admins().await?;
        if admins.is_empty() {
            return Err(WorkflowError::Validation(
                "no active admin accounts to receive the creation fee".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        if team.status != TeamStatus::Pending {
            return Err(WorkflowError::InvalidTransition {
                from: team.status,
                event: "approve",
            });
        }

        if self.config.team_creation_fee > 0 {
            ledger::transfer_in(
                &mut tx,
                team.owner_id,
                &admins,
                self.config.team_creation_fee,
                ReasonCode::TeamApprovalFee,
                Some(team_id),
            )
            .await?;
        }

        let updated = teams::set_status(&mut *tx, team_id, TeamStatus::Approved, None)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        tx.commit().await?;

        tracing::info!(%team_id, %admin_id, fee = self.config.team_creation_fee, "team approved");

        self.sink.emit(WorkflowEvent::TeamApproved {
            team_id,
            owner_id: updated.owner_id,
        });

        Ok(updated)
    }

    pub async fn reject(&self, admin_id: Uuid, team_id: Uuid, reason: &str) -> Result<TeamRow> {
        self.directory
            .ensure_role(admin_id, UserRole::Admin, "reject a team")
            .await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::Validation(
                "a rejection reason is required".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        if team.status != TeamStatus::Pending {
            return Err(WorkflowError::InvalidTransition {
                from: team.status,
                event: "reject",
            });
        }

        let updated = teams::set_status(&mut *tx, team_id, TeamStatus::Rejected, Some(reason))
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        tx.commit().await?;

        tracing::info!(%team_id, %admin_id, reason, "team rejected");

        self.sink.emit(WorkflowEvent::TeamRejected {
            team_id,
            owner_id: updated.owner_id,
            reason: reason.to_string(),
        });

        Ok(updated)
    }

    /// Owner resubmits a rejected team for another review pass.
    pub async fn resubmit(&self, owner_id: Uuid, team_id: Uuid) -> Result<TeamRow> {
        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        if team.owner_id != owner_id {
            return Err(WorkflowError::Forbidden {
                user_id: owner_id,
                action: "resubmit this team",
            });
        }
        if team.status != TeamStatus::Rejected {
            return Err(WorkflowError::InvalidTransition {
                from: team.status,
                event: "resubmit",
            });
        }

        let updated = teams::set_status(&mut *tx, team_id, TeamStatus::Pending, None)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        tx.commit().await?;

        tracing::info!(%team_id, %owner_id, "team resubmitted for approval");

        Ok(updated)
    }

    /// Field edits by the owner. The entry fee freezes once an approved team
    /// has members (players paid it); name/logo stay editable until the
    /// roster is full.
    pub async fn update(
        &self,
        owner_id: Uuid,
        team_id: Uuid,
        data: UpdateTeamData,
    ) -> Result<TeamRow> {
        if let Some(fee) = data.entry_fee {
            if fee < 0 {
                return Err(WorkflowError::Validation(
                    "entry fee must not be negative".into(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        if team.owner_id != owner_id {
            return Err(WorkflowError::Forbidden {
                user_id: owner_id,
                action: "update this team",
            });
        }

        let player_count = roster::member_count(&mut *tx, team_id).await?;

        if data.entry_fee.is_some() && team.status == TeamStatus::Approved && player_count > 0 {
            return Err(WorkflowError::Conflict(
                "entry fee cannot change after players have joined".into(),
            ));
        }
        if data.touches_identity() && player_count >= policy::ROSTER_CAPACITY as i64 {
            return Err(WorkflowError::Conflict(
                "team details are locked once the roster is full".into(),
            ));
        }

        let updated = teams::update_fields(&mut *tx, team_id, data)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Owner deletes a team. Only allowed while nobody is on the roster,
    /// whatever the status.
    pub async fn delete(&self, owner_id: Uuid, team_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let team = teams::get_for_update(&mut tx, team_id)
            .await?
            .ok_or(WorkflowError::TeamNotFound { team_id })?;

        if team.owner_id != owner_id {
            return Err(WorkflowError::Forbidden {
                user_id: owner_id,
                action: "delete this team",
            });
        }

        let player_count = roster::member_count(&mut *tx, team_id).await?;
        if player_count > 0 {
            return Err(WorkflowError::Conflict(format!(
                "team still has {player_count} players on the roster"
            )));
        }

        teams::delete(&mut *tx, team_id).await?;
        tx.commit().await?;

        tracing::info!(%team_id, %owner_id, "team deleted");

        Ok(())
    }
}
