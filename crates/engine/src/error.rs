use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use infra::repos::roster::Position;
use infra::repos::teams::TeamStatus;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Every error the workflow core can return. Variants carry enough
/// structured data (amounts, ids, reasons) for a caller to render an exact
/// message without re-querying.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("user {user_id} is not allowed to {action}")]
    Forbidden { user_id: Uuid, action: &'static str },

    #[error("athlete {athlete_id} already belongs to a team")]
    AlreadyInTeam { athlete_id: Uuid },

    #[error("athlete {athlete_id} already has a pending request for team {team_id}")]
    DuplicateRequest { team_id: Uuid, athlete_id: Uuid },

    #[error("roster is full ({capacity} players)")]
    RosterFull { capacity: usize },

    #[error("athlete {athlete_id} is already on the roster")]
    DuplicateAthlete { athlete_id: Uuid },

    #[error("jersey number {number} is already taken")]
    JerseyTaken { number: i16 },

    #[error("jersey number {number} is out of range (0-99)")]
    JerseyOutOfRange { number: i16 },

    #[error("{unassigned} players need numbers but only {available} are free")]
    InsufficientNumbers { available: usize, unassigned: usize },

    #[error("insufficient funds: required {required}, available {available} (short {shortage})")]
    InsufficientFunds {
        required: i64,
        available: i64,
        shortage: i64,
    },

    #[error("adjustment of {delta} would take account {account_id} below zero (balance {balance})")]
    InvalidAmount {
        account_id: Uuid,
        balance: i64,
        delta: i64,
    },

    #[error("cannot {event} a team in status {from}")]
    InvalidTransition {
        from: TeamStatus,
        event: &'static str,
    },

    #[error("team {team_id} not found")]
    TeamNotFound { team_id: Uuid },

    #[error("account {account_id} not found")]
    AccountNotFound { account_id: Uuid },

    #[error("match {match_id} not found")]
    MatchNotFound { match_id: Uuid },

    #[error("request {request_id} not found or already processed")]
    RequestNotFound { request_id: Uuid },

    #[error("athlete {athlete_id} is not on the roster")]
    AthleteNotOnRoster { athlete_id: Uuid },

    #[error("team {team_id} is not fielded in match {match_id}")]
    TeamNotInMatch { match_id: Uuid, team_id: Uuid },

    #[error("lineup must have exactly {expected} players, got {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("position {position} appears more than once in the lineup")]
    DuplicatePosition { position: Position },

    #[error("position {position} is missing from the lineup")]
    MissingPosition { position: Position },

    #[error("lineup for match {match_id} is locked (cutoff was {cutoff})")]
    LineupLocked {
        match_id: Uuid,
        cutoff: DateTime<Utc>,
    },

    #[error("storage error")]
    Storage(#[from] sqlx::Error),
}

/// Error classes, so a transport can map them to its own status codes
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    InsufficientFunds,
    Locked,
    Forbidden,
    Storage,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_)
            | WorkflowError::JerseyOutOfRange { .. }
            | WorkflowError::WrongSize { .. } => ErrorKind::Validation,

            WorkflowError::Conflict(_)
            | WorkflowError::AlreadyInTeam { .. }
            | WorkflowError::DuplicateRequest { .. }
            | WorkflowError::RosterFull { .. }
            | WorkflowError::DuplicateAthlete { .. }
            | WorkflowError::JerseyTaken { .. }
            | WorkflowError::InsufficientNumbers { .. }
            | WorkflowError::InvalidAmount { .. }
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::AthleteNotOnRoster { .. }
            | WorkflowError::TeamNotInMatch { .. }
            | WorkflowError::DuplicatePosition { .. }
            | WorkflowError::MissingPosition { .. } => ErrorKind::Conflict,

            WorkflowError::TeamNotFound { .. }
            | WorkflowError::AccountNotFound { .. }
            | WorkflowError::MatchNotFound { .. }
            | WorkflowError::RequestNotFound { .. } => ErrorKind::NotFound,

            WorkflowError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WorkflowError::LineupLocked { .. } => ErrorKind::Locked,
            WorkflowError::Forbidden { .. } => ErrorKind::Forbidden,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }
}
