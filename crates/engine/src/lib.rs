//! Team lifecycle, roster and escrow workflow engine.
//!
//! This crate is the transport-agnostic core behind the tournament
//! platform's team screens: the team approval state machine and its
//! creation-fee escrow, join/leave membership workflows with entry-fee
//! transfers, roster capacity and jersey rules, and the time-gated match
//! lineup editor. Any API layer (HTTP, GraphQL, RPC) can carry the
//! operation signatures and error kinds verbatim.

pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod lineup;
pub mod membership;
pub mod notify;
pub mod policy;
pub mod team;

pub use config::WorkflowConfig;
pub use directory::AccountDirectory;
pub use error::{ErrorKind, Result, WorkflowError};
pub use ledger::Ledger;
pub use lineup::LineupScheduler;
pub use membership::{Decision, MembershipWorkflow};
pub use notify::{BroadcastSink, NotificationSink, RecordingSink, TracingSink, WorkflowEvent};
pub use policy::LineupSlot;
pub use team::{NewTeam, TeamWorkflow};
