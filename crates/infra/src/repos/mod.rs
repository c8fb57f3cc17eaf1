pub mod accounts;
pub mod join_requests;
pub mod leave_requests;
pub mod ledger_transactions;
pub mod lineups;
pub mod matches;
pub mod roster;
pub mod teams;
pub mod users;

pub use accounts::{AccountRepo, ReasonCode};
pub use join_requests::{CreateJoinRequest, JoinRequestRepo, RequestStatus};
pub use leave_requests::{CreateLeaveRequest, LeaveRequestRepo};
pub use ledger_transactions::{CreateLedgerTransaction, LedgerTransactionRepo};
pub use lineups::LineupRepo;
pub use matches::{CreateMatchData, MatchRepo, MatchStatus};
pub use roster::{Position, RosterRepo};
pub use teams::{CreateTeamData, TeamRepo, TeamStatus, UpdateTeamData};
pub use users::{UserFilter, UserRepo, UserRole};
