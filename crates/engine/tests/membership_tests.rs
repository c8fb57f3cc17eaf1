mod common;

use std::sync::Arc;

use engine::{Decision, ErrorKind, MembershipWorkflow, RecordingSink, WorkflowError, WorkflowEvent};
use infra::repos::join_requests::RequestStatus;
use infra::repos::roster::Position;
use infra::repos::teams::TeamStatus;
use infra::repos::users::UserRole;

fn workflow(pool: sqlx::PgPool) -> (MembershipWorkflow, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (MembershipWorkflow::new(pool, sink.clone()), sink)
}

#[tokio::test]
async fn join_lifecycle_moves_the_entry_fee_and_seats_the_athlete() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 60_000).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 50_000).await;

    let request = workflow
        .request_join(athlete, team, Some("put me in".into()))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let processed = workflow
        .process_join_request(coach, request.id, Decision::Approve, None)
        .await
        .unwrap();
    assert_eq!(processed.status, RequestStatus::Approved);

    assert_eq!(common::balance(&pool, athlete).await, 10_000);
    assert_eq!(common::balance(&pool, coach).await, 50_000);

    let roster = workflow.roster(team).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].athlete_id, athlete);
    assert_eq!(roster[0].jersey_number, None);

    let events = sink.take();
    assert!(matches!(
        events.as_slice(),
        [WorkflowEvent::JoinApproved { athlete_id, .. }] if *athlete_id == athlete
    ));
}

#[tokio::test]
async fn athletes_on_a_team_cannot_file_another_join_request() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let home = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    let other = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    common::add_member(&pool, home, athlete).await;

    let err = workflow.request_join(athlete, other, None).await.unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyInTeam { athlete_id } if athlete_id == athlete));
}

#[tokio::test]
async fn duplicate_pending_requests_are_rejected() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;

    workflow.request_join(athlete, team, None).await.unwrap();
    let err = workflow.request_join(athlete, team, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn joining_an_unapproved_team_is_a_conflict() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Pending, 0).await;

    let err = workflow.request_join(athlete, team, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn approval_fails_atomically_when_the_athlete_cannot_pay() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 49_999).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 50_000).await;

    let request = workflow.request_join(athlete, team, None).await.unwrap();
    let err = workflow
        .process_join_request(coach, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    // Request still pending, roster untouched, no money moved.
    let pending = workflow
        .join_requests(team, Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert!(workflow.roster(team).await.unwrap().is_empty());
    assert_eq!(common::balance(&pool, athlete).await, 49_999);
    assert_eq!(common::balance(&pool, coach).await, 0);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn thirteenth_member_is_rejected_at_capacity() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    for _ in 0..12 {
        let member = common::create_user(&pool, UserRole::Athlete, 0).await;
        common::add_member(&pool, team, member).await;
    }

    let hopeful = common::create_user(&pool, UserRole::Athlete, 0).await;
    let request = workflow.request_join(hopeful, team, None).await.unwrap();
    let err = workflow
        .process_join_request(coach, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::RosterFull { capacity: 12 }));
}

#[tokio::test]
async fn rejecting_requires_a_reason_and_processing_twice_fails() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    let request = workflow.request_join(athlete, team, None).await.unwrap();

    let err = workflow
        .process_join_request(coach, request.id, Decision::Reject, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let rejected = workflow
        .process_join_request(coach, request.id, Decision::Reject, Some("roster strategy".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("roster strategy"));

    let events = sink.take();
    assert!(matches!(
        events.as_slice(),
        [WorkflowEvent::JoinRejected { reason, .. }] if reason == "roster strategy"
    ));

    // A resolved request reads as not found on the second attempt.
    let err = workflow
        .process_join_request(coach, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn only_the_owner_decides_requests() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let rival = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    let request = workflow.request_join(athlete, team, None).await.unwrap();

    let err = workflow
        .process_join_request(rival, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn leaving_frees_the_jersey_number() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    common::add_member(&pool, team, athlete).await;

    workflow
        .update_member(coach, team, athlete, Some(23), Some(Position::Sg))
        .await
        .unwrap();
    sink.take();

    let request = workflow
        .request_leave(athlete, team, Some("moving away".into()))
        .await
        .unwrap();
    let processed = workflow
        .process_leave_request(coach, request.id, Decision::Approve)
        .await
        .unwrap();
    assert_eq!(processed.status, RequestStatus::Approved);
    assert!(workflow.roster(team).await.unwrap().is_empty());

    let events = sink.take();
    assert!(matches!(events.as_slice(), [WorkflowEvent::LeaveApproved { .. }]));

    // Number 23 is free again for the next member.
    let successor = common::create_user(&pool, UserRole::Athlete, 0).await;
    common::add_member(&pool, team, successor).await;
    let member = workflow
        .update_member(coach, team, successor, Some(23), None)
        .await
        .unwrap();
    assert_eq!(member.jersey_number, Some(23));
}

#[tokio::test]
async fn leave_requests_need_an_actual_membership() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let outsider = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;

    let err = workflow.request_leave(outsider, team, None).await.unwrap_err();
    assert!(matches!(err, WorkflowError::AthleteNotOnRoster { .. }));
}

#[tokio::test]
async fn coach_removes_a_player_directly() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let athlete = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    common::add_member(&pool, team, athlete).await;

    workflow.remove_player(coach, team, athlete).await.unwrap();
    assert!(workflow.roster(team).await.unwrap().is_empty());

    let events = sink.take();
    assert!(matches!(
        events.as_slice(),
        [WorkflowEvent::PlayerRemoved { athlete_id, .. }] if *athlete_id == athlete
    ));

    let err = workflow.remove_player(coach, team, athlete).await.unwrap_err();
    assert!(matches!(err, WorkflowError::AthleteNotOnRoster { .. }));
}

#[tokio::test]
async fn duplicate_jersey_numbers_are_rejected() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, _) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let first = common::create_user(&pool, UserRole::Athlete, 0).await;
    let second = common::create_user(&pool, UserRole::Athlete, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    common::add_member(&pool, team, first).await;
    common::add_member(&pool, team, second).await;

    workflow
        .update_member(coach, team, first, Some(7), None)
        .await
        .unwrap();

    let err = workflow
        .update_member(coach, team, second, Some(7), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::JerseyTaken { number: 7 }));

    // Re-submitting a player's own number is fine.
    let member = workflow
        .update_member(coach, team, first, Some(7), Some(Position::Pg))
        .await
        .unwrap();
    assert_eq!(member.jersey_number, Some(7));
    assert_eq!(member.position, Some(Position::Pg));
}

#[tokio::test]
async fn bulk_assignment_covers_everyone_without_collisions() {
    let Some(pool) = common::try_pool().await else { return };
    let (workflow, sink) = workflow(pool.clone());

    let coach = common::create_user(&pool, UserRole::Coach, 0).await;
    let team = common::create_team(&pool, coach, TeamStatus::Approved, 0).await;
    for _ in 0..5 {
        let member = common::create_user(&pool, UserRole::Athlete, 0).await;
        common::add_member(&pool, team, member).await;
    }
    let numbered = common::create_user(&pool, UserRole::Athlete, 0).await;
    common::add_member(&pool, team, numbered).await;
    workflow
        .update_member(coach, team, numbered, Some(10), None)
        .await
        .unwrap();
    sink.take();

    let assigned = workflow.bulk_assign_jerseys(coach, team).await.unwrap();
    assert_eq!(assigned, 5);

    let roster = workflow.roster(team).await.unwrap();
    let mut numbers: Vec<i16> = roster.iter().filter_map(|m| m.jersey_number).collect();
    assert_eq!(numbers.len(), 6);
    numbers.sort_unstable();
    numbers.dedup();
    assert_eq!(numbers.len(), 6, "jersey numbers must be unique");
    assert!(numbers.iter().all(|n| (0..=99).contains(n)));

    assert_eq!(sink.take().len(), 5);

    // Already-numbered rosters are a no-op.
    assert_eq!(workflow.bulk_assign_jerseys(coach, team).await.unwrap(), 0);
}
