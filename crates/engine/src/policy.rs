//! Pure roster rules: capacity, jersey uniqueness, lineup shape. No I/O —
//! the workflows feed these functions rows they fetched under row locks.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use infra::models::TeamMemberRow;
use infra::repos::roster::Position;

use crate::error::WorkflowError;

pub const ROSTER_CAPACITY: usize = 12;
pub const JERSEY_MIN: i16 = 0;
pub const JERSEY_MAX: i16 = 99;
pub const LINEUP_SIZE: usize = 5;

/// The slice of a roster entry these rules need.
#[derive(Debug, Clone, Copy)]
pub struct RosterSlot {
    pub athlete_id: Uuid,
    pub jersey_number: Option<i16>,
}

impl From<&TeamMemberRow> for RosterSlot {
    fn from(row: &TeamMemberRow) -> Self {
        Self {
            athlete_id: row.athlete_id,
            jersey_number: row.jersey_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LineupSlot {
    pub athlete_id: Uuid,
    pub position: Position,
}

pub fn validate_addition(
    roster: &[RosterSlot],
    athlete_id: Uuid,
) -> Result<(), WorkflowError> {
    if roster.iter().any(|slot| slot.athlete_id == athlete_id) {
        return Err(WorkflowError::DuplicateAthlete { athlete_id });
    }
    if roster.len() >= ROSTER_CAPACITY {
        return Err(WorkflowError::RosterFull {
            capacity: ROSTER_CAPACITY,
        });
    }
    Ok(())
}

/// None is always valid and never conflicts; an athlete keeps their own
/// number without it counting as taken.
pub fn validate_jersey(
    roster: &[RosterSlot],
    athlete_id: Uuid,
    number: Option<i16>,
) -> Result<(), WorkflowError> {
    let Some(number) = number else {
        return Ok(());
    };

    if !(JERSEY_MIN..=JERSEY_MAX).contains(&number) {
        return Err(WorkflowError::JerseyOutOfRange { number });
    }

    let taken = roster.iter().any(|slot| {
        slot.athlete_id != athlete_id && slot.jersey_number == Some(number)
    });
    if taken {
        return Err(WorkflowError::JerseyTaken { number });
    }

    Ok(())
}

/// Numbers in 0..=99 not currently assigned, ascending.
pub fn available_jerseys(roster: &[RosterSlot]) -> Vec<i16> {
    let taken: HashSet<i16> = roster.iter().filter_map(|slot| slot.jersey_number).collect();
    (JERSEY_MIN..=JERSEY_MAX)
        .filter(|n| !taken.contains(n))
        .collect()
}

/// Uniformly pick one available number, or None when the pool is exhausted.
pub fn random_available_jersey<R: Rng + ?Sized>(
    roster: &[RosterSlot],
    rng: &mut R,
) -> Option<i16> {
    available_jerseys(roster).choose(rng).copied()
}

/// Exactly five entries covering PG/SG/SF/PF/C once each, every athlete on
/// the roster and no athlete listed twice.
pub fn validate_lineup(
    entries: &[LineupSlot],
    roster_ids: &HashSet<Uuid>,
) -> Result<(), WorkflowError> {
    if entries.len() != LINEUP_SIZE {
        return Err(WorkflowError::WrongSize {
            expected: LINEUP_SIZE,
            actual: entries.len(),
        });
    }

    let mut seen_positions: HashSet<Position> = HashSet::new();
    let mut seen_athletes: HashSet<Uuid> = HashSet::new();
    for entry in entries {
        if !roster_ids.contains(&entry.athlete_id) {
            return Err(WorkflowError::AthleteNotOnRoster {
                athlete_id: entry.athlete_id,
            });
        }
        if !seen_athletes.insert(entry.athlete_id) {
            return Err(WorkflowError::DuplicateAthlete {
                athlete_id: entry.athlete_id,
            });
        }
        if !seen_positions.insert(entry.position) {
            return Err(WorkflowError::DuplicatePosition {
                position: entry.position,
            });
        }
    }

    for position in Position::ALL {
        if !seen_positions.contains(&position) {
            return Err(WorkflowError::MissingPosition { position });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(jersey: Option<i16>) -> RosterSlot {
        RosterSlot {
            athlete_id: Uuid::new_v4(),
            jersey_number: jersey,
        }
    }

    fn roster_of(n: usize) -> Vec<RosterSlot> {
        (0..n).map(|i| slot(Some(i as i16))).collect()
    }

    #[test]
    fn addition_rejected_at_capacity() {
        let roster = roster_of(ROSTER_CAPACITY);
        let err = validate_addition(&roster, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, WorkflowError::RosterFull { capacity: 12 }));
    }

    #[test]
    fn addition_rejected_for_existing_member() {
        let roster = roster_of(3);
        let existing = roster[1].athlete_id;
        let err = validate_addition(&roster, existing).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateAthlete { athlete_id } if athlete_id == existing));
    }

    #[test]
    fn addition_allowed_below_capacity() {
        let roster = roster_of(ROSTER_CAPACITY - 1);
        assert!(validate_addition(&roster, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn null_jersey_is_always_valid() {
        let roster = roster_of(ROSTER_CAPACITY);
        assert!(validate_jersey(&roster, Uuid::new_v4(), None).is_ok());
    }

    #[test]
    fn jersey_range_is_0_to_99() {
        let roster = vec![];
        assert!(validate_jersey(&roster, Uuid::new_v4(), Some(0)).is_ok());
        assert!(validate_jersey(&roster, Uuid::new_v4(), Some(99)).is_ok());
        assert!(matches!(
            validate_jersey(&roster, Uuid::new_v4(), Some(100)),
            Err(WorkflowError::JerseyOutOfRange { number: 100 })
        ));
        assert!(matches!(
            validate_jersey(&roster, Uuid::new_v4(), Some(-1)),
            Err(WorkflowError::JerseyOutOfRange { number: -1 })
        ));
    }

    #[test]
    fn taken_jersey_conflicts_but_own_number_does_not() {
        let roster = roster_of(2);
        let holder = roster[0].athlete_id;
        assert!(matches!(
            validate_jersey(&roster, Uuid::new_v4(), Some(0)),
            Err(WorkflowError::JerseyTaken { number: 0 })
        ));
        // Re-submitting the holder's own number is a no-op, not a conflict.
        assert!(validate_jersey(&roster, holder, Some(0)).is_ok());
    }

    #[test]
    fn random_jersey_avoids_taken_numbers() {
        // 99 of 100 numbers taken: the draw must return the single free one.
        let roster: Vec<RosterSlot> = (0..99).map(|i| slot(Some(i))).collect();
        let mut rng = rand::rng();
        for _ in 0..10 {
            assert_eq!(random_available_jersey(&roster, &mut rng), Some(99));
        }
    }

    #[test]
    fn random_jersey_none_when_pool_exhausted() {
        let roster: Vec<RosterSlot> = (0..100).map(|i| slot(Some(i))).collect();
        let mut rng = rand::rng();
        assert_eq!(random_available_jersey(&roster, &mut rng), None);
    }

    fn lineup(positions: &[Position]) -> (Vec<LineupSlot>, HashSet<Uuid>) {
        let entries: Vec<LineupSlot> = positions
            .iter()
            .map(|&position| LineupSlot {
                athlete_id: Uuid::new_v4(),
                position,
            })
            .collect();
        let roster_ids = entries.iter().map(|e| e.athlete_id).collect();
        (entries, roster_ids)
    }

    #[test]
    fn full_cover_lineup_is_valid() {
        let (entries, roster_ids) = lineup(&Position::ALL);
        assert!(validate_lineup(&entries, &roster_ids).is_ok());
    }

    #[test]
    fn wrong_size_rejected() {
        let (entries, roster_ids) = lineup(&Position::ALL[..4]);
        assert!(matches!(
            validate_lineup(&entries, &roster_ids),
            Err(WorkflowError::WrongSize { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn two_point_guards_and_no_center_rejected() {
        // Size-5 compliant but not an exact cover.
        let (entries, roster_ids) = lineup(&[
            Position::Pg,
            Position::Pg,
            Position::Sg,
            Position::Sf,
            Position::Pf,
        ]);
        assert!(matches!(
            validate_lineup(&entries, &roster_ids),
            Err(WorkflowError::DuplicatePosition { position: Position::Pg })
        ));
    }

    #[test]
    fn off_roster_athlete_rejected() {
        let (entries, mut roster_ids) = lineup(&Position::ALL);
        let outsider = entries[2].athlete_id;
        roster_ids.remove(&outsider);
        assert!(matches!(
            validate_lineup(&entries, &roster_ids),
            Err(WorkflowError::AthleteNotOnRoster { athlete_id }) if athlete_id == outsider
        ));
    }

    #[test]
    fn athlete_listed_twice_rejected() {
        let (mut entries, roster_ids) = lineup(&Position::ALL);
        entries[1].athlete_id = entries[0].athlete_id;
        assert!(matches!(
            validate_lineup(&entries, &roster_ids),
            Err(WorkflowError::DuplicateAthlete { .. })
        ));
    }
}
