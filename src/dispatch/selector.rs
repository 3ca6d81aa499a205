use crate::shared::{Direction, Request, UnitId, UnitSnapshot, UnitState};

/// Strategy for choosing which unit answers a hall call.
///
/// The dispatcher hands the strategy a snapshot of every unit in the pool,
/// in ascending id order, together with the call being placed. Returning
/// `None` rejects the call. An implementation must return the id of one of
/// the given snapshots.
pub trait UnitSelector: Send + Sync {
    fn select(&self, units: &[UnitSnapshot], request: &Request) -> Option<UnitId>;
}

/// Default strategy: the nearest suitable unit, lowest id on ties.
///
/// A unit is suitable when it is idle, or when it is already committed to
/// the call's direction and has not yet passed the call's floor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestUnitSelector;

impl UnitSelector for NearestUnitSelector {
    fn select(&self, units: &[UnitSnapshot], request: &Request) -> Option<UnitId> {
        units
            .iter()
            .filter(|unit| Self::is_suitable(unit, request))
            .min_by_key(|unit| ((unit.floor - request.floor).abs(), unit.id))
            .map(|unit| unit.id)
    }
}

impl NearestUnitSelector {
    fn is_suitable(unit: &UnitSnapshot, request: &Request) -> bool {
        if unit.state == UnitState::Idle {
            return true;
        }
        if unit.direction != request.direction {
            return false;
        }
        match unit.direction {
            Direction::Up => unit.floor <= request.floor,
            Direction::Down => unit.floor >= request.floor,
            Direction::Idle => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::HallDirection;

    fn unit(id: UnitId, floor: i32, direction: Direction, state: UnitState) -> UnitSnapshot {
        UnitSnapshot {
            id,
            floor,
            direction,
            state,
        }
    }

    #[test]
    fn test_idle_units_tie_break_on_lowest_id() {
        let units = [
            unit(1, 1, Direction::Idle, UnitState::Idle),
            unit(2, 1, Direction::Idle, UnitState::Idle),
        ];
        let request = Request::hall(5, HallDirection::Up);

        assert_eq!(NearestUnitSelector.select(&units, &request), Some(1));
    }

    #[test]
    fn test_nearest_suitable_unit_wins() {
        let units = [
            unit(1, 1, Direction::Idle, UnitState::Idle),
            unit(2, 9, Direction::Idle, UnitState::Idle),
        ];
        let request = Request::hall(8, HallDirection::Up);

        assert_eq!(NearestUnitSelector.select(&units, &request), Some(2));
    }

    #[test]
    fn test_unit_moving_toward_call_in_same_direction_is_suitable() {
        let units = [unit(1, 2, Direction::Up, UnitState::MovingUp)];
        let request = Request::hall(6, HallDirection::Up);

        assert_eq!(NearestUnitSelector.select(&units, &request), Some(1));
    }

    #[test]
    fn test_unit_that_already_passed_the_floor_is_unsuitable() {
        let units = [unit(1, 7, Direction::Up, UnitState::MovingUp)];
        let request = Request::hall(6, HallDirection::Up);

        assert_eq!(NearestUnitSelector.select(&units, &request), None);
    }

    #[test]
    fn test_opposite_direction_is_unsuitable() {
        let units = [
            unit(1, 6, Direction::Up, UnitState::MovingUp),
            unit(2, 6, Direction::Up, UnitState::MovingUp),
        ];
        let request = Request::hall(3, HallDirection::Down);

        assert_eq!(NearestUnitSelector.select(&units, &request), None);
    }

    #[test]
    fn test_unit_at_the_call_floor_counts_as_not_passed() {
        let units = [unit(1, 4, Direction::Down, UnitState::MovingDown)];
        let request = Request::hall(4, HallDirection::Down);

        assert_eq!(NearestUnitSelector.select(&units, &request), Some(1));
    }

    #[test]
    fn test_doors_open_unit_keeps_its_commitment() {
        // Doors open at 3 on the way up still counts as committed upward
        let units = [unit(1, 3, Direction::Up, UnitState::DoorsOpen)];

        let along = Request::hall(5, HallDirection::Up);
        assert_eq!(NearestUnitSelector.select(&units, &along), Some(1));

        let against = Request::hall(2, HallDirection::Down);
        assert_eq!(NearestUnitSelector.select(&units, &against), None);
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let request = Request::hall(1, HallDirection::Up);

        assert_eq!(NearestUnitSelector.select(&[], &request), None);
    }
}
