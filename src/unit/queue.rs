use crate::shared::Direction;
use std::collections::BTreeSet;

/**
 * Pending stops for one unit, kept as two ordered floor sets.
 *
 * The `up` set holds stops to be serviced while travelling up and is
 * consumed in ascending order; the `down` set holds stops for downward
 * travel and is consumed in descending order. A floor appears at most
 * once per side, so repeated submissions of the same stop collapse.
 */
#[derive(Debug, Clone, Default)]
pub struct RequestQueue {
    up: BTreeSet<i32>,
    down: BTreeSet<i32>,
}

impl RequestQueue {
    pub fn new() -> RequestQueue {
        RequestQueue {
            up: BTreeSet::new(),
            down: BTreeSet::new(),
        }
    }

    /// Queues a stop on the upward or downward side. Returns `false` when
    /// the floor was already queued there, in which case nothing changes.
    pub fn insert(&mut self, floor: i32, upward: bool) -> bool {
        if upward {
            debug_assert!(
                !self.down.contains(&floor),
                "floor {} queued on both sides",
                floor
            );
            self.up.insert(floor)
        } else {
            debug_assert!(
                !self.up.contains(&floor),
                "floor {} queued on both sides",
                floor
            );
            self.down.insert(floor)
        }
    }

    /// The next floor to stop at when travelling in `direction`: the lowest
    /// queued floor going up, the highest going down.
    pub fn next_stop(&self, direction: Direction) -> Option<i32> {
        match direction {
            Direction::Up => self.up.first().copied(),
            Direction::Down => self.down.last().copied(),
            Direction::Idle => None,
        }
    }

    /// Removes and returns the next stop for `direction`.
    pub fn pop_next(&mut self, direction: Direction) -> Option<i32> {
        match direction {
            Direction::Up => self.up.pop_first(),
            Direction::Down => self.down.pop_last(),
            Direction::Idle => None,
        }
    }

    pub fn is_empty(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up.is_empty(),
            Direction::Down => self.down.is_empty(),
            Direction::Idle => true,
        }
    }

    /// True when neither side has stops left.
    pub fn is_drained(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }

    pub fn contains(&self, floor: i32) -> bool {
        self.up.contains(&floor) || self.down.contains(&floor)
    }
}
