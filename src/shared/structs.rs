/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/

/// Identifier of a single unit in the pool. Ids are assigned by the
/// dispatcher, starting at 1, and stay stable for the pool's lifetime.
pub type UnitId = u32;

/// Direction of travel a unit is committed to. `Idle` means the unit has
/// no commitment and may be sent either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match *self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Idle => Direction::Idle,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Idle => write!(f, "idle"),
        }
    }
}

/// Travel direction announced with a hall call. Separate from [`Direction`]
/// so a hall call can never carry `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HallDirection {
    Up,
    Down,
}

impl From<HallDirection> for Direction {
    fn from(item: HallDirection) -> Self {
        match item {
            HallDirection::Up => Direction::Up,
            HallDirection::Down => Direction::Down,
        }
    }
}

impl fmt::Display for HallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HallDirection::Up => write!(f, "up"),
            HallDirection::Down => write!(f, "down"),
        }
    }
}

/// Where a request entered the system: a hall panel shared by the pool, or
/// a destination panel inside one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    External,
    Internal,
}

/** A single serviceable request, as handed to a unit worker.

# Fields

`floor`: The floor the unit must stop at.
`direction`: For hall calls, the travel direction the caller announced.
             Car calls carry `Idle` here; the side they are serviced on is
             decided from the unit's position when the request is queued.
`origin`: Whether this came from a hall panel or an in-car panel.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub floor: i32,
    pub direction: Direction,
    pub origin: RequestOrigin,
}

impl Request {
    pub fn hall(floor: i32, direction: HallDirection) -> Request {
        Request {
            floor,
            direction: direction.into(),
            origin: RequestOrigin::External,
        }
    }

    pub fn car(floor: i32) -> Request {
        Request {
            floor,
            direction: Direction::Idle,
            origin: RequestOrigin::Internal,
        }
    }
}

/// Lifecycle state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Idle,
    MovingUp,
    MovingDown,
    DoorsOpen,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            UnitState::Idle => write!(f, "idle"),
            UnitState::MovingUp => write!(f, "moving up"),
            UnitState::MovingDown => write!(f, "moving down"),
            UnitState::DoorsOpen => write!(f, "doors open"),
        }
    }
}

/** Point-in-time view of one unit, as read by the dispatcher when it
selects a unit for a hall call.

# Fields

`id`: The unit this snapshot describes.
`floor`: The floor the unit was last observed at.
`direction`: The direction the unit is committed to, `Idle` when none.
`state`: The unit's lifecycle state at observation time.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub floor: i32,
    pub direction: Direction,
    pub state: UnitState,
}

/** One state change of one unit, broadcast to every subscribed observer.

A unit emits exactly one event per transition, in the order the
transitions happened, and stamps each with a monotonic timestamp taken
at emission.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEvent {
    pub unit_id: UnitId,
    pub floor: i32,
    pub direction: Direction,
    pub state: UnitState,
    pub timestamp: Instant,
}

/// What became of a submitted hall call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HallCallOutcome {
    /// The call was handed to this unit's queue.
    Assigned(UnitId),
    /// No unit could take the call; the caller may retry later.
    NoUnitAvailable,
}

/// Why a call submission was refused at the dispatcher boundary.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    #[error("unknown unit id {0}")]
    UnknownUnit(UnitId),
    #[error("floor {floor} is outside the serviced range [{min}, {max}]")]
    FloorOutOfRange { floor: i32, min: i32, max: i32 },
    #[error("the dispatcher has been shut down")]
    ShutDown,
}
