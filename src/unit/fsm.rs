use crate::shared::{Direction, Request, StateEvent, UnitId, UnitSnapshot, UnitState};
use crate::unit::queue::RequestQueue;
use crossbeam_channel as cbc;
use log::debug;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/**
 * Drives one unit of the pool.
 *
 * `UnitFsm` owns the unit's request queue and steps the unit through its
 * lifecycle on a fixed tick: one floor of travel per tick while moving, one
 * tick with the doors open at each serviced stop. Stops ahead of the
 * committed direction are drained before the unit reverses. It receives
 * work from the dispatcher and reports every transition to the
 * notification hub.
 *
 * # Fields
 * - `request_rx`:     Receives stops assigned by the dispatcher.
 * - `terminate_rx`:   Receives the dispatcher's shutdown signal.
 * - `stopped_tx`:     Acknowledges shutdown once the worker loop exits.
 * - `event_tx`:       Reports state changes to the notification hub.
 * - `status`:         Shared snapshot the dispatcher reads when assigning hall calls.
 * - `id`:             This unit's pool id.
 * - `floor`:          The floor the unit is currently at.
 * - `direction`:      Direction of travel the unit is committed to.
 * - `state`:          Current lifecycle state.
 * - `queue`:          Pending stops, split by travel direction.
 * - `tick_interval`:  Wall-clock length of one simulation tick.
 */
pub struct UnitFsm {
    // Dispatcher channels
    request_rx: cbc::Receiver<Request>,
    terminate_rx: cbc::Receiver<()>,
    stopped_tx: cbc::Sender<()>,

    // Notification hub channel
    event_tx: cbc::Sender<StateEvent>,

    // Shared with the dispatcher
    status: Arc<RwLock<UnitSnapshot>>,

    // Private fields
    id: UnitId,
    floor: i32,
    direction: Direction,
    state: UnitState,
    queue: RequestQueue,
    tick_interval: Duration,
}

impl UnitFsm {
    pub fn new(
        id: UnitId,
        start_floor: i32,
        tick_interval: Duration,
        request_rx: cbc::Receiver<Request>,
        terminate_rx: cbc::Receiver<()>,
        stopped_tx: cbc::Sender<()>,
        event_tx: cbc::Sender<StateEvent>,
        status: Arc<RwLock<UnitSnapshot>>,
    ) -> UnitFsm {
        UnitFsm {
            request_rx,
            terminate_rx,
            stopped_tx,
            event_tx,
            status,
            id,
            floor: start_floor,
            direction: Direction::Idle,
            state: UnitState::Idle,
            queue: RequestQueue::new(),
            tick_interval,
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.id
    }

    pub fn run(mut self) {
        let ticker = cbc::tick(self.tick_interval);

        // Announce the starting state before picking up any queued request
        self.publish();

        // Main loop
        loop {
            cbc::select! {
                recv(self.request_rx) -> request => {
                    match request {
                        Ok(request) => self.handle_request(request),
                        Err(_) => break,
                    }
                }
                recv(self.terminate_rx) -> _ => break,
                recv(ticker) -> _ => self.tick(),
            }
        }

        debug!("unit {}: worker stopping", self.id);
        let _ = self.stopped_tx.send(());
    }

    fn handle_request(&mut self, request: Request) {
        debug_assert!(
            self.state != UnitState::Idle || self.queue.is_drained(),
            "idle unit with queued stops"
        );

        let upward = match request.floor.cmp(&self.floor) {
            Ordering::Greater => true,
            Ordering::Less => false,
            // Same floor: keep the stop on the side being serviced so it is
            // taken before the unit travels away. Up when uncommitted.
            Ordering::Equal => self.direction != Direction::Down,
        };

        if !self.queue.insert(request.floor, upward) {
            debug!("unit {}: floor {} already queued", self.id, request.floor);
            return;
        }
        debug!(
            "unit {}: queued {:?} stop at floor {}",
            self.id, request.origin, request.floor
        );

        if self.state == UnitState::Idle {
            match request.floor.cmp(&self.floor) {
                Ordering::Greater => self.transition(UnitState::MovingUp, Direction::Up),
                Ordering::Less => self.transition(UnitState::MovingDown, Direction::Down),
                Ordering::Equal => {
                    // Already there, service the stop without moving
                    let serviced = self.queue.pop_next(Direction::Up);
                    debug_assert_eq!(serviced, Some(self.floor));
                    self.transition(UnitState::DoorsOpen, self.direction);
                }
            }
        }
    }

    fn tick(&mut self) {
        match self.state {
            UnitState::Idle => {}
            UnitState::MovingUp => self.advance(Direction::Up),
            UnitState::MovingDown => self.advance(Direction::Down),
            UnitState::DoorsOpen => self.depart(),
        }
    }

    /// One tick of travel: move one floor toward the nearest stop ahead and
    /// open the doors on arrival.
    fn advance(&mut self, direction: Direction) {
        let stop = match self.queue.next_stop(direction) {
            Some(stop) => stop,
            None => {
                debug_assert!(false, "unit {} moving with no stop ahead", self.id);
                self.depart();
                return;
            }
        };
        debug_assert!(
            (direction == Direction::Up && stop >= self.floor)
                || (direction == Direction::Down && stop <= self.floor),
            "stop {} behind a unit at floor {} travelling {}",
            stop,
            self.floor,
            direction
        );

        if self.floor != stop {
            self.floor += if direction == Direction::Up { 1 } else { -1 };
            self.publish();
        }

        if self.floor == stop {
            let serviced = self.queue.pop_next(direction);
            debug_assert_eq!(serviced, Some(stop));
            self.transition(UnitState::DoorsOpen, self.direction);
        }
    }

    /// Leaves a serviced stop: continue, reverse, or fall back to idle.
    fn depart(&mut self) {
        match self.choose_direction() {
            Direction::Up => self.transition(UnitState::MovingUp, Direction::Up),
            Direction::Down => self.transition(UnitState::MovingDown, Direction::Down),
            Direction::Idle => self.transition(UnitState::Idle, Direction::Idle),
        }
    }

    fn choose_direction(&self) -> Direction {
        // Continue in the current direction of travel if there are any
        // further stops on its side
        if !self.queue.is_empty(self.direction) {
            return self.direction;
        }

        // Otherwise reverse if the opposite side has stops waiting
        let reversed = self.direction.opposite();
        if reversed != Direction::Idle && !self.queue.is_empty(reversed) {
            return reversed;
        }

        // Serviced from standstill: start upward before downward
        if self.direction == Direction::Idle {
            if !self.queue.is_empty(Direction::Up) {
                return Direction::Up;
            }
            if !self.queue.is_empty(Direction::Down) {
                return Direction::Down;
            }
        }

        // Nothing left to do
        Direction::Idle
    }

    fn transition(&mut self, state: UnitState, direction: Direction) {
        if state == self.state && direction == self.direction {
            return;
        }
        self.state = state;
        self.direction = direction;
        debug!("unit {}: {} at floor {}", self.id, self.state, self.floor);
        self.publish();
    }

    /// Writes the shared snapshot and broadcasts one event.
    fn publish(&self) {
        *self.status.write() = UnitSnapshot {
            id: self.id,
            floor: self.floor,
            direction: self.direction,
            state: self.state,
        };
        let _ = self.event_tx.send(StateEvent {
            unit_id: self.id,
            floor: self.floor,
            direction: self.direction,
            state: self.state,
            timestamp: Instant::now(),
        });
    }
}

#[cfg(test)]
impl UnitFsm {
    pub fn test_handle_request(&mut self, request: Request) {
        self.handle_request(request);
    }

    pub fn test_tick(&mut self) {
        self.tick();
    }

    pub fn test_snapshot(&self) -> UnitSnapshot {
        *self.status.read()
    }

    pub fn test_queue_contains(&self, floor: i32) -> bool {
        self.queue.contains(floor)
    }

    pub fn test_queue_drained(&self) -> bool {
        self.queue.is_drained()
    }
}
