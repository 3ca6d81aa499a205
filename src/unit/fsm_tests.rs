/*
 * Unit tests for the unit worker
 *
 * The unit tests follow the Arrange, Act, Assert pattern. Most tests drive
 * the state machine tick by tick through the test accessors; the last
 * three run the worker on its own thread and observe it over channels.
 *
 * Tests:
 * - test_request_above_starts_upward_travel
 * - test_request_below_starts_downward_travel
 * - test_request_at_current_floor_opens_doors_immediately
 * - test_travel_stops_at_floor_and_returns_to_idle
 * - test_hall_call_below_an_idle_unit_travels_down
 * - test_duplicate_requests_are_serviced_once
 * - test_upward_stops_drain_before_reversal
 * - test_repeat_call_at_standstill_reopens_doors
 * - test_fsm_init_announces_state
 * - test_fsm_services_hall_call_end_to_end
 * - test_fsm_terminate_acknowledges
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::shared::{Direction, HallDirection, Request, StateEvent, UnitSnapshot, UnitState};
    use crate::UnitFsm;
    use crossbeam_channel::unbounded;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use std::thread::spawn;
    use std::time::Duration;

    fn setup_fsm(
        start_floor: i32,
    ) -> (
        UnitFsm,
        crossbeam_channel::Sender<Request>,
        crossbeam_channel::Sender<()>,
        crossbeam_channel::Receiver<()>,
        crossbeam_channel::Receiver<StateEvent>,
    ) {
        // Arrange mock channels
        let (request_tx, request_rx) = unbounded::<Request>();
        let (terminate_tx, terminate_rx) = unbounded::<()>();
        let (stopped_tx, stopped_rx) = unbounded::<()>();
        let (event_tx, event_rx) = unbounded::<StateEvent>();

        let status = Arc::new(RwLock::new(UnitSnapshot {
            id: 1,
            floor: start_floor,
            direction: Direction::Idle,
            state: UnitState::Idle,
        }));

        // Create the FSM and return it with the channels
        (
            UnitFsm::new(
                1,
                start_floor,
                Duration::from_millis(10),
                request_rx,
                terminate_rx,
                stopped_tx,
                event_tx,
                status,
            ),
            request_tx,
            terminate_tx,
            stopped_rx,
            event_rx,
        )
    }

    #[test]
    fn test_request_above_starts_upward_travel() {
        // Purpose: Verify that an idle unit commits upward when the stop is above it

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, event_rx) = setup_fsm(1);

        // Act
        fsm.test_handle_request(Request::hall(5, HallDirection::Up));

        // Assert
        let snapshot = fsm.test_snapshot();
        assert_eq!(snapshot.state, UnitState::MovingUp);
        assert_eq!(snapshot.direction, Direction::Up);
        assert_eq!(snapshot.floor, 1);
        assert_eq!(event_rx.try_iter().count(), 1);
    }

    #[test]
    fn test_request_below_starts_downward_travel() {
        // Purpose: Verify that an idle unit commits downward when the stop is below it

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, _event_rx) = setup_fsm(9);

        // Act
        fsm.test_handle_request(Request::car(2));

        // Assert
        let snapshot = fsm.test_snapshot();
        assert_eq!(snapshot.state, UnitState::MovingDown);
        assert_eq!(snapshot.direction, Direction::Down);
        assert_eq!(snapshot.floor, 9);
    }

    #[test]
    fn test_request_at_current_floor_opens_doors_immediately() {
        // Purpose: Verify that a stop at the unit's own floor is serviced without travel

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, _event_rx) = setup_fsm(4);

        // Act
        fsm.test_handle_request(Request::car(4));

        // Assert
        assert_eq!(fsm.test_snapshot().state, UnitState::DoorsOpen);
        assert_eq!(fsm.test_snapshot().floor, 4);
        assert!(fsm.test_queue_drained());

        fsm.test_tick();
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);
        assert_eq!(fsm.test_snapshot().direction, Direction::Idle);
    }

    #[test]
    fn test_travel_stops_at_floor_and_returns_to_idle() {
        // Purpose: Verify the full journey for a single stop, one event per change

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, event_rx) = setup_fsm(1);

        // Act
        fsm.test_handle_request(Request::hall(5, HallDirection::Up));
        for _ in 0..4 {
            fsm.test_tick();
        }

        // Assert
        let snapshot = fsm.test_snapshot();
        assert_eq!(snapshot.floor, 5);
        assert_eq!(snapshot.state, UnitState::DoorsOpen);

        fsm.test_tick();
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);

        let events: Vec<(i32, UnitState)> =
            event_rx.try_iter().map(|e| (e.floor, e.state)).collect();
        assert_eq!(
            events,
            vec![
                (1, UnitState::MovingUp),
                (2, UnitState::MovingUp),
                (3, UnitState::MovingUp),
                (4, UnitState::MovingUp),
                (5, UnitState::MovingUp),
                (5, UnitState::DoorsOpen),
                (5, UnitState::Idle),
            ]
        );
    }

    #[test]
    fn test_hall_call_below_an_idle_unit_travels_down() {
        // Purpose: Verify that an idle unit above an up-call still travels down to fetch it

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, _event_rx) = setup_fsm(5);

        // Act
        fsm.test_handle_request(Request::hall(3, HallDirection::Up));
        fsm.test_tick();
        fsm.test_tick();

        // Assert
        assert_eq!(fsm.test_snapshot().floor, 3);
        assert_eq!(fsm.test_snapshot().state, UnitState::DoorsOpen);

        fsm.test_tick();
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);
        assert!(fsm.test_queue_drained());
    }

    #[test]
    fn test_duplicate_requests_are_serviced_once() {
        // Purpose: Verify that a floor queued twice on the same side opens the doors once

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, event_rx) = setup_fsm(1);

        // Act
        fsm.test_handle_request(Request::hall(3, HallDirection::Up));
        fsm.test_handle_request(Request::car(3));
        for _ in 0..4 {
            fsm.test_tick();
        }

        // Assert
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);
        assert!(fsm.test_queue_drained());
        let doors = event_rx
            .try_iter()
            .filter(|e| e.state == UnitState::DoorsOpen)
            .count();
        assert_eq!(doors, 1);
    }

    #[test]
    fn test_upward_stops_drain_before_reversal() {
        // Purpose: Verify that a stop behind the unit waits until the committed
        // direction is drained

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, _event_rx) = setup_fsm(1);
        fsm.test_handle_request(Request::car(8));
        for _ in 0..4 {
            fsm.test_tick();
        }
        assert_eq!(fsm.test_snapshot().floor, 5);
        assert_eq!(fsm.test_snapshot().state, UnitState::MovingUp);

        // Act
        fsm.test_handle_request(Request::car(3));
        assert!(fsm.test_queue_contains(3));

        let mut doors = Vec::new();
        for _ in 0..64 {
            fsm.test_tick();
            let snapshot = fsm.test_snapshot();
            if snapshot.state == UnitState::MovingDown {
                // May only reverse once the upward side is drained
                assert!(doors.contains(&8));
            }
            if snapshot.state == UnitState::DoorsOpen && doors.last() != Some(&snapshot.floor) {
                doors.push(snapshot.floor);
            }
            if snapshot.state == UnitState::Idle {
                break;
            }
        }

        // Assert
        assert_eq!(doors, vec![8, 3]);
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);
        assert!(fsm.test_queue_drained());
    }

    #[test]
    fn test_repeat_call_at_standstill_reopens_doors() {
        // Purpose: Verify that a call for the current floor arriving during the
        // doors-open tick is serviced again instead of lost

        // Arrange
        let (mut fsm, _request_tx, _terminate_tx, _stopped_rx, event_rx) = setup_fsm(2);
        fsm.test_handle_request(Request::car(2));
        assert_eq!(fsm.test_snapshot().state, UnitState::DoorsOpen);

        // Act
        fsm.test_handle_request(Request::car(2));
        for _ in 0..3 {
            fsm.test_tick();
        }

        // Assert
        assert_eq!(fsm.test_snapshot().state, UnitState::Idle);
        assert_eq!(fsm.test_snapshot().floor, 2);
        let doors = event_rx
            .try_iter()
            .filter(|e| e.state == UnitState::DoorsOpen)
            .count();
        assert_eq!(doors, 2);
    }

    #[test]
    fn test_fsm_init_announces_state() {
        // Purpose: Verify that the worker reports its starting state as soon as it runs

        // Arrange
        let (fsm, _request_tx, terminate_tx, stopped_rx, event_rx) = setup_fsm(1);
        let fsm_thread = spawn(move || fsm.run());

        // Assert
        match event_rx.recv_timeout(Duration::from_secs(3)) {
            Ok(event) => {
                assert_eq!(event.unit_id, 1);
                assert_eq!(event.floor, 1);
                assert_eq!(event.state, UnitState::Idle);
                assert_eq!(event.direction, Direction::Idle);
            }
            Err(e) => panic!("no initial state event: {:?}", e),
        }

        // Cleanup
        terminate_tx.send(()).unwrap();
        stopped_rx.recv_timeout(Duration::from_secs(3)).unwrap();
        fsm_thread.join().unwrap();
    }

    #[test]
    fn test_fsm_services_hall_call_end_to_end() {
        // Purpose: Verify that a running worker travels to a submitted stop and that
        // its event stream is ordered

        // Arrange
        let (fsm, request_tx, terminate_tx, stopped_rx, event_rx) = setup_fsm(1);
        let fsm_thread = spawn(move || fsm.run());

        // Act
        request_tx.send(Request::hall(3, HallDirection::Up)).unwrap();

        let mut floors = Vec::new();
        let mut last_timestamp = None;
        loop {
            match event_rx.recv_timeout(Duration::from_secs(3)) {
                Ok(event) => {
                    if let Some(previous) = last_timestamp {
                        assert!(event.timestamp >= previous);
                    }
                    last_timestamp = Some(event.timestamp);
                    floors.push(event.floor);
                    if event.state == UnitState::DoorsOpen {
                        assert_eq!(event.floor, 3);
                        break;
                    }
                }
                Err(e) => panic!("lost the event stream: {:?}", e),
            }
        }

        // Assert
        assert!(floors.windows(2).all(|pair| pair[0] <= pair[1]));

        // Cleanup
        terminate_tx.send(()).unwrap();
        stopped_rx.recv_timeout(Duration::from_secs(3)).unwrap();
        fsm_thread.join().unwrap();
    }

    #[test]
    fn test_fsm_terminate_acknowledges() {
        // Purpose: Verify that a terminated worker acknowledges before exiting

        // Arrange
        let (fsm, _request_tx, terminate_tx, stopped_rx, _event_rx) = setup_fsm(1);
        let fsm_thread = spawn(move || fsm.run());

        // Act
        terminate_tx.send(()).unwrap();

        // Assert
        match stopped_rx.recv_timeout(Duration::from_secs(3)) {
            Ok(()) => {}
            Err(e) => panic!("worker never acknowledged terminate: {:?}", e),
        }
        fsm_thread.join().unwrap();
    }
}
