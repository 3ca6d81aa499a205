use crate::config::Config;
use crate::dispatch::selector::{NearestUnitSelector, UnitSelector};
use crate::notify::NotificationHub;
use crate::shared::{
    CallError, Direction, HallCallOutcome, HallDirection, Request, UnitId, UnitSnapshot, UnitState,
};
use crate::unit::UnitFsm;
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};
use std::time::{Duration, Instant};

struct UnitHandle {
    request_tx: cbc::Sender<Request>,
    terminate_tx: cbc::Sender<()>,
    stopped_rx: cbc::Receiver<()>,
    status: Arc<RwLock<UnitSnapshot>>,
}

/**
 * Routes calls to a pool of unit workers.
 *
 * The dispatcher owns one worker thread per unit. Hall calls are matched
 * to a unit by the configured `UnitSelector` over a snapshot of the whole
 * pool; car calls go straight to the named unit. Every state change flows
 * through the owned `NotificationHub`.
 *
 * # Fields
 * - `units`:          Per-unit channels and shared status snapshots, by id.
 * - `workers`:        State machines built but not yet running, consumed by `start`.
 * - `threads`:        Join handles of the running workers.
 * - `hub`:            Broadcasts unit state changes to subscribed observers.
 * - `selector`:       Strategy deciding which unit answers a hall call.
 * - `min_floor`:      Lowest serviced floor.
 * - `max_floor`:      Highest serviced floor.
 * - `shutdown_grace`: How long `shutdown` waits for the workers to confirm.
 * - `started`:        Set once `start` has spawned the workers.
 * - `shut_down`:      Set once `shutdown` has run; calls are refused from then on.
 */
pub struct Dispatcher {
    units: BTreeMap<UnitId, UnitHandle>,
    workers: Vec<UnitFsm>,
    threads: Vec<(UnitId, JoinHandle<()>)>,
    hub: NotificationHub,
    selector: Box<dyn UnitSelector>,
    min_floor: i32,
    max_floor: i32,
    shutdown_grace: Duration,
    started: bool,
    shut_down: bool,
}

impl Dispatcher {
    /// Builds the pool with the default nearest-unit strategy. Units start
    /// idle at the lowest serviced floor; nothing runs until [`start`].
    ///
    /// [`start`]: Dispatcher::start
    pub fn new(config: &Config) -> Dispatcher {
        Dispatcher::with_selector(config, Box::new(NearestUnitSelector))
    }

    pub fn with_selector(config: &Config, selector: Box<dyn UnitSelector>) -> Dispatcher {
        let hub = NotificationHub::new();
        let mut units = BTreeMap::new();
        let mut workers = Vec::new();

        for id in 1..=config.pool.n_units {
            let (request_tx, request_rx) = cbc::unbounded::<Request>();
            let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();
            let (stopped_tx, stopped_rx) = cbc::unbounded::<()>();

            let status = Arc::new(RwLock::new(UnitSnapshot {
                id,
                floor: config.pool.min_floor,
                direction: Direction::Idle,
                state: UnitState::Idle,
            }));

            workers.push(UnitFsm::new(
                id,
                config.pool.min_floor,
                config.timing.tick_interval(),
                request_rx,
                terminate_rx,
                stopped_tx,
                hub.emitter(),
                Arc::clone(&status),
            ));
            units.insert(
                id,
                UnitHandle {
                    request_tx,
                    terminate_tx,
                    stopped_rx,
                    status,
                },
            );
        }

        Dispatcher {
            units,
            workers,
            threads: Vec::new(),
            hub,
            selector,
            min_floor: config.pool.min_floor,
            max_floor: config.pool.max_floor,
            shutdown_grace: config.timing.shutdown_grace(),
            started: false,
            shut_down: false,
        }
    }

    /// The hub observers subscribe to for unit state changes.
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Spawns one worker thread per unit. Calling it again, or after
    /// [`shutdown`], does nothing.
    ///
    /// [`shutdown`]: Dispatcher::shutdown
    pub fn start(&mut self) {
        if self.shut_down {
            warn!("dispatcher: start after shutdown ignored");
            return;
        }
        if self.started {
            warn!("dispatcher: already started");
            return;
        }
        self.started = true;

        self.hub.start();
        for fsm in self.workers.drain(..) {
            let id = fsm.id();
            let unit_thread = Builder::new().name(format!("unit_{}", id));
            let handle = unit_thread.spawn(move || fsm.run()).unwrap();
            self.threads.push((id, handle));
        }
        info!("dispatcher: started {} units", self.units.len());
    }

    /// Submits a hall call placed at `floor` in `direction`. Picks a unit
    /// with the selection strategy; a call no unit can take right now is
    /// reported back as [`HallCallOutcome::NoUnitAvailable`].
    pub fn request_hall_call(
        &self,
        floor: i32,
        direction: HallDirection,
    ) -> Result<HallCallOutcome, CallError> {
        self.ensure_accepting()?;
        self.check_floor(floor)?;

        let request = Request::hall(floor, direction);
        let pool = self.pool_snapshot();
        let id = match self.selector.select(&pool, &request) {
            Some(id) => id,
            None => {
                info!("hall call {} {}: no unit available", floor, request.direction);
                return Ok(HallCallOutcome::NoUnitAvailable);
            }
        };

        let handle = self
            .units
            .get(&id)
            .expect("selector returned an id not in the pool");
        if handle.request_tx.send(request).is_err() {
            warn!("hall call {} {}: unit {} is gone", floor, request.direction, id);
            return Err(CallError::ShutDown);
        }
        info!("hall call {} {}: assigned to unit {}", floor, request.direction, id);
        Ok(HallCallOutcome::Assigned(id))
    }

    /// Submits a car call made inside `unit_id` for `floor`.
    pub fn request_car_call(&self, unit_id: UnitId, floor: i32) -> Result<(), CallError> {
        self.ensure_accepting()?;
        self.check_floor(floor)?;

        let handle = self
            .units
            .get(&unit_id)
            .ok_or(CallError::UnknownUnit(unit_id))?;
        if handle.request_tx.send(Request::car(floor)).is_err() {
            warn!("car call unit {} -> {}: unit is gone", unit_id, floor);
            return Err(CallError::ShutDown);
        }
        info!("car call unit {} -> floor {}", unit_id, floor);
        Ok(())
    }

    /// Stops every worker and the hub. Waits up to the configured grace
    /// period for the workers to confirm; stragglers are detached and
    /// logged. Further calls are refused with [`CallError::ShutDown`].
    /// Calling this twice does nothing the second time.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            debug!("dispatcher: shutdown already done");
            return;
        }
        self.shut_down = true;
        self.workers.clear();

        if !self.started {
            // Never ran, only observer delivery threads may exist
            self.hub.stop();
            info!("dispatcher: shut down before start");
            return;
        }

        info!("dispatcher: shutting down");
        for (id, handle) in &self.units {
            if handle.terminate_tx.send(()).is_err() {
                debug!("unit {}: already stopped", id);
            }
        }

        let deadline = Instant::now() + self.shutdown_grace;
        for (id, thread) in self.threads.drain(..) {
            let handle = &self.units[&id];
            let remaining = deadline.saturating_duration_since(Instant::now());
            match handle.stopped_rx.recv_timeout(remaining) {
                Ok(()) => {
                    let _ = thread.join();
                }
                Err(cbc::RecvTimeoutError::Disconnected) => {
                    warn!("unit {}: worker exited without confirming", id);
                    let _ = thread.join();
                }
                Err(cbc::RecvTimeoutError::Timeout) => {
                    warn!("unit {}: no confirmation within the grace period, detaching", id);
                    drop(thread);
                }
            }
        }

        self.hub.stop();
        info!("dispatcher: stopped");
    }

    fn ensure_accepting(&self) -> Result<(), CallError> {
        if self.shut_down {
            return Err(CallError::ShutDown);
        }
        Ok(())
    }

    fn check_floor(&self, floor: i32) -> Result<(), CallError> {
        if floor < self.min_floor || floor > self.max_floor {
            return Err(CallError::FloorOutOfRange {
                floor,
                min: self.min_floor,
                max: self.max_floor,
            });
        }
        Ok(())
    }

    /// Current view of every unit, in ascending id order.
    fn pool_snapshot(&self) -> Vec<UnitSnapshot> {
        self.units.values().map(|handle| *handle.status.read()).collect()
    }
}

#[cfg(test)]
impl Dispatcher {
    pub fn test_set_snapshot(&self, unit_id: UnitId, snapshot: UnitSnapshot) {
        *self.units[&unit_id].status.write() = snapshot;
    }

    pub fn test_snapshot(&self, unit_id: UnitId) -> UnitSnapshot {
        *self.units[&unit_id].status.read()
    }

    pub fn test_running_workers(&self) -> usize {
        self.threads.len()
    }

    pub fn test_pending_workers(&self) -> usize {
        self.workers.len()
    }
}
