/*
 * liftsim: a multi-unit elevator dispatch simulator.
 *
 * A `Dispatcher` owns a pool of unit workers, each running its own state
 * machine on a dedicated thread. Hall calls are matched to a unit by a
 * pluggable selection strategy; car calls go straight to the named unit.
 * Observers subscribe to the dispatcher's notification hub and receive
 * every unit state change on their own delivery thread.
 */

/* Modules */
pub mod config;
pub mod dispatch;
pub mod notify;
pub mod shared;
pub mod unit;

/* Re-exports */
pub use config::load_config;
pub use config::Config;
pub use config::ConfigError;
pub use config::PoolConfig;
pub use config::TimingConfig;
pub use dispatch::Dispatcher;
pub use dispatch::NearestUnitSelector;
pub use dispatch::UnitSelector;
pub use notify::NotificationHub;
pub use notify::SubscriptionToken;
pub use notify::UnitObserver;
pub use shared::CallError;
pub use shared::Direction;
pub use shared::HallCallOutcome;
pub use shared::HallDirection;
pub use shared::Request;
pub use shared::RequestOrigin;
pub use shared::StateEvent;
pub use shared::UnitId;
pub use shared::UnitSnapshot;
pub use shared::UnitState;
pub use unit::RequestQueue;
pub use unit::UnitFsm;
