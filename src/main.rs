/* 3rd party libraries */
use clap::{Arg, Command};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

/* Custom libraries */
use liftsim::unwrap_or_exit;
use liftsim::{
    load_config, Config, Dispatcher, HallCallOutcome, HallDirection, StateEvent, UnitId,
    UnitObserver,
};

/* Observers */
/// Stands in for the lobby display panel: one line per state change.
struct ConsoleDisplay;

impl UnitObserver for ConsoleDisplay {
    fn on_event(&self, event: &StateEvent) {
        println!(
            "unit {} | floor {:>3} | {}",
            event.unit_id, event.floor, event.state
        );
    }
}

/* Helpers */
fn place_hall_call(dispatcher: &Dispatcher, floor: i32, direction: HallDirection) {
    println!("\nhall call: floor {} going {}", floor, direction);
    match unwrap_or_exit!(dispatcher.request_hall_call(floor, direction)) {
        HallCallOutcome::Assigned(unit) => println!("  -> assigned to unit {}", unit),
        HallCallOutcome::NoUnitAvailable => println!("  -> no unit available, try again later"),
    }
}

fn place_car_call(dispatcher: &Dispatcher, unit: UnitId, floor: i32) {
    println!("\ncar call: unit {} to floor {}", unit, floor);
    unwrap_or_exit!(dispatcher.request_car_call(unit, floor));
}

/* Main */
fn main() {
    env_logger::init();

    let matches = Command::new("liftsim")
        .about("Multi-unit elevator dispatch simulator")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("run-for-ms")
                .long("run-for-ms")
                .takes_value(true)
                .default_value("4000")
                .help("How long to let the scenario play out before shutdown"),
        )
        .get_matches();

    let config_path = Path::new(matches.value_of("config").unwrap());
    let run_for_ms: u64 =
        unwrap_or_exit!(matches.value_of("run-for-ms").unwrap().parse(), "run-for-ms");

    // Load the configuration, falling back to defaults when there is none
    let config = if config_path.exists() {
        unwrap_or_exit!(load_config(config_path))
    } else {
        warn!(
            "no configuration file at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    // Wire up the pool and the display
    let mut dispatcher = Dispatcher::new(&config);
    dispatcher.hub().subscribe(Arc::new(ConsoleDisplay));
    dispatcher.start();
    info!("simulation started");

    // Reference scenario: two hall calls, one car call in each unit
    place_hall_call(&dispatcher, 5, HallDirection::Up);
    sleep(Duration::from_millis(100));

    place_car_call(&dispatcher, 1, 10);
    sleep(Duration::from_millis(100));

    place_hall_call(&dispatcher, 3, HallDirection::Down);
    sleep(Duration::from_millis(100));

    place_car_call(&dispatcher, 2, 1);

    // Let the journeys play out, then wind down
    sleep(Duration::from_millis(run_for_ms));
    dispatcher.shutdown();
    println!("\n--- simulation end ---");
}
