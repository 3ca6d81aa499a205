/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub pool: PoolConfig,
    pub timing: TimingConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PoolConfig {
    pub n_units: u32,
    pub min_floor: i32,
    pub max_floor: i32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pool: PoolConfig {
                n_units: 2,
                min_floor: 1,
                max_floor: 10,
            },
            timing: TimingConfig {
                tick_interval_ms: 100,
                shutdown_grace_ms: 1000,
            },
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    Ok(toml::from_str(&config_str)?)
}

/***************************************/
/*             Unit tests              */
/***************************************/
