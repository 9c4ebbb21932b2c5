use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::fsrs::DEFAULT_TARGET_RETENTION;
use crate::simulation::{SimulationOptions, DEFAULT_ITERATIONS, DEFAULT_PARALLEL_THRESHOLD};

pub const DEFAULT_SICK_MULTIPLIER: f64 = 0.5;
pub const DEFAULT_HOLIDAY_MULTIPLIER: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub target_retention: f64,
    pub simulation_iterations: usize,
    pub parallel_threshold: usize,
    pub simulation_seed: Option<u64>,
    pub sick_multiplier: f64,
    pub holiday_multiplier: f64,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_retention: DEFAULT_TARGET_RETENTION,
            simulation_iterations: DEFAULT_ITERATIONS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            simulation_seed: None,
            sick_multiplier: DEFAULT_SICK_MULTIPLIER,
            holiday_multiplier: DEFAULT_HOLIDAY_MULTIPLIER,
            log_level: "info".to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let simulation_seed = std::env::var("STUDY_SIM_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());

        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        Self {
            target_retention: env_or("STUDY_TARGET_RETENTION", defaults.target_retention),
            simulation_iterations: env_or("STUDY_SIM_ITERATIONS", defaults.simulation_iterations),
            parallel_threshold: env_or("STUDY_PARALLEL_THRESHOLD", defaults.parallel_threshold),
            simulation_seed,
            sick_multiplier: env_or("STUDY_SICK_MULTIPLIER", defaults.sick_multiplier),
            holiday_multiplier: env_or("STUDY_HOLIDAY_MULTIPLIER", defaults.holiday_multiplier),
            log_level,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.target_retention > 0.0 && self.target_retention < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "targetRetention must be in (0, 1), got {}",
                self.target_retention
            )));
        }
        if self.simulation_iterations == 0 {
            return Err(EngineError::InvalidConfig(
                "simulationIterations must be positive".to_string(),
            ));
        }
        if self.parallel_threshold == 0 {
            return Err(EngineError::InvalidConfig(
                "parallelThreshold must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("sickMultiplier", self.sick_multiplier),
            ("holidayMultiplier", self.holiday_multiplier),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Simulator options, with an explicit seed overriding the configured one
    pub fn simulation_options(&self, seed: Option<u64>) -> SimulationOptions {
        SimulationOptions {
            iterations: Some(self.simulation_iterations),
            parallel_threshold: Some(self.parallel_threshold),
            seed: seed.or(self.simulation_seed),
        }
    }
}
