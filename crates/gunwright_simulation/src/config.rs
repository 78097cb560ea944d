//! Runtime configuration of the simulation
//!
//! `SimulationConfig`: Bevy resource, читается `FirearmSimulationPlugin` при build:
//! - `tick_rate_hz` → `Time::<Fixed>::from_hz` + per-tick shot budget
//! - `seed` → `DeterministicRng`
//! - `log_level` → глобальный logger
//!
//! Serde с `#[serde(default)]`: host может задать только нужные поля
//! (формат файла выбирает host).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::firearm::CooldownGating;
use crate::logger::LogLevel;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed для `DeterministicRng`
    pub seed: u64,

    /// FixedUpdate rate (Hz)
    pub tick_rate_hz: f64,

    /// Default cooldown gating для новых оружий
    pub gating: CooldownGating,

    /// Running/jumping stance прерывает перезарядку
    pub interrupt_reload_on_sprint: bool,

    /// Per-shot логирование (recoil, spread, directions)
    pub debug_mode: bool,

    pub log_level: LogLevel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 60.0,
            gating: CooldownGating::TickBudget,
            interrupt_reload_on_sprint: true,
            debug_mode: false,
            log_level: LogLevel::Info,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.gating, CooldownGating::TickBudget);
        assert!(config.interrupt_reload_on_sprint);
        assert!(!config.debug_mode);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "seed": 7, "gating": "WallClock", "debug_mode": true }"#).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.gating, CooldownGating::WallClock);
        assert!(config.debug_mode);
        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.log_level, LogLevel::Info);
    }
}
