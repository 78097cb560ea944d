//! Barrel heat model
//!
//! - Каждый выстрел добавляет `heat_per_shot`
//! - Выстрел, который довёл heat до `heat_max`, сам отклоняется (Overheated)
//! - Остывание начинается только после `cool_off_delay_ms` простоя
//! - `broken`: перманентно, пока host не вызовет `repair()`
//!
//! Инвариант: 0 ≤ heat ≤ heat_max

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ensure_in_range, FirearmResult};

/// Heat parameters of a barrel attachment.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatStats {
    /// Без этого флага heat не копится (barrel только для модификаторов и jam)
    pub overheat_enabled: bool,
    pub heat_max: f64,
    pub heat_per_shot: f64,
    /// Heat units per second
    pub cool_off_speed: f64,
    /// Idle time before cooling starts (ms)
    pub cool_off_delay_ms: f64,
}

impl Default for HeatStats {
    fn default() -> Self {
        Self {
            overheat_enabled: false,
            heat_max: 100.0,
            heat_per_shot: 10.0,
            cool_off_speed: 5.0,
            cool_off_delay_ms: 500.0,
        }
    }
}

impl HeatStats {
    pub fn validate(&self) -> FirearmResult<()> {
        ensure_in_range("heat_max", self.heat_max, f64::MIN_POSITIVE, f64::MAX)?;
        ensure_in_range("heat_per_shot", self.heat_per_shot, 0.0, f64::MAX)?;
        ensure_in_range("cool_off_speed", self.cool_off_speed, 0.0, f64::MAX)?;
        ensure_in_range("cool_off_delay_ms", self.cool_off_delay_ms, 0.0, f64::MAX)
    }

    /// Default numbers with overheat tracking switched on
    pub fn tracked() -> Self {
        Self {
            overheat_enabled: true,
            ..Self::default()
        }
    }
}

/// Runtime heat state of one barrel
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct HeatModel {
    stats: HeatStats,
    heat: f64,
    last_shot_ms: Option<f64>,
    broken: bool,
}

impl HeatModel {
    pub fn new(stats: HeatStats) -> Self {
        Self {
            stats,
            heat: 0.0,
            last_shot_ms: None,
            broken: false,
        }
    }

    pub fn stats(&self) -> &HeatStats {
        &self.stats
    }

    /// Registers a shot. Returns false when the barrel is broken or this shot
    /// pushed heat to the limit.
    pub fn on_shoot(&mut self, now_ms: f64) -> bool {
        if self.broken {
            return false;
        }

        self.last_shot_ms = Some(now_ms);

        if self.stats.overheat_enabled {
            self.heat += self.stats.heat_per_shot;

            if self.heat >= self.stats.heat_max {
                self.heat = self.stats.heat_max;
                return false;
            }
        }

        true
    }

    /// Остывание за тик (`dt` в секундах)
    pub fn update_cooling(&mut self, now_ms: f64, dt: f64) {
        if !self.stats.overheat_enabled || self.heat <= 0.0 {
            return;
        }

        // Пока ствол не простоял delay: не остываем
        let since_shot = self.last_shot_ms.map(|last| now_ms - last).unwrap_or(f64::INFINITY);
        if since_shot < self.stats.cool_off_delay_ms {
            return;
        }

        self.heat = (self.heat - self.stats.cool_off_speed * dt).max(0.0);
    }

    pub fn heat(&self) -> f64 {
        self.heat
    }

    /// 0.0..=1.0, для HUD host'а
    pub fn heat_percentage(&self) -> f64 {
        if self.stats.heat_max <= 0.0 {
            return 0.0;
        }
        self.heat / self.stats.heat_max
    }

    /// At the limit: the next `on_shoot` will be rejected
    pub fn is_overheated(&self) -> bool {
        self.stats.overheat_enabled && self.heat >= self.stats.heat_max
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Jam: barrel stays broken until repaired
    pub fn jam(&mut self) {
        self.broken = true;
    }

    /// External repair action (вызывается host'ом, core никогда)
    pub fn repair(&mut self) {
        self.broken = false;
    }
}
