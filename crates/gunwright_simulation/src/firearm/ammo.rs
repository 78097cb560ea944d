//! Ammunition: loaded rounds + reload progress, и модификаторы типа патрона
//!
//! `AmmoStore` мутируется только двумя путями:
//! - выстрел (`consume`)
//! - reload protocol (`load`, `fill`, таймер)
//!
//! Инвариант: current ≤ capacity

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::attachment::MAX_MODIFIER;
use super::error::{ensure_in_range, FirearmResult};

/// Loaded-round count and reload progress of one weapon instance
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct AmmoStore {
    current: u32,
    capacity: u32,
    reloading: bool,
    /// Seconds since the current reload step started
    reload_elapsed: f64,
}

impl AmmoStore {
    /// `initial` обрезается до capacity
    pub fn new(capacity: u32, initial: u32) -> Self {
        Self {
            current: initial.min(capacity),
            capacity,
            reloading: false,
            reload_elapsed: 0.0,
        }
    }

    pub fn full(capacity: u32) -> Self {
        Self::new(capacity, capacity)
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn missing(&self) -> u32 {
        self.capacity - self.current
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn reload_elapsed(&self) -> f64 {
        self.reload_elapsed
    }

    /// Один патрон на выстрел
    pub fn consume(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Adds up to `rounds`, never past capacity. Returns rounds actually added.
    pub fn load(&mut self, rounds: u32) -> u32 {
        let added = rounds.min(self.missing());
        self.current += added;
        added
    }

    /// Fills to capacity, returns rounds added
    pub fn fill(&mut self) -> u32 {
        self.load(self.missing())
    }

    /// Idle → Reloading. False if already full or already reloading.
    pub fn begin_reload(&mut self) -> bool {
        if self.is_full() || self.reloading {
            return false;
        }
        self.reloading = true;
        self.reload_elapsed = 0.0;
        true
    }

    /// Reloading → Idle (протокол закончил)
    pub fn finish_reload(&mut self) {
        self.reloading = false;
        self.reload_elapsed = 0.0;
    }

    /// Reloading → Idle (внешняя отмена). Патроны не возвращаются и не теряются,
    /// прогресс текущего шага сбрасывается.
    pub fn interrupt_reload(&mut self) {
        self.reloading = false;
        self.reload_elapsed = 0.0;
    }

    /// Advances the step timer, returns elapsed seconds of the current step.
    /// Для reload protocols (включая `CustomReload` реализации).
    pub fn advance_timer(&mut self, dt: f64) -> f64 {
        self.reload_elapsed += dt;
        self.reload_elapsed
    }

    pub fn restart_timer(&mut self) {
        self.reload_elapsed = 0.0;
    }
}

/// Per-ammo-type modifiers (загруженный тип патрона)
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmoModifiers {
    pub name: String,
    pub spread_mod: f64,
    pub velocity_mod: f64,
    pub damage_mod: f64,
}

impl Default for AmmoModifiers {
    fn default() -> Self {
        Self {
            name: "standard".to_string(),
            spread_mod: 1.0,
            velocity_mod: 1.0,
            damage_mod: 1.0,
        }
    }
}

impl AmmoModifiers {
    /// Множители finite и в `0..=MAX_MODIFIER`
    pub fn validate(&self) -> FirearmResult<()> {
        ensure_in_range("spread_mod", self.spread_mod, 0.0, MAX_MODIFIER)?;
        ensure_in_range("velocity_mod", self.velocity_mod, 0.0, MAX_MODIFIER)?;
        ensure_in_range("damage_mod", self.damage_mod, 0.0, MAX_MODIFIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_clamped_to_capacity() {
        let ammo = AmmoStore::new(6, 10);
        assert_eq!(ammo.current(), 6);
        assert!(ammo.is_full());
    }

    #[test]
    fn test_consume_until_empty() {
        let mut ammo = AmmoStore::new(3, 2);
        assert!(ammo.consume());
        assert!(ammo.consume());
        assert!(!ammo.consume());
        assert_eq!(ammo.current(), 0);
    }

    #[test]
    fn test_load_never_exceeds_capacity() {
        let mut ammo = AmmoStore::new(10, 8);
        assert_eq!(ammo.load(5), 2);
        assert_eq!(ammo.current(), 10);
        assert_eq!(ammo.load(1), 0);
    }

    #[test]
    fn test_begin_reload_rules() {
        let mut full = AmmoStore::full(5);
        assert!(!full.begin_reload());

        let mut ammo = AmmoStore::new(5, 1);
        assert!(ammo.begin_reload());
        assert!(!ammo.begin_reload()); // уже перезаряжается
    }

    #[test]
    fn test_ammo_modifiers_must_be_finite() {
        assert!(AmmoModifiers::default().validate().is_ok());

        let infinite = AmmoModifiers {
            spread_mod: f64::INFINITY,
            ..AmmoModifiers::default()
        };
        assert!(infinite.validate().is_err());

        let nan = AmmoModifiers {
            velocity_mod: f64::NAN,
            ..AmmoModifiers::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_interrupt_resets_progress_keeps_rounds() {
        let mut ammo = AmmoStore::new(6, 2);
        ammo.begin_reload();
        ammo.advance_timer(0.4);
        ammo.load(1);

        ammo.interrupt_reload();
        assert!(!ammo.is_reloading());
        assert_eq!(ammo.reload_elapsed(), 0.0);
        assert_eq!(ammo.current(), 3);
    }
}
