//! Firearm events (host boundary)
//!
//! # Architecture
//!
//! **Intents (host → simulation):**
//! - `TriggerIntent` → нажатие/отпускание спуска
//! - `ReloadIntent` → начать перезарядку
//! - `CancelReloadIntent` → внешняя отмена (движение, смена оружия)
//! - `CycleFireModeIntent` → переключить селектор (SelectFire)
//!
//! **Results (simulation → host):**
//! - `ShotFired`: один выстрел (host спавнит projectiles по `directions`)
//! - `FireRejected`: нажатие не дало выстрела (typed reason)
//! - `ReloadStarted` / `RoundsLoaded` / `ReloadCompleted` / `ReloadInterrupted`
//! - `FireModeChanged`

use bevy::math::DVec3;
use bevy::prelude::*;

use super::outcome::FailureReason;
use super::spread::Recoil;
use super::stats::FireMode;

// ============================================================================
// Intents
// ============================================================================

/// Trigger pressed (`pressed = true`) or released
///
/// Press → один volley сразу. Пока held, FullAuto продолжает стрелять каждый тик.
#[derive(Event, Clone, Debug)]
pub struct TriggerIntent {
    pub shooter: Entity,
    pub pressed: bool,
}

#[derive(Event, Clone, Debug)]
pub struct ReloadIntent {
    pub shooter: Entity,
}

/// Why a reload is being cancelled from outside
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub enum InterruptCause {
    /// Sprint/jump (см. `SimulationConfig::interrupt_reload_on_sprint`)
    Movement,
    WeaponSwitch,
    Cancelled,
    /// Выстрел во время InternalSingle/InternalClip reload
    Fired,
}

#[derive(Event, Clone, Debug)]
pub struct CancelReloadIntent {
    pub shooter: Entity,
    pub cause: InterruptCause,
}

#[derive(Event, Clone, Debug)]
pub struct CycleFireModeIntent {
    pub shooter: Entity,
}

// ============================================================================
// Results
// ============================================================================

/// One successful shot
#[derive(Event, Clone, Debug)]
pub struct ShotFired {
    pub shooter: Entity,
    /// Sub-tick timestamp (ms)
    pub at_ms: f64,
    pub recoil: Recoil,
    /// Effective spread (degrees)
    pub spread: f64,
    /// Unit direction per projectile (`projectile_count` штук)
    pub directions: Vec<DVec3>,
    /// Muzzle velocity × ammo velocity mod (m/s)
    pub velocity: f64,
    /// Ammo damage mod × attachment damage multipliers
    pub damage_multiplier: f64,
    pub noise_multiplier: f64,
    /// Rounds left after this shot
    pub ammo_left: u32,
}

#[derive(Event, Clone, Debug)]
pub struct FireRejected {
    pub shooter: Entity,
    pub reason: FailureReason,
    pub at_ms: f64,
}

#[derive(Event, Clone, Debug)]
pub struct ReloadStarted {
    pub shooter: Entity,
    pub current: u32,
    pub capacity: u32,
}

/// A reload step loaded rounds (clip/single protocols), reload continues
#[derive(Event, Clone, Debug)]
pub struct RoundsLoaded {
    pub shooter: Entity,
    pub rounds: u32,
    pub current: u32,
}

#[derive(Event, Clone, Debug)]
pub struct ReloadCompleted {
    pub shooter: Entity,
    pub current: u32,
}

#[derive(Event, Clone, Debug)]
pub struct ReloadInterrupted {
    pub shooter: Entity,
    pub cause: InterruptCause,
    /// Патроны, заряженные до отмены (не теряются)
    pub current: u32,
}

#[derive(Event, Clone, Debug)]
pub struct FireModeChanged {
    pub shooter: Entity,
    pub mode: FireMode,
}
