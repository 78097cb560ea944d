//! Reload protocols
//!
//! Mutually exclusive стратегии перезарядки, выбираются по `ReloadMethod`
//! из definition:
//! - `Magazine`: один timed action, потом сразу full
//! - `InternalClip`: каждые `reload_time` секунд + min(clip_size, missing)
//! - `InternalSingle`: каждые `reload_time` секунд +1 патрон
//! - `Custom`: extension point, реализуется через `CustomReload`
//!
//! State machine: Idle → Reloading → (step)* → Idle, или Reloading → Idle
//! при внешнем interrupt. Никаких scheduled callbacks: прогресс двигается
//! только через `advance(dt)` из тика владельца.

use std::fmt;

use super::ammo::AmmoStore;
use super::error::{FirearmError, FirearmResult};
use super::stats::{ReloadMethod, WeaponStats};

/// What a single `advance` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadProgress {
    /// Not reloading
    Idle,
    /// Timer running, nothing loaded this tick
    InProgress,
    /// A step loaded rounds, reload continues
    Loaded { rounds: u32 },
    /// Reload finished (rounds loaded by the final step)
    Completed { rounds: u32 },
}

/// User-supplied reload protocol (muzzle loaders, belt feeds, ...)
///
/// `advance` вызывается каждый тик, пока `ammo.is_reloading()`.
/// Реализация сама решает, когда вызвать `ammo.finish_reload()`.
pub trait CustomReload: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn advance(&mut self, ammo: &mut AmmoStore, reload_time: f64, dt: f64) -> ReloadProgress;

    /// Called when a reload starts
    fn on_start(&mut self) {}

    /// Called when the reload is interrupted externally
    fn on_interrupt(&mut self) {}
}

/// Active reload strategy of a weapon instance
pub enum ReloadProtocol {
    Magazine,
    InternalClip { clip_size: u32 },
    InternalSingle,
    Custom(Box<dyn CustomReload>),
}

impl fmt::Debug for ReloadProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Magazine => write!(f, "Magazine"),
            Self::InternalClip { clip_size } => write!(f, "InternalClip {{ clip_size: {} }}", clip_size),
            Self::InternalSingle => write!(f, "InternalSingle"),
            Self::Custom(custom) => write!(f, "Custom({})", custom.name()),
        }
    }
}

impl ReloadProtocol {
    /// Protocol for a definition. `ReloadMethod::Other` has no built-in
    /// implementation and fails here, at construction time.
    pub fn for_stats(stats: &WeaponStats) -> FirearmResult<Self> {
        match stats.reload_method {
            ReloadMethod::Magazine => Ok(Self::Magazine),
            ReloadMethod::InternalClip => Ok(Self::InternalClip {
                clip_size: stats.clip_size,
            }),
            ReloadMethod::InternalSingle => Ok(Self::InternalSingle),
            ReloadMethod::Other => Err(FirearmError::UnimplementedReload {
                weapon: stats.name.clone(),
            }),
        }
    }

    pub fn custom(reload: impl CustomReload) -> Self {
        Self::Custom(Box::new(reload))
    }

    /// Можно ли прервать перезарядку выстрелом (если есть хоть один патрон)
    pub fn allows_fire_interrupt(&self) -> bool {
        matches!(self, Self::InternalSingle | Self::InternalClip { .. })
    }

    pub fn start(&mut self, ammo: &mut AmmoStore) -> bool {
        if !ammo.begin_reload() {
            return false;
        }
        if let Self::Custom(custom) = self {
            custom.on_start();
        }
        true
    }

    pub fn interrupt(&mut self, ammo: &mut AmmoStore) {
        if !ammo.is_reloading() {
            return;
        }
        ammo.interrupt_reload();
        if let Self::Custom(custom) = self {
            custom.on_interrupt();
        }
    }

    /// Advance the active reload by `dt` seconds
    pub fn advance(&mut self, ammo: &mut AmmoStore, reload_time: f64, dt: f64) -> ReloadProgress {
        if !ammo.is_reloading() {
            return ReloadProgress::Idle;
        }

        match self {
            Self::Magazine => {
                if ammo.advance_timer(dt) < reload_time {
                    return ReloadProgress::InProgress;
                }
                let rounds = ammo.fill();
                ammo.finish_reload();
                ReloadProgress::Completed { rounds }
            }
            Self::InternalClip { clip_size } => step_reload(ammo, reload_time, dt, *clip_size),
            Self::InternalSingle => step_reload(ammo, reload_time, dt, 1),
            Self::Custom(custom) => custom.advance(ammo, reload_time, dt),
        }
    }
}

/// Общий шаг для clip/single: один шаг за вызов, overshoot отбрасывается
fn step_reload(ammo: &mut AmmoStore, reload_time: f64, dt: f64, per_step: u32) -> ReloadProgress {
    if ammo.advance_timer(dt) < reload_time {
        return ReloadProgress::InProgress;
    }

    let rounds = ammo.load(per_step);
    ammo.restart_timer();

    if ammo.is_full() {
        ammo.finish_reload();
        ReloadProgress::Completed { rounds }
    } else {
        ReloadProgress::Loaded { rounds }
    }
}
