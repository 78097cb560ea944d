//! Weapon definition stats (immutable per weapon definition)
//!
//! Architecture Decision:
//! - `WeaponStats` = чистые данные определения оружия, не меняются в runtime
//! - Runtime state (ammo, heat, cooldown) живёт в `WeaponStateMachine`
//! - `validate()` вызывается при создании оружия (fail fast at load time,
//!   никогда не во время `trigger()`)
//!
//! Serde:
//! - `#[serde(default)]`: host loader может задать только нужные поля,
//!   остальное берётся из pistol preset
//! - Формат файла (JSON/RON/archive) выбирает host, не этот crate

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ensure_in_range, FirearmError, FirearmResult};

/// Верхние границы для `validate()`
pub const MAX_SPREAD_DEGREES: f64 = 180.0;
pub const MAX_RECOIL: f64 = 1.0e6;
pub const MAX_VELOCITY: f64 = 1.0e6;

/// Stats одного определения оружия
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Display name (используется в логах и ошибках)
    pub name: String,

    /// Rate of fire (rounds per minute)
    pub rpm: f64,

    /// Projectiles per shot (pellets для дробовика)
    pub projectile_count: u32,

    /// Muzzle velocity (m/s), host spawns projectiles with it
    pub projectile_velocity: f64,

    /// Base spread (degrees)
    pub spread_base: f64,

    /// Spread addend while running/jumping (degrees)
    pub movement_penalty: f64,

    /// Misfire probability per shot (0..=1)
    pub misfire_chance: f64,

    /// Jam probability per shot (0..=1), breaks the barrel
    pub jam_chance: f64,

    /// Vertical recoil per shot
    pub vertical_recoil: f64,

    /// Horizontal recoil magnitude (randomized in ±value)
    pub horizontal_recoil: f64,

    /// Loaded rounds capacity
    pub capacity: u32,

    /// Reload duration (seconds): per step for clip/single protocols
    pub reload_time: f64,

    /// Reload protocol tag
    pub reload_method: ReloadMethod,

    /// Rounds per step for `ReloadMethod::InternalClip`
    pub clip_size: u32,

    /// Fire mode tag
    pub fire_mode: FireMode,

    /// Shots per trigger pull in `FireMode::Burst`
    pub burst_count: u32,

    // === Descriptive tags (не влияют на механику) ===
    pub firearm_class: FirearmClass,
    pub firearm_type: FirearmType,

    /// Accepted ammunition ids
    pub ammo_names: Vec<String>,

    /// Disabled weapons refuse every trigger pull
    pub disabled: bool,
}

/// Reload protocol tag (см. `reload.rs`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum ReloadMethod {
    /// Replace the magazine: one timed action → full
    #[default]
    Magazine,
    /// Stripper clip: each step loads up to `clip_size`
    InternalClip,
    /// One round per step (revolvers, tube-fed shotguns)
    InternalSingle,
    /// Requires a `CustomReload` implementation at construction
    Other,
}

/// Fire mode tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum FireMode {
    #[default]
    SemiAuto,
    Burst,
    FullAuto,
    /// Bolt/lever/pump: один выстрел на нажатие
    Manual,
    /// Selector switch: SemiAuto / Burst / FullAuto
    SelectFire,
}

impl FireMode {
    /// Следующая позиция селектора (только для select-fire оружия)
    pub fn next_selector_position(self) -> Self {
        match self {
            FireMode::SemiAuto => FireMode::Burst,
            FireMode::Burst => FireMode::FullAuto,
            FireMode::FullAuto => FireMode::SemiAuto,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum FirearmClass {
    PreGunpowder,
    EarlyGunpowder,
    Matchlock,
    Wheellock,
    Flintlock,
    PercussionCap,
    #[default]
    Modern,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum FirearmType {
    #[default]
    Handgun,
    Revolver,
    MachinePistol,
    SubmachineGun,
    Shotgun,
    LongGun,
    AutomaticRifle,
    LightMachineGun,
    GpMachineGun,
    BattleRifle,
    AssaultRifle,
    MarksmanRifle,
    SniperRifle,
    RocketLauncher,
    GrenadeLauncher,
    Other,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self::pistol()
    }
}

impl WeaponStats {
    /// Semi-auto pistol, magazine fed
    pub fn pistol() -> Self {
        Self {
            name: "Service Pistol".to_string(),
            rpm: 400.0,
            projectile_count: 1,
            projectile_velocity: 380.0,
            spread_base: 1.5,
            movement_penalty: 1.0,
            misfire_chance: 0.0,
            jam_chance: 0.0,
            vertical_recoil: 1.8,
            horizontal_recoil: 0.6,
            capacity: 15,
            reload_time: 1.5,
            reload_method: ReloadMethod::Magazine,
            clip_size: 0,
            fire_mode: FireMode::SemiAuto,
            burst_count: 1,
            firearm_class: FirearmClass::Modern,
            firearm_type: FirearmType::Handgun,
            ammo_names: vec!["9mm".to_string()],
            disabled: false,
        }
    }

    /// Select-fire assault rifle (30-round magazine)
    pub fn assault_rifle() -> Self {
        Self {
            name: "Assault Rifle".to_string(),
            rpm: 750.0,
            projectile_velocity: 880.0,
            spread_base: 2.0,
            movement_penalty: 1.0,
            vertical_recoil: 2.2,
            horizontal_recoil: 1.2,
            capacity: 30,
            reload_time: 2.3,
            fire_mode: FireMode::SelectFire,
            burst_count: 3,
            firearm_type: FirearmType::AssaultRifle,
            ammo_names: vec!["5.56mm".to_string()],
            ..Self::pistol()
        }
    }

    /// Six-shot revolver, loads one round per step
    pub fn revolver() -> Self {
        Self {
            name: "Revolver".to_string(),
            rpm: 120.0,
            projectile_velocity: 420.0,
            spread_base: 1.0,
            movement_penalty: 1.5,
            vertical_recoil: 4.0,
            horizontal_recoil: 1.0,
            capacity: 6,
            reload_time: 0.75,
            reload_method: ReloadMethod::InternalSingle,
            fire_mode: FireMode::Manual,
            firearm_type: FirearmType::Revolver,
            ammo_names: vec![".357".to_string()],
            ..Self::pistol()
        }
    }

    /// Bolt-action rifle fed by 5-round stripper clips
    pub fn bolt_rifle() -> Self {
        Self {
            name: "Bolt-Action Rifle".to_string(),
            rpm: 50.0,
            projectile_velocity: 820.0,
            spread_base: 0.3,
            movement_penalty: 3.0,
            vertical_recoil: 6.0,
            horizontal_recoil: 1.5,
            capacity: 10,
            reload_time: 2.0,
            reload_method: ReloadMethod::InternalClip,
            clip_size: 5,
            fire_mode: FireMode::Manual,
            firearm_type: FirearmType::LongGun,
            ammo_names: vec!["7.92mm".to_string()],
            ..Self::pistol()
        }
    }

    /// Pump shotgun, tube magazine (one shell per step)
    pub fn shotgun() -> Self {
        Self {
            name: "Pump Shotgun".to_string(),
            rpm: 70.0,
            projectile_count: 9,
            projectile_velocity: 350.0,
            spread_base: 4.0,
            movement_penalty: 1.0,
            vertical_recoil: 5.0,
            horizontal_recoil: 2.0,
            capacity: 8,
            reload_time: 0.5,
            reload_method: ReloadMethod::InternalSingle,
            fire_mode: FireMode::Manual,
            firearm_type: FirearmType::Shotgun,
            ammo_names: vec!["12ga".to_string()],
            ..Self::pistol()
        }
    }

    /// Rotary machine gun: rpm выше tick rate, стреляет несколько раз за тик
    pub fn minigun() -> Self {
        Self {
            name: "Rotary Gun".to_string(),
            rpm: 3600.0,
            projectile_velocity: 850.0,
            spread_base: 3.0,
            movement_penalty: 2.0,
            jam_chance: 0.0,
            vertical_recoil: 0.4,
            horizontal_recoil: 0.8,
            capacity: 200,
            reload_time: 6.0,
            fire_mode: FireMode::FullAuto,
            firearm_type: FirearmType::GpMachineGun,
            ammo_names: vec!["7.62mm".to_string()],
            ..Self::pistol()
        }
    }

    /// Проверка предусловий (fail fast at load time)
    pub fn validate(&self) -> FirearmResult<()> {
        if !self.rpm.is_finite() || self.rpm <= 0.0 {
            return Err(FirearmError::invalid("rpm", format!("must be > 0 (got {})", self.rpm)));
        }
        if self.capacity == 0 {
            return Err(FirearmError::invalid("capacity", "must be > 0"));
        }
        if self.projectile_count == 0 {
            return Err(FirearmError::invalid("projectile_count", "must be >= 1"));
        }

        // NaN/inf здесь отсекаются: дальше они попали бы в RNG ranges
        ensure_in_range("reload_time", self.reload_time, 0.0, f64::MAX)?;
        ensure_in_range("projectile_velocity", self.projectile_velocity, 0.0, MAX_VELOCITY)?;
        ensure_in_range("spread_base", self.spread_base, 0.0, MAX_SPREAD_DEGREES)?;
        ensure_in_range("movement_penalty", self.movement_penalty, 0.0, MAX_SPREAD_DEGREES)?;
        ensure_in_range("vertical_recoil", self.vertical_recoil, -MAX_RECOIL, MAX_RECOIL)?;
        ensure_in_range("horizontal_recoil", self.horizontal_recoil, 0.0, MAX_RECOIL)?;
        ensure_in_range("misfire_chance", self.misfire_chance, 0.0, 1.0)?;
        ensure_in_range("jam_chance", self.jam_chance, 0.0, 1.0)?;

        if self.reload_method == ReloadMethod::InternalClip && self.clip_size == 0 {
            return Err(FirearmError::invalid("clip_size", "must be > 0 for InternalClip reload"));
        }
        if matches!(self.fire_mode, FireMode::Burst | FireMode::SelectFire) && self.burst_count == 0 {
            return Err(FirearmError::invalid("burst_count", "must be > 0 for burst-capable weapons"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for stats in [
            WeaponStats::pistol(),
            WeaponStats::assault_rifle(),
            WeaponStats::revolver(),
            WeaponStats::bolt_rifle(),
            WeaponStats::shotgun(),
            WeaponStats::minigun(),
        ] {
            assert!(stats.validate().is_ok(), "{} preset invalid", stats.name);
        }
    }

    #[test]
    fn test_negative_rpm_rejected() {
        let stats = WeaponStats {
            rpm: -10.0,
            ..WeaponStats::pistol()
        };
        assert!(matches!(
            stats.validate(),
            Err(FirearmError::InvalidStats { field: "rpm", .. })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let stats = WeaponStats {
            capacity: 0,
            ..WeaponStats::pistol()
        };
        assert!(matches!(
            stats.validate(),
            Err(FirearmError::InvalidStats { field: "capacity", .. })
        ));
    }

    #[test]
    fn test_negative_reload_time_rejected() {
        let stats = WeaponStats {
            reload_time: -0.1,
            ..WeaponStats::pistol()
        };
        assert!(stats.validate().is_err());
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let cases = [
            ("horizontal_recoil", WeaponStats { horizontal_recoil: f64::INFINITY, ..WeaponStats::pistol() }),
            ("spread_base", WeaponStats { spread_base: f64::NAN, ..WeaponStats::pistol() }),
            ("movement_penalty", WeaponStats { movement_penalty: f64::INFINITY, ..WeaponStats::pistol() }),
            ("vertical_recoil", WeaponStats { vertical_recoil: f64::NEG_INFINITY, ..WeaponStats::pistol() }),
            ("projectile_velocity", WeaponStats { projectile_velocity: f64::NAN, ..WeaponStats::pistol() }),
            ("jam_chance", WeaponStats { jam_chance: f64::NAN, ..WeaponStats::pistol() }),
        ];

        for (expected, stats) in cases {
            match stats.validate() {
                Err(FirearmError::InvalidStats { field, .. }) => assert_eq!(field, expected),
                other => panic!("{}: expected InvalidStats, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_huge_spread_rejected() {
        let stats = WeaponStats {
            spread_base: 1.0e300,
            ..WeaponStats::pistol()
        };
        assert!(matches!(
            stats.validate(),
            Err(FirearmError::InvalidStats { field: "spread_base", .. })
        ));
    }

    #[test]
    fn test_clip_reload_requires_clip_size() {
        let stats = WeaponStats {
            clip_size: 0,
            ..WeaponStats::bolt_rifle()
        };
        assert!(matches!(
            stats.validate(),
            Err(FirearmError::InvalidStats { field: "clip_size", .. })
        ));
    }

    #[test]
    fn test_selector_rotation() {
        assert_eq!(FireMode::SemiAuto.next_selector_position(), FireMode::Burst);
        assert_eq!(FireMode::Burst.next_selector_position(), FireMode::FullAuto);
        assert_eq!(FireMode::FullAuto.next_selector_position(), FireMode::SemiAuto);
        assert_eq!(FireMode::Manual.next_selector_position(), FireMode::Manual);
    }
}
