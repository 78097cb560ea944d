//! Spread & recoil: чистые функции от stats, stance и RNG
//!
//! Ничего не хранят: state machine вызывает их на каждый успешный выстрел,
//! host вызывает `shot_direction` на каждый pellet.

use bevy::math::DVec3;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Crouch и aim множители (компонуются)
pub const CROUCH_SPREAD_MULTIPLIER: f64 = 0.7;
pub const AIM_SPREAD_MULTIPLIER: f64 = 0.7;

/// Body stance of the shooter at trigger time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum Stance {
    #[default]
    Standing,
    Running,
    Jumping,
    Crouching,
}

impl Stance {
    /// Running/jumping: добавляет movement penalty (и может прервать reload)
    pub fn is_moving(self) -> bool {
        matches!(self, Stance::Running | Stance::Jumping)
    }
}

/// Look direction (radians)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize, Default)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
}

impl Orientation {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }
}

/// Per-call shooter input (не принадлежит core)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize, Default)]
pub struct ShotInput {
    pub orientation: Orientation,
    pub stance: Stance,
    pub aiming: bool,
}

impl ShotInput {
    pub fn standing() -> Self {
        Self::default()
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    pub fn aiming(mut self, aiming: bool) -> Self {
        self.aiming = aiming;
        self
    }
}

/// Post-shot aim displacement
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize, Default)]
pub struct Recoil {
    pub vertical: f64,
    pub horizontal: f64,
}

impl Recoil {
    pub fn scaled(self, multiplier: f64) -> Self {
        Self {
            vertical: self.vertical * multiplier,
            horizontal: self.horizontal * multiplier,
        }
    }
}

impl From<Recoil> for (f64, f64) {
    fn from(recoil: Recoil) -> Self {
        (recoil.vertical, recoil.horizontal)
    }
}

/// Effective spread in degrees
pub fn current_spread(
    base: f64,
    movement_penalty: f64,
    stance: Stance,
    ammo_spread_mod: f64,
    aiming: bool,
) -> f64 {
    let mut spread = base;

    if stance.is_moving() {
        spread += movement_penalty;
    }
    if stance == Stance::Crouching {
        spread *= CROUCH_SPREAD_MULTIPLIER;
    }
    if aiming {
        spread *= AIM_SPREAD_MULTIPLIER;
    }

    spread.max(0.0) * ammo_spread_mod
}

/// Vertical as-is, horizontal uniform in ±horizontal
pub fn recoil<R: Rng + ?Sized>(vertical: f64, horizontal: f64, rng: &mut R) -> Recoil {
    let horizontal = if horizontal > 0.0 && horizontal.is_finite() {
        rng.gen_range(-horizontal..=horizontal)
    } else {
        0.0
    };

    Recoil {
        vertical,
        horizontal,
    }
}

/// Unit direction for one projectile. Yaw/pitch jittered в ±spread (radians).
///
/// yaw = 0, pitch = 0 смотрит в -Z.
pub fn shot_direction<R: Rng + ?Sized>(orientation: Orientation, spread_radians: f64, rng: &mut R) -> DVec3 {
    // Non-finite spread (overflow множителей) не должен доходить до gen_range
    let (yaw_jitter, pitch_jitter) = if spread_radians > 0.0 && spread_radians.is_finite() {
        (
            rng.gen_range(-spread_radians..=spread_radians),
            rng.gen_range(-spread_radians..=spread_radians),
        )
    } else {
        (0.0, 0.0)
    };

    let yaw = orientation.yaw + yaw_jitter;
    let pitch = orientation.pitch + pitch_jitter;

    DVec3::new(
        -yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
    .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_running_adds_penalty() {
        assert!(approx(current_spread(2.0, 1.0, Stance::Running, 1.0, false), 3.0));
        assert!(approx(current_spread(2.0, 1.0, Stance::Jumping, 1.0, false), 3.0));
    }

    #[test]
    fn test_running_and_aiming() {
        assert!(approx(current_spread(2.0, 1.0, Stance::Running, 1.0, true), 2.1));
    }

    #[test]
    fn test_crouching() {
        assert!(approx(current_spread(2.0, 1.0, Stance::Crouching, 1.0, false), 1.4));
        // crouch + aim компонуются
        assert!(approx(current_spread(2.0, 1.0, Stance::Crouching, 1.0, true), 0.98));
    }

    #[test]
    fn test_ammo_mod_applied_last() {
        assert!(approx(current_spread(2.0, 1.0, Stance::Standing, 1.5, false), 3.0));
    }

    #[test]
    fn test_negative_spread_floored() {
        assert_eq!(current_spread(-1.0, 0.0, Stance::Standing, 2.0, false), 0.0);
    }

    #[test]
    fn test_recoil_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let r = recoil(3.0, 1.5, &mut rng);
            assert_eq!(r.vertical, 3.0);
            assert!(r.horizontal >= -1.5 && r.horizontal <= 1.5);
        }
        assert_eq!(recoil(3.0, 0.0, &mut rng).horizontal, 0.0);
    }

    #[test]
    fn test_non_finite_inputs_do_not_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(recoil(1.0, f64::INFINITY, &mut rng).horizontal, 0.0);
        assert_eq!(recoil(1.0, f64::NAN, &mut rng).horizontal, 0.0);

        let dir = shot_direction(Orientation::default(), f64::INFINITY, &mut rng);
        assert!(approx(dir.z, -1.0));
    }

    #[test]
    fn test_recoil_into_tuple() {
        let pair: (f64, f64) = Recoil { vertical: 2.0, horizontal: -0.5 }.into();
        assert_eq!(pair, (2.0, -0.5));
    }

    #[test]
    fn test_zero_spread_direction_is_forward() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let dir = shot_direction(Orientation::default(), 0.0, &mut rng);
        assert!(approx(dir.x, 0.0));
        assert!(approx(dir.y, 0.0));
        assert!(approx(dir.z, -1.0));
    }

    #[test]
    fn test_spread_direction_stays_in_cone() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let spread = 5.0_f64.to_radians();
        let forward = DVec3::NEG_Z;
        for _ in 0..100 {
            let dir = shot_direction(Orientation::default(), spread, &mut rng);
            assert!(approx(dir.length(), 1.0));
            // yaw и pitch по ±spread → угол не больше ~spread * sqrt(2)
            assert!(dir.angle_between(forward) <= spread * 1.5);
        }
    }

    #[test]
    fn test_same_seed_same_directions() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let orientation = Orientation::new(0.3, -0.1);
        for _ in 0..10 {
            assert_eq!(
                shot_direction(orientation, 0.05, &mut a),
                shot_direction(orientation, 0.05, &mut b)
            );
        }
    }
}
