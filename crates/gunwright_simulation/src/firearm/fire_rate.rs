//! Rate-of-fire distributor
//!
//! Дискретная симуляция: оружие с rpm выше tick rate должно стрелять
//! несколько раз за тик, иначе минигун на 60Hz упирается в 3600 rpm потолок.
//!
//! cooldown = 60000 / rpm (ms)
//! shots_this_tick(t) = max(1, floor(t / cooldown))

use bevy::prelude::*;

/// Допуск на накопленную ошибку float clock (now += 1000/hz каждый тик)
const TIME_EPSILON_MS: f64 = 1e-6;

/// Pure rpm → timing math (никакого state кроме rpm)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FireRateScheduler {
    rpm: f64,
}

impl FireRateScheduler {
    /// `rpm` must be > 0 (проверяется в `WeaponStats::validate`)
    pub fn new(rpm: f64) -> Self {
        Self { rpm }
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Minimum interval between two shots (ms)
    pub fn cooldown_ms(&self) -> f64 {
        60_000.0 / self.rpm
    }

    /// Shots allowed in a tick of the given length. Always at least one:
    /// медленное оружие гейтится wall-clock проверкой, а не бюджетом.
    pub fn shots_this_tick(&self, tick_duration_ms: f64) -> u32 {
        let shots = (tick_duration_ms / self.cooldown_ms()).floor();
        if shots.is_finite() && shots >= 1.0 {
            shots as u32
        } else {
            1
        }
    }

    /// Wall-clock check: прошло ли достаточно времени с последнего выстрела
    pub fn is_ready(&self, last_shot_ms: Option<f64>, now_ms: f64) -> bool {
        match last_shot_ms {
            Some(last) => now_ms - last + TIME_EPSILON_MS >= self.cooldown_ms(),
            None => true,
        }
    }
}

/// Tick length for a fixed tick rate (ms)
pub fn tick_duration_ms(tick_rate_hz: f64) -> f64 {
    1000.0 / tick_rate_hz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_from_rpm() {
        assert_eq!(FireRateScheduler::new(600.0).cooldown_ms(), 100.0);
        assert_eq!(FireRateScheduler::new(60.0).cooldown_ms(), 1000.0);
    }

    #[test]
    fn test_slow_weapon_clamped_to_one() {
        // 600 rpm на 60Hz: 16.67ms / 100ms = 0.17 → clamp 1
        let scheduler = FireRateScheduler::new(600.0);
        assert_eq!(scheduler.shots_this_tick(tick_duration_ms(60.0)), 1);
    }

    #[test]
    fn test_fast_weapon_multiple_per_tick() {
        // 6000 rpm → cooldown 10ms
        let scheduler = FireRateScheduler::new(6000.0);
        assert_eq!(scheduler.shots_this_tick(60.0), 6);
        assert_eq!(scheduler.shots_this_tick(16.0 + 2.0 / 3.0), 1);
        assert_eq!(scheduler.shots_this_tick(35.0), 3);
    }

    #[test]
    fn test_minigun_at_thirty_hz() {
        // 3600 rpm = 16.67ms cooldown, тик 33.3ms → два выстрела
        let scheduler = FireRateScheduler::new(3600.0);
        assert_eq!(scheduler.shots_this_tick(tick_duration_ms(30.0)), 2);
    }

    #[test]
    fn test_is_ready() {
        let scheduler = FireRateScheduler::new(600.0);
        assert!(scheduler.is_ready(None, 0.0));
        assert!(!scheduler.is_ready(Some(0.0), 99.9));
        assert!(scheduler.is_ready(Some(0.0), 100.0));
    }

    #[test]
    fn test_is_ready_tolerates_clock_drift() {
        // 3600 rpm на 60Hz: накопленный now может отстать на ulp
        let scheduler = FireRateScheduler::new(3600.0);
        let tick = tick_duration_ms(60.0);
        let mut now = 0.0;
        let mut last = 0.0;
        for _ in 0..600 {
            now += tick;
            assert!(scheduler.is_ready(Some(last), now), "drift at {}", now);
            last = now;
        }
    }

    #[test]
    fn test_zero_tick_still_one_shot() {
        let scheduler = FireRateScheduler::new(600.0);
        assert_eq!(scheduler.shots_this_tick(0.0), 1);
    }
}
