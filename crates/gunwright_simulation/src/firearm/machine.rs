//! WeaponStateMachine: оркестратор одного экземпляра оружия
//!
//! # Архитектура
//!
//! - Один owner на оружие, синхронно, один вызов за раз
//! - Transient state (Ready/OnCooldown/Reloading/...) НЕ хранится,
//!   выводится заново на каждый вызов из ammo/heat/timestamps
//! - Host вызывает `tick(dt, now)` раз в тик, затем `trigger()` / `fire_volley()`
//! - RNG всегда инжектится снаружи (seeded, детерминизм)
//!
//! # Порядок проверок в `trigger()`
//!
//! 0. disabled → Disabled
//! 1. reload без права прерывания (или 0 патронов) → Reloading
//! 2. tick budget / wall-clock cooldown → OnCooldown (ничего не меняет)
//! 3. прерываемый reload (InternalSingle/InternalClip): прерывается здесь
//! 4. 0 патронов → OutOfAmmo
//! 5. barrel broken → Jammed; jam roll → Jammed (barrel ломается)
//! 6. barrel перегрет → Overheated
//! 7. Success: -1 патрон, last_shot = now, -1 budget

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ammo::{AmmoModifiers, AmmoStore};
use super::attachment::{Attachment, AttachmentModifiers, AttachmentSlot, Barrel};
use super::components::{ShooterInput, TriggerState};
use super::error::{FirearmError, FirearmResult};
use super::fire_rate::{tick_duration_ms, FireRateScheduler};
use super::outcome::{FailureReason, FireOutcome, WeaponState};
use super::reload::{CustomReload, ReloadProgress, ReloadProtocol};
use super::spread::{current_spread, recoil, Recoil, ShotInput};
use super::stats::{FireMode, WeaponStats};

/// Как гейтится cooldown между выстрелами
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize, Default)]
pub enum CooldownGating {
    /// Per-tick shot budget + wall-clock interval (позволяет несколько выстрелов за тик)
    #[default]
    TickBudget,
    /// Только wall-clock interval, максимум один выстрел за volley
    WallClock,
}

/// One successful shot of a volley
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolleyShot {
    /// Sub-tick timestamp (ms), сдвинут на cooldown от предыдущего
    pub at_ms: f64,
    pub recoil: Recoil,
    pub spread: f64,
}

/// All shots of one trigger evaluation within a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volley {
    pub shots: Vec<VolleyShot>,
    /// Failure that stopped the volley (None: fired everything allowed)
    pub stopped_by: Option<FailureReason>,
}

impl Volley {
    pub fn fired(&self) -> usize {
        self.shots.len()
    }
}

/// Runtime state of one weapon instance
#[derive(Component, Debug)]
#[require(ShooterInput, TriggerState)]
pub struct WeaponStateMachine {
    stats: WeaponStats,
    ammo: AmmoStore,
    reload: ReloadProtocol,
    fire_rate: FireRateScheduler,
    barrel: Option<Barrel>,
    attachments: Vec<Attachment>,
    ammo_modifiers: AmmoModifiers,
    gating: CooldownGating,
    /// Gating задан явно (иначе берётся default из `SimulationConfig`)
    gating_explicit: bool,
    /// Активный режим (для SelectFire: позиция селектора)
    fire_mode: FireMode,
    last_shot_ms: Option<f64>,
    shots_left_this_tick: u32,
    burst_remaining: u32,
}

impl WeaponStateMachine {
    /// Creates a weapon with a full magazine and the built-in reload protocol
    /// for its `reload_method`.
    pub fn new(stats: WeaponStats, tick_rate_hz: f64) -> FirearmResult<Self> {
        let reload = match ReloadProtocol::for_stats(&stats) {
            Ok(reload) => reload,
            Err(err) => {
                crate::log_error(&format!("Weapon construction rejected: {}", err));
                return Err(err);
            }
        };
        Self::build(stats, tick_rate_hz, reload)
    }

    /// Same as `new`, но с пользовательским reload protocol
    /// (обязательно для `ReloadMethod::Other`).
    pub fn with_custom_reload(
        stats: WeaponStats,
        tick_rate_hz: f64,
        reload: impl CustomReload,
    ) -> FirearmResult<Self> {
        Self::build(stats, tick_rate_hz, ReloadProtocol::custom(reload))
    }

    fn build(stats: WeaponStats, tick_rate_hz: f64, reload: ReloadProtocol) -> FirearmResult<Self> {
        let validated = stats.validate().and_then(|_| {
            if tick_rate_hz.is_finite() && tick_rate_hz > 0.0 {
                Ok(())
            } else {
                Err(FirearmError::invalid(
                    "tick_rate_hz",
                    format!("must be > 0 (got {})", tick_rate_hz),
                ))
            }
        });
        if let Err(err) = validated {
            crate::log_error(&format!("Weapon `{}` construction rejected: {}", stats.name, err));
            return Err(err);
        }

        let fire_rate = FireRateScheduler::new(stats.rpm);
        let fire_mode = match stats.fire_mode {
            FireMode::SelectFire => FireMode::FullAuto,
            mode => mode,
        };

        Ok(Self {
            ammo: AmmoStore::full(stats.capacity),
            shots_left_this_tick: fire_rate.shots_this_tick(tick_duration_ms(tick_rate_hz)),
            stats,
            reload,
            fire_rate,
            barrel: None,
            attachments: Vec::new(),
            ammo_modifiers: AmmoModifiers::default(),
            gating: CooldownGating::default(),
            gating_explicit: false,
            fire_mode,
            last_shot_ms: None,
            burst_remaining: 0,
        })
    }

    pub fn with_gating(mut self, gating: CooldownGating) -> Self {
        self.set_gating(gating);
        self
    }

    /// Стартовое количество патронов (clamp до capacity)
    pub fn with_loaded_rounds(mut self, rounds: u32) -> Self {
        self.ammo = AmmoStore::new(self.stats.capacity, rounds);
        self
    }

    // === Accessors ===

    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    pub fn ammo(&self) -> &AmmoStore {
        &self.ammo
    }

    pub fn reload_protocol(&self) -> &ReloadProtocol {
        &self.reload
    }

    pub fn fire_rate(&self) -> &FireRateScheduler {
        &self.fire_rate
    }

    pub fn barrel(&self) -> Option<&Barrel> {
        self.barrel.as_ref()
    }

    /// Для внешнего repair (`barrel_mut().heat.repair()`)
    pub fn barrel_mut(&mut self) -> Option<&mut Barrel> {
        self.barrel.as_mut()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn ammo_modifiers(&self) -> &AmmoModifiers {
        &self.ammo_modifiers
    }

    pub fn gating(&self) -> CooldownGating {
        self.gating
    }

    pub fn set_gating(&mut self, gating: CooldownGating) {
        self.gating = gating;
        self.gating_explicit = true;
    }

    /// Config default, не перетирает явно заданный gating
    pub fn apply_default_gating(&mut self, gating: CooldownGating) {
        if !self.gating_explicit {
            self.gating = gating;
        }
    }

    pub fn fire_mode(&self) -> FireMode {
        self.fire_mode
    }

    pub fn last_shot_ms(&self) -> Option<f64> {
        self.last_shot_ms
    }

    pub fn shots_left_this_tick(&self) -> u32 {
        self.shots_left_this_tick
    }

    pub fn burst_remaining(&self) -> u32 {
        self.burst_remaining
    }

    pub fn is_reloading(&self) -> bool {
        self.ammo.is_reloading()
    }

    /// Произведение множителей barrel + всех attachments
    pub fn combined_modifiers(&self) -> AttachmentModifiers {
        let base = self
            .barrel
            .as_ref()
            .map(|barrel| barrel.modifiers)
            .unwrap_or_default();

        self.attachments
            .iter()
            .fold(base, |acc, attachment| acc.combine(attachment.modifiers))
    }

    // === Attachments & ammo ===

    /// Ставит attachment в его слот, возвращает снятый (если слот был занят).
    /// Невалидные множители отклоняются, оружие не меняется.
    pub fn attach(&mut self, attachment: Attachment) -> FirearmResult<Option<Attachment>> {
        self.reject_invalid(&attachment.name, attachment.modifiers.validate())?;
        let previous = self.detach(attachment.slot);
        self.attachments.push(attachment);
        Ok(previous)
    }

    pub fn detach(&mut self, slot: AttachmentSlot) -> Option<Attachment> {
        let index = self.attachments.iter().position(|a| a.slot == slot)?;
        Some(self.attachments.remove(index))
    }

    /// Ставит barrel (heat state приходит вместе с ним), возвращает старый
    pub fn attach_barrel(&mut self, barrel: Barrel) -> FirearmResult<Option<Barrel>> {
        self.reject_invalid(&barrel.name, barrel.validate())?;
        Ok(self.barrel.replace(barrel))
    }

    pub fn detach_barrel(&mut self) -> Option<Barrel> {
        self.barrel.take()
    }

    /// Меняет тип патрона, возвращает предыдущий
    pub fn load_ammo_type(&mut self, modifiers: AmmoModifiers) -> FirearmResult<AmmoModifiers> {
        self.reject_invalid(&modifiers.name, modifiers.validate())?;
        Ok(std::mem::replace(&mut self.ammo_modifiers, modifiers))
    }

    fn reject_invalid(&self, part: &str, result: FirearmResult<()>) -> FirearmResult<()> {
        if let Err(err) = &result {
            crate::log_error(&format!("{}: `{}` rejected: {}", self.stats.name, part, err));
        }
        result
    }

    // === Tick ===

    /// Advance one simulation tick: barrel cooling, reload progress, budget refill.
    ///
    /// `dt` в секундах, `now_ms`: время начала тика.
    pub fn tick(&mut self, dt: f64, now_ms: f64) -> ReloadProgress {
        if let Some(barrel) = self.barrel.as_mut() {
            barrel.heat.update_cooling(now_ms, dt);
        }

        let progress = self.reload.advance(&mut self.ammo, self.stats.reload_time, dt);
        match progress {
            ReloadProgress::Completed { rounds } => crate::log(&format!(
                "✅ {}: reload complete (+{}, {}/{})",
                self.stats.name,
                rounds,
                self.ammo.current(),
                self.ammo.capacity()
            )),
            ReloadProgress::Loaded { rounds } => crate::log(&format!(
                "{}: loaded +{} ({}/{})",
                self.stats.name,
                rounds,
                self.ammo.current(),
                self.ammo.capacity()
            )),
            ReloadProgress::Idle | ReloadProgress::InProgress => {}
        }

        self.shots_left_this_tick = self.fire_rate.shots_this_tick(dt * 1000.0);
        progress
    }

    // === Reload ===

    /// Idle → Reloading. False если магазин полон или reload уже идёт.
    /// Отменяет незаконченный burst.
    pub fn start_reload(&mut self) -> bool {
        if !self.reload.start(&mut self.ammo) {
            return false;
        }

        self.burst_remaining = 0;
        crate::log(&format!(
            "🔄 {}: reload started ({:?}, {}/{})",
            self.stats.name,
            self.reload,
            self.ammo.current(),
            self.ammo.capacity()
        ));
        true
    }

    /// Внешняя отмена перезарядки. Патроны, уже заряженные, остаются.
    pub fn interrupt_reload(&mut self) -> bool {
        if !self.ammo.is_reloading() {
            return false;
        }

        self.reload.interrupt(&mut self.ammo);
        crate::log(&format!(
            "{}: reload interrupted ({}/{})",
            self.stats.name,
            self.ammo.current(),
            self.ammo.capacity()
        ));
        true
    }

    // === Fire modes ===

    /// Переключает селектор (только SelectFire). Отменяет burst.
    pub fn cycle_fire_mode(&mut self) -> Option<FireMode> {
        if self.stats.fire_mode != FireMode::SelectFire {
            return None;
        }

        self.fire_mode = self.fire_mode.next_selector_position();
        self.burst_remaining = 0;
        Some(self.fire_mode)
    }

    // === Trigger ===

    /// Evaluate one shot at `now_ms`.
    pub fn trigger<R: Rng + ?Sized>(&mut self, now_ms: f64, input: &ShotInput, rng: &mut R) -> FireOutcome {
        if self.stats.disabled {
            return FireOutcome::failure(FailureReason::Disabled);
        }

        let interrupts_reload = if self.ammo.is_reloading() {
            if self.ammo.is_empty() || !self.reload.allows_fire_interrupt() {
                return FireOutcome::failure(FailureReason::Reloading);
            }
            true
        } else {
            false
        };

        if !self.cooldown_ready(now_ms) {
            return FireOutcome::failure(FailureReason::OnCooldown);
        }

        if interrupts_reload {
            self.interrupt_reload();
        }

        if self.ammo.is_empty() {
            return FireOutcome::failure(FailureReason::OutOfAmmo);
        }

        if let Some(barrel) = self.barrel.as_mut() {
            if barrel.heat.is_broken() {
                return FireOutcome::failure(FailureReason::Jammed);
            }

            if self.stats.jam_chance > 0.0 && rng.gen::<f64>() < self.stats.jam_chance {
                barrel.heat.jam();
                crate::log_warning(&format!("{}: jammed", self.stats.name));
                return FireOutcome::failure(FailureReason::Jammed);
            }

            if !barrel.heat.on_shoot(now_ms) {
                return FireOutcome::failure(FailureReason::Overheated);
            }
        }

        self.ammo.consume();
        self.last_shot_ms = Some(now_ms);
        self.shots_left_this_tick = self.shots_left_this_tick.saturating_sub(1);

        let modifiers = self.combined_modifiers();
        let spread = current_spread(
            self.stats.spread_base,
            self.stats.movement_penalty,
            input.stance,
            self.ammo_modifiers.spread_mod,
            input.aiming,
        ) * modifiers.spread;
        let recoil = recoil(self.stats.vertical_recoil, self.stats.horizontal_recoil, rng).scaled(modifiers.recoil);

        FireOutcome::Success { recoil, spread }
    }

    /// Новое нажатие спуска: стреляет столько, сколько позволяет fire mode и бюджет тика.
    ///
    /// - SemiAuto / Manual → 1
    /// - FullAuto → до исчерпания tick budget
    /// - Burst → начинает очередь из `burst_count` (остаток через `continue_burst`)
    pub fn fire_volley<R: Rng + ?Sized>(&mut self, now_ms: f64, input: &ShotInput, rng: &mut R) -> Volley {
        let arming = self.fire_mode == FireMode::Burst && self.burst_remaining == 0;
        if arming {
            self.burst_remaining = self.stats.burst_count;
        }

        let volley = self.fire_shots(now_ms, input, rng);

        // Нажатие, которое не дало ни одного выстрела, burst не взводит
        if arming && volley.shots.is_empty() {
            self.burst_remaining = 0;
        }
        volley
    }

    /// Продолжение незаконченного burst (вызывается каждый тик, пока `burst_remaining > 0`)
    pub fn continue_burst<R: Rng + ?Sized>(&mut self, now_ms: f64, input: &ShotInput, rng: &mut R) -> Volley {
        if self.burst_remaining == 0 {
            return Volley::default();
        }
        self.fire_shots(now_ms, input, rng)
    }

    fn fire_shots<R: Rng + ?Sized>(&mut self, now_ms: f64, input: &ShotInput, rng: &mut R) -> Volley {
        let budget_cap = match self.gating {
            CooldownGating::TickBudget => self.shots_left_this_tick.max(1),
            CooldownGating::WallClock => 1,
        };
        let limit = match self.fire_mode {
            FireMode::FullAuto => budget_cap,
            FireMode::Burst => self.burst_remaining.min(budget_cap),
            FireMode::SemiAuto | FireMode::Manual | FireMode::SelectFire => 1,
        };

        let cooldown = self.fire_rate.cooldown_ms();
        let mut volley = Volley::default();

        for index in 0..limit {
            let at_ms = now_ms + index as f64 * cooldown;
            match self.trigger(at_ms, input, rng) {
                FireOutcome::Success { recoil, spread } => {
                    volley.shots.push(VolleyShot { at_ms, recoil, spread });
                    if self.fire_mode == FireMode::Burst {
                        self.burst_remaining = self.burst_remaining.saturating_sub(1);
                    }
                }
                FireOutcome::Failure { reason } => {
                    // OnCooldown: burst просто ждёт следующего тика
                    if reason != FailureReason::OnCooldown {
                        self.burst_remaining = 0;
                    }
                    volley.stopped_by = Some(reason);
                    break;
                }
            }
        }

        volley
    }

    // === Derived state ===

    /// Текущее состояние, выведенное из ammo/heat/timestamps
    pub fn state(&self, now_ms: f64) -> WeaponState {
        if self.stats.disabled {
            return WeaponState::Disabled;
        }
        if self.ammo.is_reloading() {
            return WeaponState::Reloading;
        }
        if let Some(barrel) = &self.barrel {
            if barrel.heat.is_broken() {
                return WeaponState::Jammed;
            }
            if barrel.heat.is_overheated() {
                return WeaponState::Overheated;
            }
        }
        if self.ammo.is_empty() {
            return WeaponState::OutOfAmmo;
        }
        if !self.cooldown_ready(now_ms) {
            return WeaponState::OnCooldown;
        }
        WeaponState::Ready
    }

    fn cooldown_ready(&self, now_ms: f64) -> bool {
        let interval_passed = self.fire_rate.is_ready(self.last_shot_ms, now_ms);
        match self.gating {
            CooldownGating::TickBudget => self.shots_left_this_tick > 0 && interval_passed,
            CooldownGating::WallClock => interval_passed,
        }
    }
}
