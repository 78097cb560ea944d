//! Firearm ECS systems (FixedUpdate, chained)
//!
//! Порядок в тике:
//! 1. apply_config_defaults: новые оружия получают gating из config
//! 2. process_cancel_reload_intents / interrupt_reload_on_movement
//! 3. tick_firearms: cooling, reload progress, budget refill
//! 4. process_reload_intents / process_fire_mode_intents
//! 5. process_trigger_intents: press → volley
//! 6. fire_held_triggers: FullAuto hold + продолжение burst
//!
//! Systems не содержат game rules: всё решает `WeaponStateMachine`,
//! здесь только маршрутизация intents → вызовы → result events.

use bevy::prelude::*;
use rand::Rng;

use super::components::{ShooterInput, TriggerState};
use super::events::{
    CancelReloadIntent, CycleFireModeIntent, FireModeChanged, FireRejected, InterruptCause, ReloadCompleted,
    ReloadIntent, ReloadInterrupted, ReloadStarted, RoundsLoaded, ShotFired, TriggerIntent,
};
use super::machine::{Volley, WeaponStateMachine};
use super::outcome::FailureReason;
use super::reload::ReloadProgress;
use super::spread::{shot_direction, ShotInput};
use super::stats::FireMode;
use crate::config::SimulationConfig;
use crate::{DeterministicRng, SimulationClock};

/// System: config defaults для только что заспавненного оружия
pub fn apply_config_defaults(
    config: Res<SimulationConfig>,
    mut weapons: Query<&mut WeaponStateMachine, Added<WeaponStateMachine>>,
) {
    for mut weapon in weapons.iter_mut() {
        weapon.apply_default_gating(config.gating);
    }
}

/// System: внешняя отмена перезарядки (смена оружия, cancel от host'а)
pub fn process_cancel_reload_intents(
    mut intents: EventReader<CancelReloadIntent>,
    mut weapons: Query<&mut WeaponStateMachine>,
    mut interrupted_events: EventWriter<ReloadInterrupted>,
) {
    for intent in intents.read() {
        let Ok(mut weapon) = weapons.get_mut(intent.shooter) else {
            crate::log_error(&format!(
                "CancelReloadIntent: entity {:?} has no WeaponStateMachine",
                intent.shooter
            ));
            continue;
        };

        if weapon.interrupt_reload() {
            interrupted_events.write(ReloadInterrupted {
                shooter: intent.shooter,
                cause: intent.cause,
                current: weapon.ammo().current(),
            });
        }
    }
}

/// System: sprint/jump прерывает перезарядку
pub fn interrupt_reload_on_movement(
    config: Res<SimulationConfig>,
    mut weapons: Query<(Entity, &ShooterInput, &mut WeaponStateMachine)>,
    mut interrupted_events: EventWriter<ReloadInterrupted>,
) {
    if !config.interrupt_reload_on_sprint {
        return;
    }

    for (entity, input, mut weapon) in weapons.iter_mut() {
        if !input.0.stance.is_moving() || !weapon.is_reloading() {
            continue;
        }

        weapon.interrupt_reload();
        interrupted_events.write(ReloadInterrupted {
            shooter: entity,
            cause: InterruptCause::Movement,
            current: weapon.ammo().current(),
        });
    }
}

/// System: tick всех оружий (cooling, reload, budget)
pub fn tick_firearms(
    clock: Res<SimulationClock>,
    mut weapons: Query<(Entity, &mut WeaponStateMachine)>,
    mut loaded_events: EventWriter<RoundsLoaded>,
    mut completed_events: EventWriter<ReloadCompleted>,
) {
    for (entity, mut weapon) in weapons.iter_mut() {
        match weapon.tick(clock.dt_secs, clock.now_ms) {
            ReloadProgress::Loaded { rounds } => {
                loaded_events.write(RoundsLoaded {
                    shooter: entity,
                    rounds,
                    current: weapon.ammo().current(),
                });
            }
            ReloadProgress::Completed { rounds } => {
                // Последний шаг clip/single тоже грузит патроны
                if rounds > 0 {
                    loaded_events.write(RoundsLoaded {
                        shooter: entity,
                        rounds,
                        current: weapon.ammo().current(),
                    });
                }
                completed_events.write(ReloadCompleted {
                    shooter: entity,
                    current: weapon.ammo().current(),
                });
            }
            ReloadProgress::Idle | ReloadProgress::InProgress => {}
        }
    }
}

/// System: ReloadIntent → start_reload
pub fn process_reload_intents(
    mut intents: EventReader<ReloadIntent>,
    mut weapons: Query<&mut WeaponStateMachine>,
    mut started_events: EventWriter<ReloadStarted>,
) {
    for intent in intents.read() {
        let Ok(mut weapon) = weapons.get_mut(intent.shooter) else {
            crate::log_error(&format!(
                "ReloadIntent: entity {:?} has no WeaponStateMachine",
                intent.shooter
            ));
            continue;
        };

        if weapon.start_reload() {
            started_events.write(ReloadStarted {
                shooter: intent.shooter,
                current: weapon.ammo().current(),
                capacity: weapon.ammo().capacity(),
            });
        }
    }
}

/// System: переключение селектора
pub fn process_fire_mode_intents(
    mut intents: EventReader<CycleFireModeIntent>,
    mut weapons: Query<&mut WeaponStateMachine>,
    mut changed_events: EventWriter<FireModeChanged>,
) {
    for intent in intents.read() {
        let Ok(mut weapon) = weapons.get_mut(intent.shooter) else {
            crate::log_error(&format!(
                "CycleFireModeIntent: entity {:?} has no WeaponStateMachine",
                intent.shooter
            ));
            continue;
        };

        if let Some(mode) = weapon.cycle_fire_mode() {
            changed_events.write(FireModeChanged {
                shooter: intent.shooter,
                mode,
            });
        }
    }
}

/// System: TriggerIntent → held state + volley на нажатие
///
/// Каждое нажатие получает результат: либо ShotFired, либо FireRejected.
#[allow(clippy::too_many_arguments)]
pub fn process_trigger_intents(
    mut intents: EventReader<TriggerIntent>,
    clock: Res<SimulationClock>,
    config: Res<SimulationConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut weapons: Query<(&mut WeaponStateMachine, &ShooterInput, &mut TriggerState)>,
    mut shot_events: EventWriter<ShotFired>,
    mut rejected_events: EventWriter<FireRejected>,
    mut interrupted_events: EventWriter<ReloadInterrupted>,
) {
    for intent in intents.read() {
        let Ok((mut weapon, input, mut trigger)) = weapons.get_mut(intent.shooter) else {
            crate::log_error(&format!(
                "TriggerIntent: entity {:?} has no WeaponStateMachine",
                intent.shooter
            ));
            continue;
        };

        trigger.held = intent.pressed;
        if !intent.pressed {
            continue;
        }

        let was_reloading = weapon.is_reloading();
        let volley = weapon.fire_volley(clock.now_ms, &input.0, &mut rng.rng);

        report_fire_interrupt(intent.shooter, &weapon, was_reloading, &volley, &mut interrupted_events);
        write_shots(intent.shooter, &weapon, &input.0, &volley, &mut rng.rng, config.debug_mode, &mut shot_events);

        if let Some(reason) = volley.stopped_by.filter(|_| volley.shots.is_empty()) {
            rejected_events.write(FireRejected {
                shooter: intent.shooter,
                reason,
                at_ms: clock.now_ms,
            });
        }
    }
}

/// System: удержание спуска (FullAuto) и продолжение burst
///
/// OnCooldown здесь норма (ждём следующего выстрела) и не репортится.
/// Любая другая ошибка отпускает спуск: нужен новый `TriggerIntent`.
pub fn fire_held_triggers(
    clock: Res<SimulationClock>,
    config: Res<SimulationConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut weapons: Query<(Entity, &mut WeaponStateMachine, &ShooterInput, &mut TriggerState)>,
    mut shot_events: EventWriter<ShotFired>,
    mut rejected_events: EventWriter<FireRejected>,
    mut interrupted_events: EventWriter<ReloadInterrupted>,
) {
    for (entity, mut weapon, input, mut trigger) in weapons.iter_mut() {
        let auto_held = trigger.held && weapon.fire_mode() == FireMode::FullAuto;
        let mid_burst = weapon.burst_remaining() > 0;
        if !auto_held && !mid_burst {
            continue;
        }

        let was_reloading = weapon.is_reloading();
        let volley = if mid_burst {
            weapon.continue_burst(clock.now_ms, &input.0, &mut rng.rng)
        } else {
            weapon.fire_volley(clock.now_ms, &input.0, &mut rng.rng)
        };

        report_fire_interrupt(entity, &weapon, was_reloading, &volley, &mut interrupted_events);
        write_shots(entity, &weapon, &input.0, &volley, &mut rng.rng, config.debug_mode, &mut shot_events);

        match volley.stopped_by {
            None | Some(FailureReason::OnCooldown) => {}
            Some(reason) => {
                trigger.held = false;
                rejected_events.write(FireRejected {
                    shooter: entity,
                    reason,
                    at_ms: clock.now_ms,
                });
            }
        }
    }
}

/// Выстрел во время InternalSingle/InternalClip reload прерывает его
fn report_fire_interrupt(
    shooter: Entity,
    weapon: &WeaponStateMachine,
    was_reloading: bool,
    volley: &Volley,
    interrupted_events: &mut EventWriter<ReloadInterrupted>,
) {
    if was_reloading && !weapon.is_reloading() && !volley.shots.is_empty() {
        interrupted_events.write(ReloadInterrupted {
            shooter,
            cause: InterruptCause::Fired,
            // Патроны до volley: текущие + выпущенные
            current: weapon.ammo().current() + volley.shots.len() as u32,
        });
    }
}

/// ShotFired на каждый выстрел volley (directions на каждый projectile)
fn write_shots<R: Rng + ?Sized>(
    shooter: Entity,
    weapon: &WeaponStateMachine,
    input: &ShotInput,
    volley: &Volley,
    rng: &mut R,
    debug_mode: bool,
    shot_events: &mut EventWriter<ShotFired>,
) {
    let stats = weapon.stats();
    let ammo = weapon.ammo_modifiers();
    let modifiers = weapon.combined_modifiers();
    let remaining_after_volley = weapon.ammo().current();
    let total = volley.shots.len() as u32;

    for (index, shot) in volley.shots.iter().enumerate() {
        let spread_radians = shot.spread.to_radians();
        let directions = (0..stats.projectile_count)
            .map(|_| shot_direction(input.orientation, spread_radians, rng))
            .collect::<Vec<_>>();

        let ammo_left = remaining_after_volley + (total - 1 - index as u32);

        if debug_mode {
            crate::log(&format!(
                "🔫 {:?} {} @{:.2}ms: spread {:.3}°, recoil ({:.3}, {:.3}), {} projectile(s), ammo {}",
                shooter,
                stats.name,
                shot.at_ms,
                shot.spread,
                shot.recoil.vertical,
                shot.recoil.horizontal,
                directions.len(),
                ammo_left
            ));
        }

        shot_events.write(ShotFired {
            shooter,
            at_ms: shot.at_ms,
            recoil: shot.recoil,
            spread: shot.spread,
            directions,
            velocity: stats.projectile_velocity * ammo.velocity_mod,
            damage_multiplier: ammo.damage_mod * modifiers.damage,
            noise_multiplier: modifiers.noise,
            ammo_left,
        });
    }
}
