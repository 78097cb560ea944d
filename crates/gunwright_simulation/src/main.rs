//! Headless firing range
//!
//! Спавнит по экземпляру каждого preset оружия, жмёт спуск по скрипту
//! и перезаряжается на OutOfAmmo. Печатает сводку по каждому оружию.

use std::collections::BTreeMap;

use bevy::ecs::event::{Event, Events};
use bevy::prelude::*;
use gunwright_simulation::firearm::{
    FireMode, FireRejected, ReloadCompleted, ReloadIntent, ReloadInterrupted, ReloadStarted, RoundsLoaded,
    ShooterInput, TriggerIntent,
};
use gunwright_simulation::{
    create_headless_app, log_error, log_info, FailureReason, ShotFired, ShotInput, SimulationConfig,
    WeaponDefinitions, WeaponStateMachine,
};

const TICKS: u64 = 600;

#[derive(Default)]
struct RangeStats {
    name: String,
    shots: usize,
    rejected: BTreeMap<String, usize>,
    reloads: usize,
    rounds_loaded: u32,
    interrupted: usize,
}

/// FixedUpdate гоняется вручную, без `Events::update`: буферы чистим сами
fn drain_events<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn main() {
    let seed = 42;
    println!("Starting Gunwright firing range (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.update();

    let tick_rate = app.world().resource::<SimulationConfig>().tick_rate_hz;
    let definitions = app.world().resource::<WeaponDefinitions>().clone();

    let mut range: BTreeMap<Entity, RangeStats> = BTreeMap::new();
    for id in definitions.all_ids() {
        let weapon = match definitions.instantiate(id, tick_rate) {
            Ok(weapon) => weapon,
            Err(err) => {
                log_error(&format!("Skipping {}: {}", id, err));
                continue;
            }
        };
        let name = weapon.stats().name.clone();
        let entity = app
            .world_mut()
            .spawn((weapon, ShooterInput(ShotInput::standing().aiming(true))))
            .id();
        range.insert(
            entity,
            RangeStats {
                name,
                ..default()
            },
        );
    }

    for tick in 0..TICKS {
        // Auto оружие держит спуск (и зажимает заново раз в секунду после
        // перезарядки), остальные жмут раз в 20 тиков
        for &entity in range.keys() {
            let Some(weapon) = app.world().get::<WeaponStateMachine>(entity) else {
                continue;
            };
            let intent = match weapon.fire_mode() {
                FireMode::FullAuto if tick % 60 == 0 => Some(true),
                FireMode::FullAuto => None,
                _ if tick % 20 == 0 => Some(true),
                _ if tick % 20 == 1 => Some(false),
                _ => None,
            };
            if let Some(pressed) = intent {
                app.world_mut().send_event(TriggerIntent {
                    shooter: entity,
                    pressed,
                });
            }
        }

        app.world_mut().run_schedule(FixedUpdate);

        // Intents уже прочитаны системами этого тика
        drain_events::<TriggerIntent>(&mut app);
        drain_events::<ReloadIntent>(&mut app);
        drain_events::<ReloadStarted>(&mut app);

        for shot in drain_events::<ShotFired>(&mut app) {
            if let Some(stats) = range.get_mut(&shot.shooter) {
                stats.shots += 1;
            }
        }

        for loaded in drain_events::<RoundsLoaded>(&mut app) {
            if let Some(stats) = range.get_mut(&loaded.shooter) {
                stats.rounds_loaded += loaded.rounds;
            }
        }

        for interrupted in drain_events::<ReloadInterrupted>(&mut app) {
            if let Some(stats) = range.get_mut(&interrupted.shooter) {
                stats.interrupted += 1;
            }
        }

        for rejected in drain_events::<FireRejected>(&mut app) {
            if let Some(stats) = range.get_mut(&rejected.shooter) {
                *stats.rejected.entry(rejected.reason.as_str().to_string()).or_default() += 1;
            }
            if rejected.reason == FailureReason::OutOfAmmo {
                app.world_mut().send_event(ReloadIntent {
                    shooter: rejected.shooter,
                });
            }
        }

        for completed in drain_events::<ReloadCompleted>(&mut app) {
            if let Some(stats) = range.get_mut(&completed.shooter) {
                stats.reloads += 1;
            }
        }

        if tick % 100 == 0 {
            log_info(&format!("Tick {}: {} weapons on the range", tick, range.len()));
        }
    }

    println!("Range summary after {} ticks:", TICKS);
    for stats in range.values() {
        println!(
            "  {:<22} shots: {:>4}  reloads: {:>2} (+{} rounds, {} interrupted)  rejected: {:?}",
            stats.name, stats.shots, stats.reloads, stats.rounds_loaded, stats.interrupted, stats.rejected
        );
    }
    println!("Simulation complete!");
}
