//! Gunwright Simulation Core
//!
//! Tick-based симуляция огнестрельного оружия на Bevy 0.16:
//! стрельба, перезарядка, нагрев ствола, отдача и разброс.
//!
//! - `firearm`: core state machine + ECS слой (FirearmPlugin)
//! - `config`: SimulationConfig resource
//! - `logger`: глобальный leveled logger
//!
//! Host (engine, rendering, inventory, UI) внешний, шлёт intents,
//! получает `ShotFired` / `FireRejected` / reload events.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod config;
pub mod firearm;
pub mod logger;

// Re-export базовых типов для удобства
pub use config::SimulationConfig;
pub use firearm::{
    FailureReason, FireOutcome, FirearmError, FirearmPlugin, FirearmResult, ShotFired, ShotInput, WeaponDefinitions,
    WeaponId, WeaponStateMachine, WeaponStats,
};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};

/// Главный plugin симуляции
///
/// Читает `SimulationConfig` (если host вставил его до plugin'а) и настраивает
/// fixed timestep, RNG и уровень логов.
pub struct FirearmSimulationPlugin;

impl Plugin for FirearmSimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<SimulationConfig>()
            .cloned()
            .unwrap_or_default();

        set_log_level(config.log_level);

        app
            // Fixed timestep = tick rate из config
            .insert_resource(Time::<Fixed>::from_hz(config.tick_rate_hz))
            // Детерминистичный RNG (seed из config)
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(config)
            .add_plugins(FirearmPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Simulation clock: `now` считается от номера тика, а не от real time
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationClock {
    /// Fixed ticks elapsed
    pub tick: u64,
    /// Start of the current tick (ms)
    pub now_ms: f64,
    /// Tick length (seconds)
    pub dt_secs: f64,
}

/// System: SimulationClock += один fixed tick
pub fn advance_clock(mut clock: ResMut<SimulationClock>, time: Res<Time<Fixed>>) {
    let dt_secs = time.timestep().as_secs_f64();
    clock.now_ms = clock.tick as f64 * dt_secs * 1000.0;
    clock.dt_secs = dt_secs;
    clock.tick += 1;
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SimulationConfig::with_seed(seed))
        .add_plugins(FirearmSimulationPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
