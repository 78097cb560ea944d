//! Firearm simulation module
//!
//! Core (без ECS логики, тестируется напрямую):
//! - `WeaponStateMachine`: trigger gating, reload, volleys
//! - `HeatModel`, `AmmoStore`, `ReloadProtocol`, `FireRateScheduler`
//! - spread/recoil: чистые функции
//!
//! ECS слой (тонкий, только маршрутизация):
//! - Intents: TriggerIntent, ReloadIntent, CancelReloadIntent, CycleFireModeIntent
//! - Results: ShotFired, FireRejected, Reload*, FireModeChanged
//!
//! Host (engine, rendering, inventory) спавнит projectiles по `ShotFired`.

use bevy::prelude::*;

pub mod ammo;
pub mod attachment;
pub mod components;
pub mod definitions;
pub mod error;
pub mod events;
pub mod fire_rate;
pub mod heat;
pub mod machine;
pub mod outcome;
pub mod reload;
pub mod spread;
pub mod stats;
pub mod systems;

#[cfg(test)]
mod reload_tests;

// Re-export основных типов
pub use ammo::{AmmoModifiers, AmmoStore};
pub use attachment::{Attachment, AttachmentModifiers, AttachmentSlot, Barrel};
pub use components::{ShooterInput, TriggerState};
pub use definitions::{BarrelTemplate, WeaponDefinition, WeaponDefinitions, WeaponId};
pub use error::{FirearmError, FirearmResult};
pub use events::{
    CancelReloadIntent, CycleFireModeIntent, FireModeChanged, FireRejected, InterruptCause, ReloadCompleted,
    ReloadIntent, ReloadInterrupted, ReloadStarted, RoundsLoaded, ShotFired, TriggerIntent,
};
pub use fire_rate::{tick_duration_ms, FireRateScheduler};
pub use heat::{HeatModel, HeatStats};
pub use machine::{CooldownGating, Volley, VolleyShot, WeaponStateMachine};
pub use outcome::{FailureReason, FireOutcome, WeaponState};
pub use reload::{CustomReload, ReloadProgress, ReloadProtocol};
pub use spread::{current_spread, recoil, shot_direction, Orientation, Recoil, ShotInput, Stance};
pub use stats::{FireMode, FirearmClass, FirearmType, ReloadMethod, WeaponStats};

/// Firearm Plugin
///
/// Регистрирует firearm системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. advance_clock: SimulationClock += fixed timestep
/// 2. apply_config_defaults: gating из config для новых оружий
/// 3. process_cancel_reload_intents, interrupt_reload_on_movement: отмены до tick
/// 4. tick_firearms: cooling, reload progress, budget refill
/// 5. process_reload_intents, process_fire_mode_intents
/// 6. process_trigger_intents: press → volley
/// 7. fire_held_triggers: FullAuto hold, продолжение burst
pub struct FirearmPlugin;

impl Plugin for FirearmPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<TriggerIntent>()
            .add_event::<ReloadIntent>()
            .add_event::<CancelReloadIntent>()
            .add_event::<CycleFireModeIntent>()
            .add_event::<ShotFired>()
            .add_event::<FireRejected>()
            .add_event::<ReloadStarted>()
            .add_event::<RoundsLoaded>()
            .add_event::<ReloadCompleted>()
            .add_event::<ReloadInterrupted>()
            .add_event::<FireModeChanged>();

        app.init_resource::<crate::SimulationClock>()
            .init_resource::<crate::config::SimulationConfig>()
            .init_resource::<WeaponDefinitions>();

        // Регистрация систем в FixedUpdate
        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: время
                crate::advance_clock,
                systems::apply_config_defaults,

                // Фаза 2: внешние отмены перезарядки
                systems::process_cancel_reload_intents,
                systems::interrupt_reload_on_movement,

                // Фаза 3: tick (cooling, reload, budget)
                systems::tick_firearms,

                // Фаза 4: reload / selector intents
                systems::process_reload_intents,
                systems::process_fire_mode_intents,

                // Фаза 5: стрельба
                systems::process_trigger_intents,
                systems::fire_held_triggers,
            )
                .chain(), // Последовательное выполнение
        );
    }
}
