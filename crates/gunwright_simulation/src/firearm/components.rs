//! ECS components рядом с `WeaponStateMachine`

use bevy::prelude::*;

use super::spread::ShotInput;

/// Текущие orientation/stance/aim стрелка (host пишет каждый тик)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShooterInput(pub ShotInput);

/// Trigger held state (меняется только через `TriggerIntent`)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerState {
    pub held: bool,
}
