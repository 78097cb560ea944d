//! Trigger result types

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::spread::Recoil;

/// Why a trigger pull did not fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum FailureReason {
    OutOfAmmo,
    OnCooldown,
    Reloading,
    Overheated,
    Jammed,
    Disabled,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::OutOfAmmo => "out of ammo",
            FailureReason::OnCooldown => "on cooldown",
            FailureReason::Reloading => "reloading",
            FailureReason::Overheated => "overheated",
            FailureReason::Jammed => "jammed",
            FailureReason::Disabled => "disabled",
        }
    }
}

/// Result of one `trigger()` evaluation
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum FireOutcome {
    /// Shot fired. `spread` в градусах (после всех модификаторов).
    Success { recoil: Recoil, spread: f64 },
    Failure { reason: FailureReason },
}

impl FireOutcome {
    pub fn failure(reason: FailureReason) -> Self {
        FireOutcome::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FireOutcome::Success { .. })
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            FireOutcome::Failure { reason } => Some(*reason),
            FireOutcome::Success { .. } => None,
        }
    }
}

/// Derived (never stored) weapon state, для HUD/AI host'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum WeaponState {
    Ready,
    OnCooldown,
    Reloading,
    OutOfAmmo,
    Overheated,
    Jammed,
    Disabled,
}
