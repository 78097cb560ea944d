//! Construction-time errors
//!
//! Runtime fire conditions (out of ammo, cooldown, ...) are NOT errors -
//! they come back as `FailureReason` inside `FireOutcome`.
//! Здесь только то, что ловится при создании оружия (fail fast at load time).

use thiserror::Error;

use super::definitions::WeaponId;

/// Errors raised while building a weapon from its definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FirearmError {
    /// A stats field is outside its valid range.
    #[error("Invalid weapon stats: `{field}` {reason}")]
    InvalidStats {
        field: &'static str,
        reason: String,
    },

    /// Definition uses `ReloadMethod::Other` but no `CustomReload` was supplied.
    #[error("Weapon `{weapon}` uses a custom reload method but no implementation was provided")]
    UnimplementedReload { weapon: String },

    /// Stats provider has no definition for this id.
    #[error("Unknown weapon id: {0:?}")]
    UnknownWeapon(WeaponId),
}

impl FirearmError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidStats {
            field,
            reason: reason.into(),
        }
    }
}

/// Finite и в `min..=max`, иначе `InvalidStats` для `field`
pub(crate) fn ensure_in_range(field: &'static str, value: f64, min: f64, max: f64) -> FirearmResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FirearmError::invalid(
            field,
            format!("must be a finite value in {}..={} (got {})", min, max, value),
        ))
    }
}

/// Result type for weapon construction.
pub type FirearmResult<T> = Result<T, FirearmError>;
