//! Weapon attachments
//!
//! Каждое attachment: набор множителей (recoil, spread, damage, noise).
//! Barrel отдельный attachment, помимо множителей несёт `HeatModel` (heat, jam).
//! Множители всех установленных attachments перемножаются.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ensure_in_range, FirearmResult};
use super::heat::{HeatModel, HeatStats};

/// Верхняя граница любого множителя (attachments и ammo)
pub const MAX_MODIFIER: f64 = 100.0;

/// Mount point on the weapon. Один attachment на слот.
/// Barrel не слот, а отдельное поле оружия (`Barrel`), т.к. несёт heat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum AttachmentSlot {
    Muzzle,
    Optic,
    Underbarrel,
    Stock,
    Grip,
}

/// Multipliers, 1.0 = no effect
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentModifiers {
    pub recoil: f64,
    pub spread: f64,
    pub damage: f64,
    pub noise: f64,
}

impl Default for AttachmentModifiers {
    fn default() -> Self {
        Self {
            recoil: 1.0,
            spread: 1.0,
            damage: 1.0,
            noise: 1.0,
        }
    }
}

impl AttachmentModifiers {
    /// Каждый множитель finite и в `0..=MAX_MODIFIER`
    pub fn validate(&self) -> FirearmResult<()> {
        ensure_in_range("recoil", self.recoil, 0.0, MAX_MODIFIER)?;
        ensure_in_range("spread", self.spread, 0.0, MAX_MODIFIER)?;
        ensure_in_range("damage", self.damage, 0.0, MAX_MODIFIER)?;
        ensure_in_range("noise", self.noise, 0.0, MAX_MODIFIER)
    }

    /// Покомпонентное произведение
    pub fn combine(self, other: Self) -> Self {
        Self {
            recoil: self.recoil * other.recoil,
            spread: self.spread * other.spread,
            damage: self.damage * other.damage,
            noise: self.noise * other.noise,
        }
    }
}

/// Non-barrel attachment (suppressor, scope, grip, ...)
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub slot: AttachmentSlot,
    #[serde(default)]
    pub modifiers: AttachmentModifiers,
}

impl Attachment {
    pub fn new(name: impl Into<String>, slot: AttachmentSlot, modifiers: AttachmentModifiers) -> Self {
        Self {
            name: name.into(),
            slot,
            modifiers,
        }
    }

    /// Глушитель: тише, чуть меньше отдача
    pub fn suppressor() -> Self {
        Self::new(
            "Suppressor",
            AttachmentSlot::Muzzle,
            AttachmentModifiers {
                recoil: 0.9,
                noise: 0.3,
                ..default()
            },
        )
    }

    pub fn foregrip() -> Self {
        Self::new(
            "Foregrip",
            AttachmentSlot::Underbarrel,
            AttachmentModifiers {
                recoil: 0.8,
                spread: 0.9,
                ..default()
            },
        )
    }
}

/// Barrel attachment: modifiers + heat state
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Barrel {
    pub name: String,
    pub modifiers: AttachmentModifiers,
    pub heat: HeatModel,
}

impl Barrel {
    pub fn new(name: impl Into<String>, modifiers: AttachmentModifiers, heat: HeatStats) -> Self {
        Self {
            name: name.into(),
            modifiers,
            heat: HeatModel::new(heat),
        }
    }

    /// Стандартный ствол без overheat (только jam)
    pub fn standard() -> Self {
        Self::new("Standard Barrel", AttachmentModifiers::default(), HeatStats::default())
    }

    /// Modifiers + heat numbers
    pub fn validate(&self) -> FirearmResult<()> {
        self.modifiers.validate()?;
        self.heat.stats().validate()
    }

    /// Heavy barrel with heat tracking (для пулемётов)
    pub fn heavy(heat: HeatStats) -> Self {
        Self::new(
            "Heavy Barrel",
            AttachmentModifiers {
                spread: 0.85,
                ..default()
            },
            heat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_combine_multiplicatively() {
        let combined = Attachment::suppressor()
            .modifiers
            .combine(Attachment::foregrip().modifiers);

        assert!((combined.recoil - 0.72).abs() < 1e-9);
        assert!((combined.spread - 0.9).abs() < 1e-9);
        assert_eq!(combined.damage, 1.0);
        assert!((combined.noise - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_default_modifiers_are_neutral() {
        let neutral = AttachmentModifiers::default();
        let custom = AttachmentModifiers {
            recoil: 0.5,
            ..default()
        };
        assert_eq!(neutral.combine(custom), custom);
    }

    #[test]
    fn test_invalid_modifiers_rejected() {
        let infinite_spread = AttachmentModifiers {
            spread: f64::INFINITY,
            ..default()
        };
        let negative_recoil = AttachmentModifiers {
            recoil: -1.0,
            ..default()
        };
        let nan_noise = AttachmentModifiers {
            noise: f64::NAN,
            ..default()
        };

        assert!(AttachmentModifiers::default().validate().is_ok());
        assert!(infinite_spread.validate().is_err());
        assert!(negative_recoil.validate().is_err());
        assert!(nan_noise.validate().is_err());
    }

    #[test]
    fn test_barrel_validates_heat() {
        let barrel = Barrel::heavy(HeatStats {
            cool_off_speed: f64::NAN,
            ..HeatStats::tracked()
        });
        assert!(barrel.validate().is_err());
        assert!(Barrel::standard().validate().is_ok());
    }

    #[test]
    fn test_heavy_barrel_tracks_heat() {
        let barrel = Barrel::heavy(HeatStats::tracked());
        assert!(barrel.heat.stats().overheat_enabled);
        assert_eq!(barrel.heat.heat(), 0.0);
    }
}
