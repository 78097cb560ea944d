//! Weapon definitions registry (stats provider)
//!
//! **WeaponDefinition**: статические данные оружия:
//! - `WeaponStats` + опциональный barrel (heat) + загружаемый по умолчанию тип патрона
//! - Хранится в `WeaponDefinitions` resource (HashMap lookup)
//! - Создаются hardcoded в `WeaponDefinitions::default()`; host может
//!   добавить свои через `add()` (например, после serde загрузки)
//!
//! **WeaponStateMachine**: runtime экземпляр, создаётся через `instantiate()`.
//!
//! # Пример использования
//!
//! ```rust
//! use gunwright_simulation::firearm::{WeaponDefinitions, WeaponId};
//!
//! let definitions = WeaponDefinitions::default();
//! let weapon = definitions.instantiate(&WeaponId::from("revolver"), 60.0).unwrap();
//! assert_eq!(weapon.ammo().capacity(), 6);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ammo::AmmoModifiers;
use super::attachment::{AttachmentModifiers, Barrel};
use super::error::{FirearmError, FirearmResult};
use super::heat::HeatStats;
use super::machine::WeaponStateMachine;
use super::stats::{FirearmType, WeaponStats};

// ============================================================================
// WeaponId
// ============================================================================

/// Unique weapon definition ID
///
/// Примеры: "pistol_basic", "assault_rifle", "revolver"
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub struct WeaponId(pub String);

impl From<&str> for WeaponId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for WeaponId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// WeaponDefinition
// ============================================================================

/// Barrel template (heat numbers + multipliers)
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct BarrelTemplate {
    pub name: String,
    #[serde(default)]
    pub modifiers: AttachmentModifiers,
    #[serde(default)]
    pub heat: HeatStats,
}

impl BarrelTemplate {
    pub fn to_barrel(&self) -> Barrel {
        Barrel::new(self.name.clone(), self.modifiers, self.heat)
    }
}

/// Immutable weapon definition
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponDefinition {
    pub id: WeaponId,
    pub stats: WeaponStats,
    /// Barrel, установленный при создании (None: без heat/jam)
    #[serde(default)]
    pub barrel: Option<BarrelTemplate>,
    /// Тип патрона, заряженный при создании
    #[serde(default)]
    pub ammo: AmmoModifiers,
}

impl WeaponDefinition {
    pub fn new(id: impl Into<String>, stats: WeaponStats) -> Self {
        Self {
            id: WeaponId(id.into()),
            stats,
            barrel: None,
            ammo: AmmoModifiers::default(),
        }
    }

    pub fn with_barrel(mut self, barrel: BarrelTemplate) -> Self {
        self.barrel = Some(barrel);
        self
    }

    pub fn with_ammo(mut self, ammo: AmmoModifiers) -> Self {
        self.ammo = ammo;
        self
    }
}

// ============================================================================
// WeaponDefinitions (Resource)
// ============================================================================

/// Weapon definitions lookup table (resource)
#[derive(Resource, Clone, Debug)]
pub struct WeaponDefinitions {
    definitions: HashMap<WeaponId, WeaponDefinition>,
}

impl WeaponDefinitions {
    /// Создать пустой registry
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Получить definition по ID
    pub fn get(&self, id: &WeaponId) -> Option<&WeaponDefinition> {
        self.definitions.get(id)
    }

    /// Добавить definition (валидирует stats, barrel и ammo заранее)
    pub fn add(&mut self, definition: WeaponDefinition) -> FirearmResult<()> {
        definition.stats.validate()?;
        if let Some(barrel) = &definition.barrel {
            barrel.to_barrel().validate()?;
        }
        definition.ammo.validate()?;
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Получить все IDs (sorted, для детерминированного обхода)
    pub fn all_ids(&self) -> Vec<&WeaponId> {
        let mut ids: Vec<&WeaponId> = self.definitions.keys().collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }

    /// IDs по типу оружия
    pub fn ids_of_type(&self, firearm_type: FirearmType) -> Vec<&WeaponId> {
        self.all_ids()
            .into_iter()
            .filter(|id| {
                self.definitions
                    .get(*id)
                    .is_some_and(|def| def.stats.firearm_type == firearm_type)
            })
            .collect()
    }

    /// Создать runtime экземпляр оружия по definition
    pub fn instantiate(&self, id: &WeaponId, tick_rate_hz: f64) -> FirearmResult<WeaponStateMachine> {
        let definition = self
            .get(id)
            .ok_or_else(|| FirearmError::UnknownWeapon(id.clone()))?;

        let mut weapon = WeaponStateMachine::new(definition.stats.clone(), tick_rate_hz)?;
        if let Some(barrel) = &definition.barrel {
            weapon.attach_barrel(barrel.to_barrel())?;
        }
        weapon.load_ammo_type(definition.ammo.clone())?;
        Ok(weapon)
    }
}

impl Default for WeaponDefinitions {
    /// Hardcoded definitions (базовые presets)
    fn default() -> Self {
        let mut definitions = HashMap::new();

        let presets = [
            WeaponDefinition::new("pistol_basic", WeaponStats::pistol()),
            WeaponDefinition::new("assault_rifle", WeaponStats::assault_rifle()).with_barrel(BarrelTemplate {
                name: "Rifle Barrel".to_string(),
                modifiers: AttachmentModifiers::default(),
                heat: HeatStats::default(),
            }),
            WeaponDefinition::new("revolver", WeaponStats::revolver()),
            WeaponDefinition::new("bolt_rifle", WeaponStats::bolt_rifle()),
            WeaponDefinition::new("shotgun", WeaponStats::shotgun()).with_ammo(AmmoModifiers {
                name: "buckshot".to_string(),
                spread_mod: 1.2,
                velocity_mod: 0.9,
                damage_mod: 1.0,
            }),
            // Minigun: единственный preset с heat tracking
            WeaponDefinition::new("minigun", WeaponStats::minigun()).with_barrel(BarrelTemplate {
                name: "Rotary Barrel Cluster".to_string(),
                modifiers: AttachmentModifiers::default(),
                heat: HeatStats {
                    overheat_enabled: true,
                    heat_max: 100.0,
                    heat_per_shot: 1.0,
                    cool_off_speed: 20.0,
                    cool_off_delay_ms: 500.0,
                },
            }),
        ];

        // Presets валидны по построению (см. stats tests), insert без validate
        for definition in presets {
            definitions.insert(definition.id.clone(), definition);
        }

        Self { definitions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets_present() {
        let defs = WeaponDefinitions::default();
        let ids: Vec<&str> = defs.all_ids().iter().map(|id| id.0.as_str()).collect();
        assert_eq!(
            ids,
            vec!["assault_rifle", "bolt_rifle", "minigun", "pistol_basic", "revolver", "shotgun"]
        );
    }

    #[test]
    fn test_unknown_weapon() {
        let defs = WeaponDefinitions::default();
        let err = defs.instantiate(&"railgun".into(), 60.0).unwrap_err();
        assert_eq!(err, FirearmError::UnknownWeapon("railgun".into()));
    }

    #[test]
    fn test_add_rejects_invalid_stats() {
        let mut defs = WeaponDefinitions::new();
        let broken = WeaponDefinition::new(
            "broken",
            WeaponStats {
                rpm: 0.0,
                ..WeaponStats::pistol()
            },
        );
        assert!(defs.add(broken).is_err());
        assert!(defs.get(&"broken".into()).is_none());
    }

    #[test]
    fn test_add_rejects_non_finite_modifiers() {
        let mut defs = WeaponDefinitions::new();

        let bad_ammo = WeaponDefinition::new("bad_ammo", WeaponStats::shotgun()).with_ammo(AmmoModifiers {
            spread_mod: f64::INFINITY,
            ..AmmoModifiers::default()
        });
        assert!(matches!(
            defs.add(bad_ammo),
            Err(FirearmError::InvalidStats { field: "spread_mod", .. })
        ));

        let bad_barrel = WeaponDefinition::new("bad_barrel", WeaponStats::pistol()).with_barrel(BarrelTemplate {
            name: "Cursed Barrel".to_string(),
            modifiers: AttachmentModifiers {
                recoil: f64::NAN,
                ..AttachmentModifiers::default()
            },
            heat: HeatStats::default(),
        });
        assert!(matches!(
            defs.add(bad_barrel),
            Err(FirearmError::InvalidStats { field: "recoil", .. })
        ));

        assert!(defs.all_ids().is_empty());
    }

    #[test]
    fn test_instantiate_attaches_barrel_and_ammo() {
        let defs = WeaponDefinitions::default();

        let minigun = defs.instantiate(&"minigun".into(), 60.0).unwrap();
        assert!(minigun.barrel().is_some_and(|b| b.heat.stats().overheat_enabled));

        let shotgun = defs.instantiate(&"shotgun".into(), 60.0).unwrap();
        assert_eq!(shotgun.ammo_modifiers().name, "buckshot");
        assert!(shotgun.barrel().is_none());
    }

    #[test]
    fn test_ids_of_type() {
        let defs = WeaponDefinitions::default();
        let revolvers = defs.ids_of_type(FirearmType::Revolver);
        assert_eq!(revolvers, vec![&WeaponId::from("revolver")]);
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let json = r#"{ "id": "custom_smg", "stats": { "name": "SMG", "rpm": 900.0, "capacity": 32, "fire_mode": "FullAuto" } }"#;
        let def: WeaponDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.id, WeaponId::from("custom_smg"));
        assert_eq!(def.stats.rpm, 900.0);
        assert_eq!(def.stats.reload_time, WeaponStats::pistol().reload_time);
        assert!(def.barrel.is_none());
        assert_eq!(def.ammo, AmmoModifiers::default());

        let mut defs = WeaponDefinitions::new();
        assert!(defs.add(def).is_ok());
    }
}
