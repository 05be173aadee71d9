//! Immutable, validated game definition.
//!
//! A [`GameModel`] is built by [`crate::validate::validate_game_model`] and
//! shared read-only across every player instance. Definitions keep their
//! declaration order so client payloads render deterministically.

use std::collections::BTreeMap;

use crate::instance::GameInstance;
use crate::state::{ResourceAmounts, Snapshot};

/// A resource players accumulate. `maximum: None` means unbounded.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: String,
    pub description: String,
    pub maximum: Option<f64>,
}

/// Gating condition for a building or upgrade. Empty requirement is always met.
#[derive(Debug, Clone, Default)]
pub struct Unlock {
    /// Minimum owned count per building name.
    pub buildings: BTreeMap<String, u64>,
    /// Upgrades that must already be owned.
    pub upgrades: Vec<String>,
}

/// A repeatable purchase that produces income and/or storage.
#[derive(Debug, Clone)]
pub struct BuildingDef {
    pub name: String,
    pub description: String,
    pub unlock: Unlock,
    /// Cost of the first unit; unit `k` costs `cost * cost_factor^k`.
    pub cost: ResourceAmounts,
    pub cost_factor: f64,
    /// Income per owned unit, per second.
    pub income: ResourceAmounts,
    /// Capacity added to a resource's maximum per owned unit.
    pub storage: ResourceAmounts,
}

/// Multipliers an upgrade applies to one building, keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct UpgradeEffect {
    pub cost: ResourceAmounts,
    pub income: ResourceAmounts,
}

/// A one-time purchase that permanently modifies buildings.
#[derive(Debug, Clone)]
pub struct UpgradeDef {
    pub name: String,
    pub description: String,
    pub unlock: Unlock,
    pub cost: ResourceAmounts,
    /// Effects per affected building name.
    pub buildings: BTreeMap<String, UpgradeEffect>,
}

/// The full validated game definition plus the starting snapshot.
#[derive(Debug, Clone)]
pub struct GameModel {
    pub name: String,
    pub description: String,
    resources: Vec<ResourceDef>,
    buildings: Vec<BuildingDef>,
    upgrades: Vec<UpgradeDef>,
    pub new_game: Snapshot,
}

impl GameModel {
    /// Assemble a model from already-checked parts. Callers outside the
    /// validator must guarantee referential integrity themselves.
    pub fn from_parts(
        name: String,
        description: String,
        resources: Vec<ResourceDef>,
        buildings: Vec<BuildingDef>,
        upgrades: Vec<UpgradeDef>,
        new_game: Snapshot,
    ) -> Self {
        Self {
            name,
            description,
            resources,
            buildings,
            upgrades,
            new_game,
        }
    }

    /// Resource definitions in declaration order.
    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    /// Building definitions in declaration order.
    pub fn buildings(&self) -> &[BuildingDef] {
        &self.buildings
    }

    /// Upgrade definitions in declaration order.
    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDef> {
        self.resources.iter().find(|def| def.name == name)
    }

    pub fn building(&self, name: &str) -> Option<&BuildingDef> {
        self.buildings.iter().find(|def| def.name == name)
    }

    pub fn upgrade(&self, name: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|def| def.name == name)
    }

    /// Bind a persisted snapshot to this model as a live instance.
    ///
    /// The snapshot is not re-validated: entries naming things the model
    /// does not define are carried but inert, and missing entries behave
    /// as zero/default. A first-time player passes `Snapshot::default()`
    /// or [`GameModel::new_game`].
    pub fn load_game_instance(&self, snapshot: &Snapshot, as_of: f64) -> GameInstance<'_> {
        GameInstance::new(self, snapshot, as_of)
    }
}
