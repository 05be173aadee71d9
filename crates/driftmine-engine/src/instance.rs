//! Per-player simulation: income accrual, derived values, and purchases.
//!
//! A [`GameInstance`] binds one player snapshot to a shared [`GameModel`]
//! for the duration of a single request. Every external operation advances
//! time first, then returns a `(Snapshot, ClientState)` pair for the caller
//! to persist and display. Rejected purchases (unknown name, locked,
//! unaffordable, already owned) are silent no-ops that still return the
//! time-advanced state, so a stale client never causes a hard failure.

use std::collections::{BTreeMap, BTreeSet};

use crate::decay::effective_seconds;
use crate::model::{GameModel, Unlock, UpgradeEffect};
use crate::state::{
    ClientBuilding, ClientResource, ClientState, ClientUpgrade, ResourceAmounts, Snapshot,
};

/// Tracked state of one resource: amount plus recompute-derived values.
#[derive(Debug, Clone, Default)]
struct ResourceState {
    owned: f64,
    income: f64,
    maximum: Option<f64>,
}

/// Tracked state of one building: count plus recompute-derived values.
#[derive(Debug, Clone, Default)]
struct BuildingState {
    owned: u64,
    cost: ResourceAmounts,
    income: ResourceAmounts,
    storage: ResourceAmounts,
}

/// A live player state bound to its model.
///
/// Instances are transient: load one from a snapshot, run operations,
/// persist the snapshot the operations return, discard the instance.
#[derive(Debug)]
pub struct GameInstance<'a> {
    model: &'a GameModel,
    time: f64,
    resources: BTreeMap<String, ResourceState>,
    buildings: BTreeMap<String, BuildingState>,
    upgrades: BTreeSet<String>,
}

impl<'a> GameInstance<'a> {
    pub(crate) fn new(model: &'a GameModel, snapshot: &Snapshot, as_of: f64) -> Self {
        let resources = snapshot
            .resources
            .iter()
            .map(|(name, owned)| {
                let state = ResourceState {
                    owned: *owned,
                    income: 0.0,
                    maximum: model.resource(name).and_then(|def| def.maximum),
                };
                (name.clone(), state)
            })
            .collect();
        let buildings = snapshot
            .buildings
            .iter()
            .map(|(name, owned)| {
                let state = BuildingState {
                    owned: *owned,
                    ..BuildingState::default()
                };
                (name.clone(), state)
            })
            .collect();
        Self {
            model,
            time: as_of,
            resources,
            buildings,
            upgrades: snapshot.upgrades.iter().cloned().collect(),
        }
    }

    /// Advance to `now` and report the state.
    pub fn get_current_state(&mut self, now: f64) -> (Snapshot, ClientState) {
        self.fast_forward(now);
        (self.save_state(), self.client_state())
    }

    /// Advance to `now`, then buy `count` more of `building` if it exists,
    /// is unlocked, and the total cost is affordable. Rejection is silent.
    pub fn purchase_building(
        &mut self,
        now: f64,
        building: &str,
        count: u64,
    ) -> (Snapshot, ClientState) {
        self.fast_forward(now);
        let model = self.model;
        if let Some(def) = model.building(building) {
            if self.requirement_is_met(&def.unlock) {
                let cost = self.cost_of_building(building, count);
                if self.can_afford(&cost) {
                    self.pay(&cost);
                    self.acquire_building(building, count);
                    self.calculate_values();
                }
            }
        }
        (self.save_state(), self.client_state())
    }

    /// Advance to `now`, then buy `upgrade` once if it exists, is not
    /// already owned, is unlocked, and is affordable. Rejection is silent.
    pub fn purchase_upgrade(&mut self, now: f64, upgrade: &str) -> (Snapshot, ClientState) {
        self.fast_forward(now);
        let model = self.model;
        if let Some(def) = model.upgrade(upgrade) {
            if !self.upgrades.contains(upgrade)
                && self.requirement_is_met(&def.unlock)
                && self.can_afford(&def.cost)
            {
                self.pay(&def.cost);
                self.acquire_upgrade(upgrade);
                self.calculate_values();
            }
        }
        (self.save_state(), self.client_state())
    }

    /// Recompute every derived value from the model, owned upgrades, and
    /// owned building counts. Runs before each time advance and after each
    /// successful purchase.
    pub fn calculate_values(&mut self) {
        let model = self.model;

        // reset tracked buildings to their model base values
        for (name, building) in &mut self.buildings {
            let Some(def) = model.building(name) else {
                continue; // snapshot entry the model no longer defines
            };
            building.cost = def.cost.clone();
            building.income = def.income.clone();
            building.storage = def.storage.clone();
        }

        // apply upgrade multipliers; order is irrelevant since they commute
        for upgrade in &self.upgrades {
            let Some(def) = model.upgrade(upgrade) else {
                continue;
            };
            for (name, effect) in &def.buildings {
                let Some(building) = self.buildings.get_mut(name) else {
                    continue;
                };
                apply_multipliers(&mut building.cost, &effect.cost);
                apply_multipliers(&mut building.income, &effect.income);
            }
        }

        // resource income and maximum start from the model's declarations
        for (name, resource) in &mut self.resources {
            resource.income = 0.0;
            resource.maximum = model.resource(name).and_then(|def| def.maximum);
        }

        // accumulate storage and income contributions of owned buildings
        let mut storage_gains = Vec::new();
        let mut income_gains = Vec::new();
        for building in self.buildings.values() {
            if building.owned == 0 {
                continue;
            }
            let owned = building.owned as f64;
            for (resource, per_unit) in &building.storage {
                storage_gains.push((resource.clone(), per_unit * owned));
            }
            for (resource, per_unit) in &building.income {
                income_gains.push((resource.clone(), per_unit * owned));
            }
        }
        for (resource, amount) in storage_gains {
            self.acquire_storage(&resource, amount);
        }
        for (resource, amount) in income_gains {
            self.acquire_income(&resource, amount);
        }
    }

    /// Recompute derived values, then accrue income for the effective
    /// seconds between the instance's as-of time and `now`.
    pub fn fast_forward(&mut self, now: f64) {
        self.calculate_values();
        let seconds = effective_seconds(now - self.time);
        for resource in self.resources.values_mut() {
            resource.owned += resource.income * seconds;
            if let Some(maximum) = resource.maximum {
                resource.owned = resource.owned.min(maximum);
            }
            resource.owned = resource.owned.max(0.0);
        }
        self.time = now;
    }

    /// Total cost of buying `count` more of `building`, given the units
    /// already owned: unit `k` costs `base * cost_factor^k`. Summed
    /// directly; purchase counts are small.
    pub fn cost_of_building(&self, building: &str, count: u64) -> ResourceAmounts {
        let Some(def) = self.model.building(building) else {
            return ResourceAmounts::new();
        };
        let owned = self.owned_buildings(building);
        let base = match self.buildings.get(building) {
            Some(state) => state.cost.clone(),
            None => self.upgraded_values(building, &def.cost, |effect| &effect.cost),
        };
        let mut total = ResourceAmounts::new();
        for (resource, amount) in &base {
            let mut sum = 0.0;
            for unit in owned..owned + count {
                sum += amount * def.cost_factor.powi(unit as i32);
            }
            total.insert(resource.clone(), sum);
        }
        total
    }

    /// True when every building count and owned upgrade the requirement
    /// names is satisfied. Untracked buildings count as zero.
    pub fn requirement_is_met(&self, unlock: &Unlock) -> bool {
        unlock
            .buildings
            .iter()
            .all(|(building, count)| self.owned_buildings(building) >= *count)
            && unlock
                .upgrades
                .iter()
                .all(|upgrade| self.upgrades.contains(upgrade))
    }

    /// Add `amount` (may be negative) to a resource, clamped into
    /// `[0, maximum]`. Creates the tracked entry on first touch.
    pub fn acquire_resource(&mut self, resource: &str, amount: f64) {
        let state = self.tracked_resource(resource);
        state.owned += amount;
        if let Some(maximum) = state.maximum {
            state.owned = state.owned.min(maximum);
        }
        state.owned = state.owned.max(0.0);
    }

    /// Raise a resource's effective maximum. No effect on uncapped resources.
    pub fn acquire_storage(&mut self, resource: &str, amount: f64) {
        let state = self.tracked_resource(resource);
        if let Some(maximum) = &mut state.maximum {
            *maximum += amount;
        }
    }

    /// Add to a resource's current income rate.
    pub fn acquire_income(&mut self, resource: &str, amount: f64) {
        self.tracked_resource(resource).income += amount;
    }

    /// Increment a building's owned count without charging for it.
    /// Callers recompute derived values afterwards.
    pub fn acquire_building(&mut self, building: &str, count: u64) {
        self.buildings.entry(building.to_string()).or_default().owned += count;
    }

    /// Add an upgrade to the owned set without charging for it.
    pub fn acquire_upgrade(&mut self, upgrade: &str) {
        self.upgrades.insert(upgrade.to_string());
    }

    /// Boil the state down to its minimal persisted form: zero-owned
    /// resources and zero-count buildings are dropped.
    pub fn save_state(&self) -> Snapshot {
        Snapshot {
            resources: self
                .resources
                .iter()
                .filter(|(_, state)| state.owned != 0.0)
                .map(|(name, state)| (name.clone(), state.owned))
                .collect(),
            buildings: self
                .buildings
                .iter()
                .filter(|(_, state)| state.owned != 0)
                .map(|(name, state)| (name.clone(), state.owned))
                .collect(),
            upgrades: self.upgrades.iter().cloned().collect(),
        }
    }

    /// Everything the front end renders, in model declaration order.
    /// Locked buildings and upgrades are hidden until their requirement is
    /// met; resources appear once the player holds or produces them.
    pub fn client_state(&self) -> ClientState {
        let resources = self
            .model
            .resources()
            .iter()
            .filter_map(|def| {
                let state = self.resources.get(&def.name)?;
                if state.owned == 0.0 && state.income == 0.0 {
                    return None;
                }
                if state.maximum == Some(0.0) {
                    return None;
                }
                Some(ClientResource {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    owned: state.owned,
                    income: state.income,
                    maximum: state.maximum,
                })
            })
            .collect();

        let buildings = self
            .model
            .buildings()
            .iter()
            .filter_map(|def| {
                let owned = self.owned_buildings(&def.name);
                if owned == 0 && !self.requirement_is_met(&def.unlock) {
                    return None;
                }
                let income = match self.buildings.get(&def.name) {
                    Some(state) => state.income.clone(),
                    None => self.upgraded_values(&def.name, &def.income, |effect| &effect.income),
                };
                Some(ClientBuilding {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    owned,
                    cost: self.cost_of_building(&def.name, 1),
                    cost10: self.cost_of_building(&def.name, 10),
                    income,
                })
            })
            .collect();

        let upgrades = self
            .model
            .upgrades()
            .iter()
            .filter_map(|def| {
                let owned = self.upgrades.contains(&def.name);
                if !owned && !self.requirement_is_met(&def.unlock) {
                    return None;
                }
                Some(ClientUpgrade {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    owned,
                    cost: def.cost.clone(),
                })
            })
            .collect();

        ClientState {
            resources,
            buildings,
            upgrades,
        }
    }

    fn owned_buildings(&self, building: &str) -> u64 {
        self.buildings.get(building).map_or(0, |state| state.owned)
    }

    fn can_afford(&self, cost: &ResourceAmounts) -> bool {
        cost.iter().all(|(resource, amount)| {
            let owned = self.resources.get(resource).map_or(0.0, |state| state.owned);
            owned >= *amount
        })
    }

    /// Debit a cost. Only called after [`Self::can_afford`] confirmed it,
    /// so the lower-bound clamp in `acquire_resource` never engages.
    fn pay(&mut self, cost: &ResourceAmounts) {
        for (resource, amount) in cost {
            self.acquire_resource(resource, -amount);
        }
    }

    /// Get-or-insert the tracked entry for a resource, seeding the maximum
    /// from the model's declaration.
    fn tracked_resource(&mut self, resource: &str) -> &mut ResourceState {
        let model = self.model;
        self.resources
            .entry(resource.to_string())
            .or_insert_with(|| ResourceState {
                owned: 0.0,
                income: 0.0,
                maximum: model.resource(resource).and_then(|def| def.maximum),
            })
    }

    /// A building's per-unit base map with all owned upgrades' multipliers
    /// applied. Used for buildings not yet tracked by the instance.
    fn upgraded_values(
        &self,
        building: &str,
        base: &ResourceAmounts,
        pick: impl Fn(&UpgradeEffect) -> &ResourceAmounts,
    ) -> ResourceAmounts {
        let mut values = base.clone();
        for upgrade in &self.upgrades {
            let Some(def) = self.model.upgrade(upgrade) else {
                continue;
            };
            if let Some(effect) = def.buildings.get(building) {
                apply_multipliers(&mut values, pick(effect));
            }
        }
        values
    }
}

/// Multiply entries of `values` by the matching multipliers. Values driven
/// to exactly zero are dropped to keep the maps sparse; multipliers naming
/// resources absent from the base map have nothing to scale.
fn apply_multipliers(values: &mut ResourceAmounts, multipliers: &ResourceAmounts) {
    for (resource, multiplier) in multipliers {
        let Some(value) = values.get_mut(resource) else {
            continue;
        };
        *value *= multiplier;
        if *value == 0.0 {
            values.remove(resource);
        }
    }
}
