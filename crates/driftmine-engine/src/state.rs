//! Boundary data shapes: the persisted snapshot and the client payload.
//!
//! Both shapes are plain serde data. The snapshot is what the persistence
//! layer stores per player; the client payload is what an external renderer
//! displays. Neither carries any behavior.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-resource amounts, keyed by resource name.
pub type ResourceAmounts = BTreeMap<String, f64>;

/// Minimal persisted representation of a player's progress.
///
/// Empty sections are omitted on output and default on input, so a missing
/// or empty stored snapshot loads as a fresh game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: ResourceAmounts,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub buildings: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upgrades: Vec<String>,
}

/// Everything the front end needs to render one resource row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResource {
    pub name: String,
    pub description: String,
    pub owned: f64,
    pub income: f64,
    /// `None` means unbounded.
    pub maximum: Option<f64>,
}

/// One purchasable building row, with the cost of the next 1 and 10 units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBuilding {
    pub name: String,
    pub description: String,
    pub owned: u64,
    pub cost: ResourceAmounts,
    pub cost10: ResourceAmounts,
    pub income: ResourceAmounts,
}

/// One upgrade row; `owned` upgrades stay visible but are not re-purchasable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUpgrade {
    pub name: String,
    pub description: String,
    pub owned: bool,
    pub cost: ResourceAmounts,
}

/// Full display payload, in model declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    pub resources: Vec<ClientResource>,
    pub buildings: Vec<ClientBuilding>,
    pub upgrades: Vec<ClientUpgrade>,
}
