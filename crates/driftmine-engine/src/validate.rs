//! Structural and referential validation of a raw game model description.
//!
//! Game definitions arrive as untyped JSON authored outside the engine.
//! [`validate_game_model`] checks shape, name uniqueness, and every
//! cross-reference (costs, incomes, storage, unlocks, upgrade effects,
//! new-game state) before a [`GameModel`] exists at all. The first
//! violation found is reported; nothing is partially accepted.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{BuildingDef, GameModel, ResourceDef, Unlock, UpgradeDef, UpgradeEffect};
use crate::state::{ResourceAmounts, Snapshot};

type JsonObject = Map<String, Value>;

/// A rejected game model, with a message naming the offending field.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Validate a raw model description and construct the [`GameModel`].
pub fn validate_game_model(raw: &Value) -> Result<GameModel, ValidationError> {
    let root = raw
        .as_object()
        .ok_or_else(|| ValidationError::new("Game model must be a json object"))?;

    const ROOT_KEYS: [&str; 6] = [
        "name",
        "description",
        "resources",
        "buildings",
        "upgrades",
        "new_game",
    ];
    if root.len() != ROOT_KEYS.len() || ROOT_KEYS.iter().any(|key| !root.contains_key(*key)) {
        return Err(ValidationError::new("Missing or extra keys in game model"));
    }

    let name = require_string(root, "name")?;
    let description = require_string(root, "description")?;

    let resources_raw = require_list(root, "resources")?;
    let buildings_raw = require_list(root, "buildings")?;
    let upgrades_raw = require_list(root, "upgrades")?;

    let resource_entries = named_entries(resources_raw, "resource")?;
    let building_entries = named_entries(buildings_raw, "building")?;
    let upgrade_entries = named_entries(upgrades_raw, "upgrade")?;

    // Referential checks need the complete name sets up front: unlocks and
    // effects may point at entries declared later (or at themselves).
    let building_names: Vec<String> = building_entries.iter().map(|(n, _)| n.clone()).collect();
    let upgrade_names: Vec<String> = upgrade_entries.iter().map(|(n, _)| n.clone()).collect();

    let resources = parse_resources(&resource_entries)?;
    let buildings = parse_buildings(
        &building_entries,
        &resources,
        &building_names,
        &upgrade_names,
    )?;
    let upgrades = parse_upgrades(
        &upgrade_entries,
        &resources,
        &building_names,
        &upgrade_names,
    )?;
    let new_game = parse_new_game(
        &root["new_game"],
        &resources,
        &building_names,
        &upgrade_names,
    )?;

    Ok(GameModel::from_parts(
        name,
        description,
        resources,
        buildings,
        upgrades,
        new_game,
    ))
}

fn require_string(object: &JsonObject, key: &str) -> Result<String, ValidationError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(format!("Game model {key} must be a string")))
}

fn require_list<'v>(object: &'v JsonObject, key: &str) -> Result<&'v [Value], ValidationError> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            ValidationError::new("Resources, buildings and upgrades must all be lists")
        })
}

fn require_key<'v>(object: &'v JsonObject, key: &str) -> Result<&'v Value, ValidationError> {
    object
        .get(key)
        .ok_or_else(|| ValidationError::new(format!("Missing key: {key}")))
}

/// Extract `(name, entry)` pairs, rejecting non-objects, missing names,
/// and duplicates within the sequence.
fn named_entries<'v>(
    entries: &'v [Value],
    kind: &str,
) -> Result<Vec<(String, &'v JsonObject)>, ValidationError> {
    let mut named = Vec::with_capacity(entries.len());
    for entry in entries {
        let object = entry.as_object().ok_or_else(|| {
            ValidationError::new(format!("Each {kind} must be a json object"))
        })?;
        let name = match object.get("name") {
            None => return Err(ValidationError::new("Missing key: name")),
            Some(value) => value.as_str().ok_or_else(|| {
                ValidationError::new(format!("Name of a {kind} must be a string"))
            })?,
        };
        if named.iter().any(|(existing, _)| existing == name) {
            return Err(ValidationError::new(format!(
                "Two {kind}s share the same name: {name}"
            )));
        }
        named.push((name.to_string(), object));
    }
    Ok(named)
}

fn parse_resources(
    entries: &[(String, &JsonObject)],
) -> Result<Vec<ResourceDef>, ValidationError> {
    let mut defs = Vec::with_capacity(entries.len());
    for (name, object) in entries {
        let maximum = match object.get("maximum") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_f64().ok_or_else(|| {
                ValidationError::new(format!("Resource {name} has a non-numeric maximum"))
            })?),
        };
        defs.push(ResourceDef {
            name: name.clone(),
            description: optional_description(object),
            maximum,
        });
    }
    Ok(defs)
}

fn parse_buildings(
    entries: &[(String, &JsonObject)],
    resources: &[ResourceDef],
    building_names: &[String],
    upgrade_names: &[String],
) -> Result<Vec<BuildingDef>, ValidationError> {
    let mut defs = Vec::with_capacity(entries.len());
    for (name, object) in entries {
        let unlock = parse_unlock(
            object.get("unlock"),
            building_names,
            upgrade_names,
            &format!("building {name}"),
        )?;
        let cost = resource_amounts(
            require_key(object, "cost")?,
            resources,
            &format!("Cost of building {name}"),
        )?;
        let cost_factor = require_key(object, "cost_factor")?
            .as_f64()
            .ok_or_else(|| {
                ValidationError::new(format!("Non-numeric cost factor for building {name}"))
            })?;
        let income = match object.get("income") {
            None => ResourceAmounts::new(),
            Some(value) => {
                resource_amounts(value, resources, &format!("Income of building {name}"))?
            }
        };
        let storage = match object.get("storage") {
            None => ResourceAmounts::new(),
            Some(value) => {
                resource_amounts(value, resources, &format!("Storage of building {name}"))?
            }
        };
        for resource in storage.keys() {
            let unbounded = resources
                .iter()
                .find(|def| def.name == *resource)
                .map_or(true, |def| def.maximum.is_none());
            if unbounded {
                return Err(ValidationError::new(format!(
                    "Building {name} declares storage for an unlimited resource: {resource}"
                )));
            }
        }
        defs.push(BuildingDef {
            name: name.clone(),
            description: optional_description(object),
            unlock,
            cost,
            cost_factor,
            income,
            storage,
        });
    }
    Ok(defs)
}

fn parse_upgrades(
    entries: &[(String, &JsonObject)],
    resources: &[ResourceDef],
    building_names: &[String],
    upgrade_names: &[String],
) -> Result<Vec<UpgradeDef>, ValidationError> {
    let mut defs = Vec::with_capacity(entries.len());
    for (name, object) in entries {
        let unlock = parse_unlock(
            object.get("unlock"),
            building_names,
            upgrade_names,
            &format!("upgrade {name}"),
        )?;
        let cost = resource_amounts(
            require_key(object, "cost")?,
            resources,
            &format!("Cost of upgrade {name}"),
        )?;
        let mut buildings = BTreeMap::new();
        if let Some(effects) = object.get("buildings") {
            let effects = effects.as_object().ok_or_else(|| {
                ValidationError::new(format!(
                    "Building effects of upgrade {name} must be a json object"
                ))
            })?;
            for (building, effect) in effects {
                if !building_names.contains(building) {
                    return Err(ValidationError::new(format!(
                        "Upgrade {name} affects nonexistent building: {building}"
                    )));
                }
                buildings.insert(
                    building.clone(),
                    parse_upgrade_effect(effect, resources, name, building)?,
                );
            }
        }
        defs.push(UpgradeDef {
            name: name.clone(),
            description: optional_description(object),
            unlock,
            cost,
            buildings,
        });
    }
    Ok(defs)
}

fn parse_upgrade_effect(
    effect: &Value,
    resources: &[ResourceDef],
    upgrade: &str,
    building: &str,
) -> Result<UpgradeEffect, ValidationError> {
    let effect = effect.as_object().ok_or_else(|| {
        ValidationError::new(format!(
            "Effects on building {building} must be a json object (upgrade {upgrade})"
        ))
    })?;
    let mut parsed = UpgradeEffect::default();
    for (kind, modifiers) in effect {
        let target = match kind.as_str() {
            "cost" => &mut parsed.cost,
            "income" => &mut parsed.income,
            _ => {
                return Err(ValidationError::new(format!(
                    "Unknown effect specified for building {building} in upgrade {upgrade}: {kind}"
                )))
            }
        };
        let modifiers = modifiers.as_object().ok_or_else(|| {
            ValidationError::new(format!(
                "Modified {kind} values of building {building} must be a json object"
            ))
        })?;
        for (resource, modifier) in modifiers {
            if resources.iter().all(|def| def.name != *resource) {
                return Err(ValidationError::new(format!(
                    "Upgrade affects {kind} for nonexistent resource: {resource}"
                )));
            }
            let modifier = modifier.as_object().ok_or_else(|| {
                ValidationError::new("Modifier of a value must be a json object")
            })?;
            if let Some(key) = modifier.keys().find(|key| *key != "multiplier") {
                return Err(ValidationError::new(format!(
                    "Unknown key in value modifier: {key}"
                )));
            }
            let multiplier = require_key(modifier, "multiplier")?
                .as_f64()
                .ok_or_else(|| {
                    ValidationError::new(format!("Non-numeric modifier value for {resource}"))
                })?;
            target.insert(resource.clone(), multiplier);
        }
    }
    Ok(parsed)
}

fn parse_unlock(
    unlock: Option<&Value>,
    building_names: &[String],
    upgrade_names: &[String],
    owner: &str,
) -> Result<Unlock, ValidationError> {
    let Some(unlock) = unlock else {
        return Ok(Unlock::default());
    };
    let object = unlock.as_object().ok_or_else(|| {
        ValidationError::new(format!("Unlock must be a json object (in {owner})"))
    })?;
    if object.keys().any(|key| key != "buildings" && key != "upgrades") {
        return Err(ValidationError::new(format!(
            "Extra values in unlock for {owner}"
        )));
    }
    let mut parsed = Unlock::default();
    if let Some(buildings) = object.get("buildings") {
        let buildings = buildings.as_object().ok_or_else(|| {
            ValidationError::new(format!(
                "Required buildings in unlock for {owner} must be a json object"
            ))
        })?;
        for (building, count) in buildings {
            if !building_names.contains(building) {
                return Err(ValidationError::new(format!(
                    "Unlock for {owner} references nonexistent building: {building}"
                )));
            }
            let count = count.as_f64().ok_or_else(|| {
                ValidationError::new(format!(
                    "Non-numeric number of required buildings in unlock for {owner}"
                ))
            })?;
            parsed.buildings.insert(building.clone(), count as u64);
        }
    }
    if let Some(upgrades) = object.get("upgrades") {
        let upgrades = upgrades.as_array().ok_or_else(|| {
            ValidationError::new(format!(
                "Required upgrades in unlock for {owner} must be a list"
            ))
        })?;
        for upgrade in upgrades {
            let upgrade = upgrade.as_str().ok_or_else(|| {
                ValidationError::new(format!(
                    "Upgrade names in unlock for {owner} must be strings"
                ))
            })?;
            if !upgrade_names.iter().any(|name| name == upgrade) {
                return Err(ValidationError::new(format!(
                    "Unlock for {owner} references nonexistent upgrade: {upgrade}"
                )));
            }
            parsed.upgrades.push(upgrade.to_string());
        }
    }
    Ok(parsed)
}

fn parse_new_game(
    new_game: &Value,
    resources: &[ResourceDef],
    building_names: &[String],
    upgrade_names: &[String],
) -> Result<Snapshot, ValidationError> {
    let object = new_game
        .as_object()
        .ok_or_else(|| ValidationError::new("New game state must be a json object"))?;
    if let Some(key) = object
        .keys()
        .find(|key| !matches!(key.as_str(), "resources" | "buildings" | "upgrades"))
    {
        return Err(ValidationError::new(format!(
            "Invalid key in new game state: {key}"
        )));
    }
    let mut snapshot = Snapshot::default();
    if let Some(value) = object.get("resources") {
        snapshot.resources = resource_amounts(value, resources, "Resource amounts")?;
    }
    if let Some(value) = object.get("buildings") {
        let counts = value.as_object().ok_or_else(|| {
            ValidationError::new("New game building counts must be a json object")
        })?;
        for (building, count) in counts {
            if !building_names.contains(building) {
                return Err(ValidationError::new(format!(
                    "Nonexistent building in new game state: {building}"
                )));
            }
            let count = count.as_f64().ok_or_else(|| {
                ValidationError::new(format!(
                    "Non-numeric number of buildings in new game state: {building}"
                ))
            })?;
            snapshot.buildings.insert(building.clone(), count as u64);
        }
    }
    if let Some(value) = object.get("upgrades") {
        let upgrades = value.as_array().ok_or_else(|| {
            ValidationError::new("Upgrades value in new game state is not a list")
        })?;
        for upgrade in upgrades {
            let upgrade = upgrade.as_str().ok_or_else(|| {
                ValidationError::new("Upgrade names in new game state must be strings")
            })?;
            if !upgrade_names.iter().any(|name| name == upgrade) {
                return Err(ValidationError::new(format!(
                    "Nonexistent upgrade in new game state: {upgrade}"
                )));
            }
            snapshot.upgrades.push(upgrade.to_string());
        }
    }
    Ok(snapshot)
}

/// Parse a resource→amount map, checking every resource exists and every
/// amount is numeric. `what` names the owning field for error messages.
fn resource_amounts(
    value: &Value,
    resources: &[ResourceDef],
    what: &str,
) -> Result<ResourceAmounts, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::new(format!("{what} must be a json object")))?;
    let mut amounts = ResourceAmounts::new();
    for (resource, amount) in object {
        if resources.iter().all(|def| def.name != *resource) {
            return Err(ValidationError::new(format!(
                "{what} references nonexistent resource: {resource}"
            )));
        }
        let amount = amount.as_f64().ok_or_else(|| {
            ValidationError::new(format!("Non-numeric resource amount for {resource} in {what}"))
        })?;
        amounts.insert(resource.clone(), amount);
    }
    Ok(amounts)
}

fn optional_description(object: &JsonObject) -> String {
    object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_game() -> Value {
        json!({
            "name": "game",
            "description": "a game",
            "resources": [],
            "buildings": [],
            "upgrades": [],
            "new_game": {},
        })
    }

    fn assert_rejects(game: &Value, fragment: &str) {
        let err = validate_game_model(game).expect_err("validation should have failed");
        assert!(
            err.to_string().contains(fragment),
            "expected {fragment:?} in {err}"
        );
    }

    #[test]
    fn test_empty_model_validates() {
        validate_game_model(&base_game()).unwrap();
    }

    #[test]
    fn test_non_object_model() {
        assert_rejects(&json!("not an object"), "must be a json object");
    }

    #[test]
    fn test_missing_and_extra_root_keys() {
        let mut game = base_game();
        game.as_object_mut().unwrap().remove("upgrades");
        assert_rejects(&game, "Missing or extra keys");

        let mut game = base_game();
        game["invalid_extra_key"] = json!(5);
        assert_rejects(&game, "Missing or extra keys");
    }

    #[test]
    fn test_non_list_sections() {
        for section in ["resources", "buildings", "upgrades"] {
            let mut game = base_game();
            game[section] = json!("not a list");
            assert_rejects(&game, "must all be lists");
        }
    }

    #[test]
    fn test_unnamed_entries() {
        let mut game = base_game();
        game["resources"] = json!([{"maximum": 100}]);
        assert_rejects(&game, "Missing key: name");

        let mut game = base_game();
        game["buildings"] = json!([{"cost": {}, "cost_factor": 2}]);
        assert_rejects(&game, "Missing key: name");

        let mut game = base_game();
        game["upgrades"] = json!([{"cost": {}}]);
        assert_rejects(&game, "Missing key: name");
    }

    #[test]
    fn test_duplicate_names() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "abc"}, {"name": "abc"}]);
        assert_rejects(&game, "Two resources share the same name");

        let entry = json!({"name": "abc", "cost": {}, "cost_factor": 2});
        let mut game = base_game();
        game["buildings"] = json!([entry.clone(), entry]);
        assert_rejects(&game, "Two buildings share the same name");

        let entry = json!({"name": "abc", "cost": {}});
        let mut game = base_game();
        game["upgrades"] = json!([entry.clone(), entry]);
        assert_rejects(&game, "Two upgrades share the same name");
    }

    #[test]
    fn test_resource_maximum() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "abc"}, {"name": "def", "maximum": 5}]);
        validate_game_model(&game).unwrap();

        let mut game = base_game();
        game["resources"] = json!([{"name": "abc", "maximum": "not a number"}]);
        assert_rejects(&game, "non-numeric maximum");
    }

    #[test]
    fn test_unlock_shape() {
        let mut game = base_game();
        game["buildings"] =
            json!([{"name": "abc", "unlock": [6], "cost": {}, "cost_factor": 2}]);
        assert_rejects(&game, "Unlock must be a json object");

        let mut game = base_game();
        game["buildings"] =
            json!([{"name": "abc", "unlock": {"invalid key": 1}, "cost": {}, "cost_factor": 2}]);
        assert_rejects(&game, "Extra values in unlock");
    }

    #[test]
    fn test_unlock_buildings() {
        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"buildings": "not an object"}, "cost": {}, "cost_factor": 2}
        ]);
        assert_rejects(&game, "must be a json object");

        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"buildings": {"def": 1}}, "cost": {}, "cost_factor": 2}
        ]);
        assert_rejects(&game, "references nonexistent building");

        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"buildings": {"abc": "n"}}, "cost": {}, "cost_factor": 2}
        ]);
        assert_rejects(&game, "Non-numeric number of required buildings");
    }

    #[test]
    fn test_unlock_upgrades() {
        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"upgrades": "not a list"}, "cost": {}, "cost_factor": 2}
        ]);
        assert_rejects(&game, "must be a list");

        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"upgrades": ["nonexistent"]}, "cost": {}, "cost_factor": 2}
        ]);
        assert_rejects(&game, "references nonexistent upgrade");
    }

    #[test]
    fn test_good_unlocks_including_self_reference() {
        let mut game = base_game();
        game["buildings"] = json!([
            {"name": "abc", "unlock": {"buildings": {"abc": 1}}, "cost": {}, "cost_factor": 2},
            {"name": "def", "unlock": {"upgrades": ["upgrade"]}, "cost": {}, "cost_factor": 2},
            {
                "name": "ghi",
                "unlock": {"buildings": {"abc": 1}, "upgrades": ["upgrade"]},
                "cost": {},
                "cost_factor": 2,
            },
        ]);
        game["upgrades"] = json!([{"name": "upgrade", "cost": {}}]);
        validate_game_model(&game).unwrap();
    }

    #[test]
    fn test_building_cost_rules() {
        let mut game = base_game();
        game["buildings"] = json!([{"name": "abc", "cost_factor": 2}]);
        assert_rejects(&game, "Missing key: cost");

        let mut game = base_game();
        game["buildings"] = json!([{"name": "abc", "cost": ["not an object"], "cost_factor": 2}]);
        assert_rejects(&game, "must be a json object");

        let mut game = base_game();
        game["buildings"] =
            json!([{"name": "abc", "cost": {"nonexistent": 1}, "cost_factor": 2}]);
        assert_rejects(&game, "nonexistent resource");

        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] =
            json!([{"name": "abc", "cost": {"minerals": "n"}, "cost_factor": 2}]);
        assert_rejects(&game, "Non-numeric resource");

        let mut game = base_game();
        game["buildings"] = json!([{"name": "abc", "cost": {}, "cost_factor": "n"}]);
        assert_rejects(&game, "Non-numeric cost factor");
    }

    #[test]
    fn test_building_income_references() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "a"}]);
        game["buildings"] = json!([
            {"name": "abc", "cost": {"a": 1}, "cost_factor": 2, "income": {"a": 1, "b": 2}}
        ]);
        assert_rejects(&game, "nonexistent resource");
    }

    #[test]
    fn test_building_storage_rules() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "a", "maximum": 100}]);
        game["buildings"] = json!([
            {"name": "abc", "cost": {"a": 1}, "cost_factor": 2, "storage": "not an object"}
        ]);
        assert_rejects(&game, "must be a json object");

        // storage for an uncapped resource is meaningless
        let mut game = base_game();
        game["resources"] = json!([{"name": "a"}]);
        game["buildings"] = json!([
            {"name": "abc", "cost": {"a": 1}, "cost_factor": 2, "storage": {"a": 10}}
        ]);
        assert_rejects(&game, "storage for an unlimited resource");
    }

    #[test]
    fn test_upgrade_cost_rules() {
        let mut game = base_game();
        game["upgrades"] = json!([{"name": "abc"}]);
        assert_rejects(&game, "Missing key: cost");

        let mut game = base_game();
        game["upgrades"] = json!([{"name": "abc", "cost": "not an object"}]);
        assert_rejects(&game, "must be a json object");

        let mut game = base_game();
        game["upgrades"] = json!([{"name": "abc", "cost": {}, "unlock": "not an object"}]);
        assert_rejects(&game, "must be a json object");
    }

    #[test]
    fn test_upgrade_effect_rules() {
        let mut game = base_game();
        game["upgrades"] = json!([
            {"name": "abc", "cost": {}, "buildings": {"nonexistent": {"income": {}}}}
        ]);
        assert_rejects(&game, "affects nonexistent building");

        let mut game = base_game();
        game["buildings"] = json!([{"name": "building", "cost": {}, "cost_factor": 2}]);
        game["upgrades"] = json!([
            {"name": "abc", "cost": {}, "buildings": {"building": {"what is this": {}}}}
        ]);
        assert_rejects(&game, "Unknown effect specified");

        let mut game = base_game();
        game["buildings"] = json!([{"name": "building", "cost": {}, "cost_factor": 2}]);
        game["upgrades"] = json!([
            {
                "name": "abc",
                "cost": {},
                "buildings": {"building": {"cost": {"nonexistent": {"multiplier": 0.5}}}},
            }
        ]);
        assert_rejects(&game, "affects cost for nonexistent resource");

        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([
            {"name": "building", "cost": {}, "cost_factor": 2, "income": {"minerals": 1}}
        ]);
        game["upgrades"] = json!([
            {
                "name": "abc",
                "cost": {},
                "buildings": {"building": {"income": {
                    "minerals": {"multiplier": 2},
                    "vespene gas": {"multiplier": 2},
                }}},
            }
        ]);
        assert_rejects(&game, "Upgrade affects income for nonexistent resource");
    }

    #[test]
    fn test_upgrade_modifier_rules() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([{"name": "building", "cost": {}, "cost_factor": 2}]);
        game["upgrades"] = json!([
            {"name": "abc", "cost": {}, "buildings": {"building": {"cost": {"minerals": "n"}}}}
        ]);
        assert_rejects(&game, "Modifier of a value must be a json object");

        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([{"name": "building", "cost": {}, "cost_factor": 2}]);
        game["upgrades"] = json!([
            {
                "name": "abc",
                "cost": {},
                "buildings": {"building": {"cost": {"minerals": {"invalid modification": 5}}}},
            }
        ]);
        assert_rejects(&game, "Unknown key in value modifier");

        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([{"name": "building", "cost": {}, "cost_factor": 2}]);
        game["upgrades"] = json!([
            {
                "name": "abc",
                "cost": {},
                "buildings": {"building": {"cost": {"minerals": {"multiplier": "n"}}}},
            }
        ]);
        assert_rejects(&game, "Non-numeric modifier value");
    }

    #[test]
    fn test_valid_upgrades() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([
            {"name": "building", "cost": {}, "cost_factor": 2, "income": {"minerals": 1}}
        ]);
        game["upgrades"] = json!([
            {
                "name": "abc",
                "cost": {"minerals": 1},
                "unlock": {"buildings": {"building": 1}},
                "buildings": {"building": {
                    "cost": {"minerals": {"multiplier": 0.5}},
                    "income": {"minerals": {"multiplier": 2}},
                }},
            },
            {
                "name": "def",
                "cost": {"minerals": 100},
                "unlock": {"buildings": {"building": 10}, "upgrades": ["abc"]},
                "buildings": {"building": {"income": {"minerals": {"multiplier": 2}}}},
            },
        ]);
        validate_game_model(&game).unwrap();
    }

    #[test]
    fn test_new_game_rules() {
        let mut game = base_game();
        game["new_game"] = json!("not an object");
        assert_rejects(&game, "New game state must be a json object");

        let mut game = base_game();
        game["new_game"] = json!({"unknown": {"a": 1}});
        assert_rejects(&game, "Invalid key in new game state");

        let mut game = base_game();
        game["new_game"] = json!({"resources": "not an object"});
        assert_rejects(&game, "Resource amounts must be a json object");

        let mut game = base_game();
        game["new_game"] = json!({"buildings": "not an object"});
        assert_rejects(&game, "building counts must be a json object");

        let mut game = base_game();
        game["new_game"] = json!({"upgrades": "not a list"});
        assert_rejects(&game, "Upgrades value in new game state is not a list");

        let mut game = base_game();
        game["new_game"] = json!({"buildings": {"nonexistent": 1}});
        assert_rejects(&game, "Nonexistent building in new game state");

        let mut game = base_game();
        game["buildings"] = json!([{"name": "abc", "cost": {}, "cost_factor": 2}]);
        game["new_game"] = json!({"buildings": {"abc": "n"}});
        assert_rejects(&game, "Non-numeric number of buildings in new game");

        let mut game = base_game();
        game["new_game"] = json!({"upgrades": ["nonexistent"]});
        assert_rejects(&game, "Nonexistent upgrade in new game");
    }

    #[test]
    fn test_valid_new_game() {
        let mut game = base_game();
        game["resources"] = json!([{"name": "minerals"}]);
        game["buildings"] = json!([
            {"name": "building", "cost": {}, "cost_factor": 2, "income": {"minerals": 1}}
        ]);
        game["upgrades"] = json!([{"name": "abc", "cost": {"minerals": 1}}]);
        game["new_game"] = json!({
            "resources": {"minerals": 1},
            "buildings": {"building": 1},
            "upgrades": ["abc"],
        });
        let model = validate_game_model(&game).unwrap();
        assert_eq!(model.new_game.resources["minerals"], 1.0);
        assert_eq!(model.new_game.buildings["building"], 1);
        assert_eq!(model.new_game.upgrades, vec!["abc".to_string()]);
    }
}
