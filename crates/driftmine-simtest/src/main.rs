//! Driftmine headless simulation harness.
//!
//! Validates the bundled sample model and drives the engine through its
//! main scenarios entirely in-process — no database, no networking, no
//! rendering.
//!
//! Usage:
//!   cargo run -p driftmine-simtest
//!   cargo run -p driftmine-simtest -- --verbose

use driftmine_engine::decay::{effective_seconds, DECAY_WINDOW, FULL_SPEED_WINDOW};
use driftmine_engine::model::GameModel;
use driftmine_engine::state::Snapshot;
use driftmine_engine::validate::validate_game_model;
use serde_json::Value;

// ── Sample model (same JSON a deployment would store) ───────────────────
const SAMPLE_MODEL: &str = include_str!("../../../data/sample_model.json");

const T0: f64 = 946_684_800.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Driftmine Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Sample model validation
    let model = match load_sample_model(&mut results) {
        Some(model) => model,
        None => {
            report(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Validator rejection sweep
    results.extend(validate_rejections());

    // 3. Accrual and purchase loop
    results.extend(validate_accrual(&model));

    // 4. Unlock gating
    results.extend(validate_unlock_gating(&model));

    // 5. Upgrade modifiers
    results.extend(validate_upgrade_effects(&model));

    // 6. Offline decay curve
    results.extend(validate_decay());

    // 7. Snapshot round-trip
    results.extend(validate_snapshot_roundtrip(&model));

    report(&results, verbose);
    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
}

// ── 1. Sample model ─────────────────────────────────────────────────────

fn load_sample_model(results: &mut Vec<TestResult>) -> Option<GameModel> {
    println!("--- Sample Model ---");
    let raw: Value = match serde_json::from_str(SAMPLE_MODEL) {
        Ok(raw) => raw,
        Err(e) => {
            results.push(check("model_parse", false, format!("JSON parse error: {e}")));
            return None;
        }
    };
    match validate_game_model(&raw) {
        Ok(model) => {
            results.push(check(
                "model_validates",
                true,
                format!(
                    "{} resources, {} buildings, {} upgrades",
                    model.resources().len(),
                    model.buildings().len(),
                    model.upgrades().len()
                ),
            ));
            Some(model)
        }
        Err(e) => {
            results.push(check("model_validates", false, e.to_string()));
            None
        }
    }
}

// ── 2. Validator rejections ─────────────────────────────────────────────

fn validate_rejections() -> Vec<TestResult> {
    println!("--- Validator Rejections ---");
    let mut results = Vec::new();

    let broken: &[(&str, fn(&mut Value), &str)] = &[
        ("reject_missing_key", |v| {
            v.as_object_mut().unwrap().remove("upgrades");
        }, "Missing or extra keys"),
        ("reject_bad_reference", |v| {
            v["buildings"][0]["cost"] = serde_json::json!({"unknown": 1.0});
        }, "nonexistent resource"),
        ("reject_storage_on_unbounded", |v| {
            v["buildings"][0]["storage"] = serde_json::json!({"minerals": 10.0});
        }, "unlimited resource"),
    ];

    let base: Value = serde_json::from_str(SAMPLE_MODEL).expect("sample parses");
    for (name, mutate, fragment) in broken {
        let mut raw = base.clone();
        mutate(&mut raw);
        let outcome = validate_game_model(&raw);
        let (passed, detail) = match outcome {
            Ok(_) => (false, "accepted a broken model".to_string()),
            Err(e) if e.to_string().contains(fragment) => (true, e.to_string()),
            Err(e) => (false, format!("wrong message: {e}")),
        };
        results.push(check(name, passed, detail));
    }
    results
}

// ── 3. Accrual ──────────────────────────────────────────────────────────

fn validate_accrual(model: &GameModel) -> Vec<TestResult> {
    println!("--- Accrual ---");
    let mut results = Vec::new();

    let mut instance = model.load_game_instance(&model.new_game, T0);
    let (save, _) = instance.purchase_building(T0, "miner", 1);
    results.push(check(
        "purchase_debits",
        save.resources.get("minerals") == Some(&6.0)
            && save.buildings.get("miner") == Some(&1),
        format!("minerals after purchase: {:?}", save.resources.get("minerals")),
    ));

    let (save, client) = instance.get_current_state(T0 + 10.0);
    results.push(check(
        "income_accrues",
        save.resources.get("minerals") == Some(&56.0),
        format!("minerals after 10s: {:?}", save.resources.get("minerals")),
    ));
    results.push(check(
        "client_reports_income",
        client.resources.first().map(|r| r.income) == Some(5.0),
        format!("minerals income: {:?}", client.resources.first().map(|r| r.income)),
    ));

    // a second advance at the same timestamp must change nothing
    let (again, _) = instance.get_current_state(T0 + 10.0);
    results.push(check(
        "advance_idempotent",
        again == save,
        "same timestamp, same snapshot".to_string(),
    ));
    results
}

// ── 4. Unlock gating ────────────────────────────────────────────────────

fn validate_unlock_gating(model: &GameModel) -> Vec<TestResult> {
    println!("--- Unlock Gating ---");
    let mut results = Vec::new();

    let snapshot = Snapshot {
        resources: [("minerals".to_string(), 500.0)].into_iter().collect(),
        buildings: [("miner".to_string(), 2)].into_iter().collect(),
        ..Snapshot::default()
    };
    let mut instance = model.load_game_instance(&snapshot, T0);

    let (save, client) = instance.purchase_building(T0, "extractor", 1);
    results.push(check(
        "locked_purchase_noop",
        !save.buildings.contains_key("extractor")
            && client.buildings.iter().all(|b| b.name != "extractor"),
        "extractor neither bought nor offered".to_string(),
    ));

    instance.purchase_upgrade(T0, "gas extraction");
    let (save, _) = instance.purchase_building(T0, "extractor", 1);
    results.push(check(
        "unlocked_purchase_succeeds",
        save.buildings.get("extractor") == Some(&1),
        format!("extractors owned: {:?}", save.buildings.get("extractor")),
    ));
    results
}

// ── 5. Upgrade effects ──────────────────────────────────────────────────

fn validate_upgrade_effects(model: &GameModel) -> Vec<TestResult> {
    println!("--- Upgrade Effects ---");
    let mut results = Vec::new();

    let snapshot = Snapshot {
        resources: [
            ("minerals".to_string(), 1000.0),
            ("gas".to_string(), 100.0),
        ]
        .into_iter()
        .collect(),
        buildings: [("extractor".to_string(), 4)].into_iter().collect(),
        upgrades: vec!["gas extraction".to_string()],
    };
    let mut instance = model.load_game_instance(&snapshot, T0);

    let (_, before) = instance.get_current_state(T0);
    let income_before = before
        .resources
        .iter()
        .find(|r| r.name == "gas")
        .map(|r| r.income);

    let (_, after) = instance.purchase_upgrade(T0, "extractor efficiency");
    let income_after = after
        .resources
        .iter()
        .find(|r| r.name == "gas")
        .map(|r| r.income);

    results.push(check(
        "income_doubles",
        income_before == Some(20.0) && income_after == Some(40.0),
        format!("gas income {income_before:?} -> {income_after:?}"),
    ));

    let (save, _) = instance.purchase_upgrade(T0, "extractor efficiency");
    results.push(check(
        "no_double_purchase",
        save.resources.get("minerals") == Some(&800.0),
        format!("minerals after repeat attempt: {:?}", save.resources.get("minerals")),
    ));
    results
}

// ── 6. Decay curve ──────────────────────────────────────────────────────

fn validate_decay() -> Vec<TestResult> {
    println!("--- Offline Decay ---");
    let mut results = Vec::new();

    results.push(check(
        "negative_elapsed_clamps",
        effective_seconds(-100.0) == 0.0,
        format!("effective(-100) = {}", effective_seconds(-100.0)),
    ));
    results.push(check(
        "full_speed_boundary",
        effective_seconds(FULL_SPEED_WINDOW) == FULL_SPEED_WINDOW,
        format!("effective(1 day) = {}", effective_seconds(FULL_SPEED_WINDOW)),
    ));
    let cap = effective_seconds(FULL_SPEED_WINDOW + DECAY_WINDOW);
    results.push(check(
        "long_absence_capped",
        effective_seconds(FULL_SPEED_WINDOW + DECAY_WINDOW * 10.0) == cap,
        format!("cap = {cap}"),
    ));
    results
}

// ── 7. Snapshot round-trip ──────────────────────────────────────────────

fn validate_snapshot_roundtrip(model: &GameModel) -> Vec<TestResult> {
    println!("--- Snapshot Round-trip ---");
    let mut results = Vec::new();

    let mut instance = model.load_game_instance(&model.new_game, T0);
    instance.purchase_building(T0, "miner", 1);
    let (save, client) = instance.get_current_state(T0 + 30.0);

    let stored = serde_json::to_string(&save).expect("snapshot serializes");
    let reloaded: Snapshot = serde_json::from_str(&stored).expect("snapshot parses");
    let mut restored = model.load_game_instance(&reloaded, T0 + 30.0);
    let (save2, client2) = restored.get_current_state(T0 + 30.0);

    results.push(check(
        "roundtrip_stable",
        save2 == save && client2 == client,
        format!("stored form: {stored}"),
    ));
    results
}
