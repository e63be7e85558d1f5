use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_mhwi-build-search")
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("mhwi-build-search-{name}-{stamp}.{extension}"))
}

#[test]
fn search_command_emits_build_json() {
    let path = unique_temp_path("search", "yaml");
    fs::write(
        &path,
        "selected_weapon_class: GREATSWORD\nselected_skills:\n  ATTACK_BOOST: 1\n  CRITICAL_EYE: 0\n",
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args(["search", path.to_string_lossy().as_ref(), "--sequential", "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("search should emit json");
    assert!(payload["efr"].as_f64().is_some_and(|efr| efr > 0.0));
    assert!(payload["skills"]["ATTACK_BOOST"].as_u64().is_some_and(|l| l >= 1));
    assert!(payload["build"]["weapon"].is_string());

    let _ = fs::remove_file(path);
}

#[test]
fn search_without_a_build_exits_cleanly() {
    let path = unique_temp_path("search-none", "json");
    fs::write(
        &path,
        r#"{"selected_weapon_class": "GREATSWORD",
            "selected_skills": {"NON_ELEMENTAL_BOOST": 1},
            "selected_decorations": []}"#,
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args(["search", path.to_string_lossy().as_ref(), "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("search should run");

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no qualifying build found"));

    let _ = fs::remove_file(path);
}

#[test]
fn lookup_command_lists_state_branches() {
    let path = unique_temp_path("lookup", "json");
    fs::write(
        &path,
        r#"{
            "armour": {
                "HEAD": ["Brachydios", "MASTER_RANK", "MR_ALPHA_PLUS"],
                "CHEST": ["Kaiser", "MASTER_RANK", "MR_ALPHA_PLUS"],
                "ARMS": ["Brachydios", "MASTER_RANK", "MR_ALPHA_PLUS"],
                "WAIST": ["Kaiser", "MASTER_RANK", "MR_ALPHA_PLUS"],
                "LEGS": ["Kaiser", "MASTER_RANK", "MR_ALPHA_PLUS"]
            },
            "charm": "CHALLENGER_CHARM",
            "weapon": "ACID_SHREDDER_II",
            "weapon_augments": "NoWeaponAugments",
            "weapon_upgrades": "NoWeaponUpgrades",
            "decorations": {"ATTACK": 1}
        }"#,
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args(["lookup", path.to_string_lossy().as_ref(), "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("lookup should run");
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("lookup should emit json");
    // Agitator has two states and Weakness Exploit three.
    assert_eq!(payload.as_array().map(Vec::len), Some(6));

    let pinned = Command::new(bin())
        .args(["lookup", path.to_string_lossy().as_ref(), "--state", "AGITATOR=1", "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("lookup should run");
    assert_eq!(pinned.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&pinned.stdout).expect("lookup should emit json");
    let branches = payload.as_array().expect("array");
    assert_eq!(branches.len(), 3);
    assert!(branches.iter().all(|b| b["states"]["AGITATOR"] == 1));

    let _ = fs::remove_file(path);
}

#[test]
fn lookup_rejects_a_state_for_a_stateless_skill() {
    let output = Command::new(bin())
        .args(["lookup", "missing.json", "--state", "ATTACK_BOOST=0", "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("lookup should run");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn validate_command_passes_on_shipped_data() {
    let output = Command::new(bin())
        .args(["validate", "--data-dir"])
        .arg(data_dir())
        .output()
        .expect("validate should run");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("validation passed"));
}

#[test]
fn validate_command_returns_non_zero_on_invalid_data() {
    let dir = unique_temp_path("invalid-data", "d");
    fs::create_dir_all(&dir).expect("temp dir should be created");
    for file in ["decorations.json", "charms.json", "armour.json", "weapons.json"] {
        fs::copy(data_dir().join(file), dir.join(file)).expect("catalog should copy");
    }
    let skills = fs::read_to_string(data_dir().join("skills.json")).expect("skills should read");
    let broken = skills.replacen("\"limit\": 3,", "\"limit\": 0,", 1);
    fs::write(dir.join("skills.json"), broken).expect("fixture should be written");

    let output = Command::new(bin())
        .args(["validate", "--data-dir"])
        .arg(&dir)
        .output()
        .expect("validate should run");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("skills.json"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = Command::new(bin())
        .arg("frobnicate")
        .output()
        .expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}
