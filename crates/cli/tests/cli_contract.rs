use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn add_material(data_dir: &Path, name: &str, color: &str, extra: &[&str]) {
    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir)
        .args(["catalog", "add", name, "--color", color])
        .args(extra)
        .assert()
        .success();
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should contain valid json")
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("matquote")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn probe_emits_stable_json_contract() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    let output = cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("probe")
        .arg("--document")
        .arg(fixture("kitchen.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let mut value = stdout_json(&output);
    value["data"]["appVersion"] = Value::String("<VERSION>".to_owned());

    insta::assert_json_snapshot!(value, @r#"
    {
      "data": {
        "appName": "matquote",
        "appVersion": "<VERSION>",
        "documentExists": true,
        "selectionCount": 2
      },
      "message": "Host is reachable.",
      "success": true
    }
    "#);
}

#[test]
fn catalog_add_list_remove() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    add_material(data_dir.path(), "PVC", "#3366ff", &["--unit", "m"]);

    let output = cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .args(["catalog", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let catalog = stdout_json(&output);
    assert_eq!(catalog["materials"]["PVC"]["color"], "#3366FF");
    assert_eq!(catalog["materials"]["PVC"]["unit"], "m");

    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .args(["catalog", "remove", "PVC"])
        .assert()
        .success();

    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .args(["catalog", "remove", "PVC"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("material not found: PVC"));
}

#[test]
fn catalog_rejects_invalid_color() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .args(["catalog", "add", "Glass", "--color", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("6-digit hex"));
}

#[test]
fn annotate_then_export_quantity_report() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    let work = tempfile::tempdir().expect("temp dir should be created");
    add_material(data_dir.path(), "PVC", "#3366FF", &["--unit", "m"]);
    add_material(data_dir.path(), "Steel", "#999999", &[]);
    add_material(data_dir.path(), "Oak", "#8B5A2B", &["--unit", "pcs"]);

    let annotated = work.path().join("kitchen.json");
    let output = cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("annotate")
        .arg("--document")
        .arg(fixture("kitchen.json"))
        .args(["--material", "PVC=5", "--material", "Steel", "--at", "1200,300"])
        .arg("--output")
        .arg(&annotated)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = stdout_json(&output);
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["objectCount"], 2);
    assert!(response["data"]["label"].as_str().expect("label").starts_with("5 m PVC + Steel\n"));

    let document: Value =
        serde_json::from_slice(&std::fs::read(&annotated).expect("document should be written"))
            .expect("document should be json");
    assert_eq!(document["layers"][0]["items"][1]["name"], "Material object 2");
    assert_eq!(document["layers"][0]["items"].as_array().expect("items").len(), 4);

    let out_dir = work.path().join("reports");
    std::fs::create_dir_all(&out_dir).expect("report dir should be created");
    let output = cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("export")
        .arg("--document")
        .arg(&annotated)
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = stdout_json(&output);
    assert_eq!(response["data"]["itemCount"], 3);
    assert!(response["data"].get("totalAmount").is_none());

    let path = PathBuf::from(response["data"]["path"].as_str().expect("path"));
    let file_name = path.file_name().and_then(|n| n.to_str()).expect("file name").to_owned();
    assert!(file_name.starts_with("quote_") && file_name.ends_with(".csv"));

    let csv = std::fs::read_to_string(&path).expect("csv should be readable");
    let body = csv.strip_prefix('\u{FEFF}').expect("csv should start with a BOM");
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "layer,materials,area(m²)");
    assert!(lines[1].starts_with("door,5 m PVC + Steel,"));
    assert!(lines[2].starts_with("Material object 2,5 m PVC + Steel,"));
    assert_eq!(lines[3], "drawer front,2 pcs Oak,0.375");
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "Total,3 items");
}

#[test]
fn export_with_nothing_annotated_writes_no_file() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    let out_dir = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("export")
        .arg("--document")
        .arg(fixture("untagged.json"))
        .arg("--output-dir")
        .arg(out_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stderr(predicate::str::contains("Nothing found to export."));

    let entries = std::fs::read_dir(out_dir.path()).expect("dir should be readable").count();
    assert_eq!(entries, 0);
}

#[test]
fn annotate_fails_for_unknown_material() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    let work = tempfile::tempdir().expect("temp dir should be created");
    let output = work.path().join("out.json");

    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("annotate")
        .arg("--document")
        .arg(fixture("kitchen.json"))
        .args(["--material", "Marble", "--at", "0,0"])
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Material \"Marble\" is not in the catalog."));

    assert!(!output.exists());
}

#[test]
fn annotate_fails_for_missing_document() {
    let data_dir = tempfile::tempdir().expect("temp dir should be created");
    cargo_bin_cmd!("matquote")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("annotate")
        .arg("--document")
        .arg(fixture("missing.json"))
        .args(["--material", "PVC", "--at", "0,0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}
