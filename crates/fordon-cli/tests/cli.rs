use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TRYG: &str = "\
Tryg Forsikring
Personbil - Vilkår PAU18100
Kjennemerke: AB12345
Fabrikat/årsmodell/Type: Volvo XC60 2020
Forsikringssum kr: 350 000
Dekning: Kasko
Leasing: Ja
Årlig kjørelengde: 15 000 km
Bonus: 70 %
Egenandel: 4 000
";

const IF_POLICY: &str = "\
If Skadeforsikring NUF
PR59518, Varebil, Volkswagen Transporter
Registreringsnummer: PR59518
Fabrikat/modell/årsmodell: Volkswagen Transporter 2019
Dekning: Kasko
Kjørelengde: 20 000 km
Egenandel: 8 000
";

/// `fordon` with its config directory pointed into `home`.
fn fordon(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fordon").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn extract_json_detects_insurer() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "tryg.txt", TRYG);

    let output = fordon(dir.path()).arg("extract").arg(&input).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["insurer"], "tryg");
    let cells = &json["rows"][0]["cells"];
    assert_eq!(cells["B"], "AB12345");
    assert_eq!(cells["C"], "Volvo XC60 2020");
    assert_eq!(cells["D"], 350000);
    assert_eq!(cells["G"], 15000);
    assert_eq!(cells["H"], "70%");
    assert_eq!(cells["I"], 4000);
}

#[test]
fn extract_csv_leaves_unsupported_columns_blank() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "if.txt", IF_POLICY);

    fordon(dir.path())
        .args(["extract", "--insurer", "if", "--format", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Reg.nr,"))
        .stdout(predicate::str::contains(
            "PR59518,Volkswagen Transporter 2019,,Kasko,,20000,,8000",
        ));
}

#[test]
fn extract_text_summary() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "tryg.txt", TRYG);

    fordon(dir.path())
        .args(["extract", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Insurer: Tryg"))
        .stdout(predicate::str::contains("B Reg.nr: AB12345"));
}

#[test]
fn extract_fails_without_insurer_marker() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "policy.txt", "Kjennemerke: AB12345\n");

    fordon(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not detect the insurer"));
}

#[test]
fn extract_rejects_unknown_insurer_name() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "tryg.txt", TRYG);

    fordon(dir.path())
        .args(["extract", "--insurer", "ly"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown insurer"));
}

#[test]
fn extract_reports_unrecognized_layout() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "preamble.txt", "Tryg Forsikring\nForsikringsbevis\nSide 1 av 4\n");

    fordon(dir.path())
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("layout not recognized"));
}

#[test]
fn extract_missing_input() {
    let dir = TempDir::new().unwrap();

    fordon(dir.path())
        .args(["extract", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_xlsx_needs_output_path() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "tryg.txt", TRYG);

    fordon(dir.path())
        .args(["extract", "-f", "xlsx"])
        .arg(&input)
        .assert()
        .failure();

    let workbook = dir.path().join("fordon.xlsx");
    fordon(dir.path())
        .args(["extract", "-f", "xlsx", "-o"])
        .arg(&workbook)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 vehicle(s) written"));
    assert!(workbook.exists());
}

#[test]
fn label_overlay_from_config() {
    let dir = TempDir::new().unwrap();
    let overlay = write_file(&dir, "overlay.json", r#"{"tryg": {"bonus": ["Bonusgrad"]}}"#);
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        serde_json::json!({ "extraction": { "label_overlay": overlay } }).to_string(),
    )
    .unwrap();
    let input = write_file(&dir, "tryg.txt", "Tryg Forsikring\nKjennemerke: AB12345\nBonusgrad: 50 %\n");

    let output = fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rows"][0]["cells"]["H"], "50%");
}

#[test]
fn batch_continues_on_error_and_writes_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).unwrap();
    fs::write(inputs.join("a_tryg.txt"), TRYG).unwrap();
    fs::write(inputs.join("b_if.txt"), IF_POLICY).unwrap();
    fs::write(inputs.join("c_blank.txt"), "nothing to see\n").unwrap();
    let out = dir.path().join("out");
    let combined = dir.path().join("combined.xlsx");

    fordon(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", inputs.display()))
        .args(["--continue-on-error", "--summary", "-j", "2", "-o"])
        .arg(&out)
        .arg("--combined")
        .arg(&combined)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"))
        .stdout(predicate::str::contains("2 vehicle(s) written"));

    assert!(out.join("a_tryg.json").exists());
    assert!(out.join("b_if.json").exists());
    assert!(!out.join("c_blank.json").exists());
    assert!(combined.exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("a_tryg.txt,success,tryg,1,"));
    assert!(lines[2].starts_with("b_if.txt,success,if,1,"));
    assert!(lines[3].starts_with("c_blank.txt,error,"));
}

#[test]
fn batch_stops_on_first_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blank.txt"), "nothing to see\n").unwrap();

    fordon(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("blank.txt"));
}

#[test]
fn batch_without_matches() {
    let dir = TempDir::new().unwrap();

    fordon(dir.path())
        .arg("batch")
        .arg(format!("{}/*.pdf", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("fordon.json");

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "output.layout", "sectioned"])
        .assert()
        .success();

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "output.layout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sectioned\""));

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "output.layout", "diagonal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn config_default_insurer_skips_detection() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("fordon.json");
    fs::write(&config, r#"{"extraction": {"default_insurer": "tryg"}}"#).unwrap();
    let input = write_file(&dir, "plain.txt", "Kjennemerke: AB12345\nBonus: 60 %\n");

    fordon(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["extract", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("AB12345,,,,,,60%,"));
}

#[test]
fn labels_json_for_one_insurer() {
    let dir = TempDir::new().unwrap();

    let output = fordon(dir.path())
        .args(["labels", "--insurer", "gjensidige", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let fields = json["gjensidige"].as_object().unwrap();
    assert!(fields.contains_key("bonus"));
    assert!(!fields.contains_key("deductible"));
    assert!(json.get("tryg").is_none());
}
