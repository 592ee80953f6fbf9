//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bandprep() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("bandprep").unwrap()
}

#[test]
fn validate_reading_catalog() {
    bandprep()
        .arg("validate")
        .arg("--catalog")
        .arg("../../catalogs/academic-reading-1.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("40 questions"))
        .stdout(predicate::str::contains("All catalogs valid"));
}

#[test]
fn validate_listening_catalog() {
    bandprep()
        .arg("validate")
        .arg("--catalog")
        .arg("../../catalogs/listening-1.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("28 questions"));
}

#[test]
fn validate_directory() {
    bandprep()
        .arg("validate")
        .arg("--catalog")
        .arg("../../catalogs")
        .assert()
        .success()
        .stdout(predicate::str::contains("Academic Reading Practice Test 1"))
        .stdout(predicate::str::contains("Listening Practice Test 1"));
}

#[test]
fn validate_nonexistent_file() {
    bandprep()
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_warns_about_missing_drag_token() {
    let dir = TempDir::new().unwrap();
    let catalog = r#"
[catalog]
id = "broken-drag"
name = "Broken Drag"
skill = "listening"
duration_secs = 60

[[questions]]
id = 1
kind = "drag"
prompt = "Room on the map"
answer = "Pottery Room"
group = 1
"#;
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, catalog).unwrap();

    bandprep()
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not in the token pool"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    bandprep()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created bandprep.toml"))
        .stdout(predicate::str::contains("Created catalogs/example.toml"));

    assert!(dir.path().join("bandprep.toml").exists());
    assert!(dir.path().join("catalogs/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    bandprep()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    bandprep()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn list_shows_shipped_catalogs() {
    bandprep()
        .arg("list")
        .arg("--catalog-dir")
        .arg("../../catalogs")
        .assert()
        .success()
        .stdout(predicate::str::contains("academic-reading-1"))
        .stdout(predicate::str::contains("listening-1"))
        .stdout(predicate::str::contains("reading"));
}

#[test]
fn take_offline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");

    // Start, answer two of the first three questions correctly, place a
    // drag token, flag a question, then submit.
    let script = "\n\
        answer 1 round\n\
        answer 2 2\n\
        answer 3 wrong\n\
        drag kitchen 18\n\
        flag 7\n\
        board\n\
        submit\n";

    bandprep()
        .arg("take")
        .arg("--catalog")
        .arg("../../catalogs/listening-1.toml")
        .arg("--offline")
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("all")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Test started"))
        .stdout(predicate::str::contains("Estimated Band"))
        .stdout(predicate::str::contains("Still flagged at submission: 7"));

    let entries: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    let names: Vec<String> = entries
        .into_iter()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.ends_with(".json")), "json report missing: {names:?}");
    assert!(names.iter().any(|n| n.ends_with(".html")), "html report missing: {names:?}");
}

#[test]
fn take_submits_on_end_of_input() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");

    bandprep()
        .arg("take")
        .arg("--catalog")
        .arg("../../catalogs/listening-1.toml")
        .arg("--offline")
        .arg("--output")
        .arg(&output)
        .write_stdin("\nanswer 1 round\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved to"));
}

#[test]
fn review_round_trips_a_report() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");

    bandprep()
        .arg("take")
        .arg("--catalog")
        .arg("../../catalogs/listening-1.toml")
        .arg("--offline")
        .arg("--output")
        .arg(&output)
        .write_stdin("\nanswer 1 round\nsubmit\n")
        .assert()
        .success();

    let report = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .expect("no json report written");

    bandprep()
        .arg("review")
        .arg("--report")
        .arg(&report)
        .arg("--explanations")
        .assert()
        .success()
        .stdout(predicate::str::contains("Listening Practice Test 1"))
        .stdout(predicate::str::contains("correct"))
        .stdout(predicate::str::contains("Key sentence"));
}

#[test]
fn account_register_blocks_invalid_fields() {
    let dir = TempDir::new().unwrap();
    // A config with an identity section, pointing nowhere: validation
    // must reject the fields before any network attempt.
    std::fs::write(
        dir.path().join("bandprep.toml"),
        r#"
[generation]
type = "mock"

[identity]
base_url = "http://127.0.0.1:9"
anon_key = "anon"
"#,
    )
    .unwrap();

    bandprep()
        .current_dir(dir.path())
        .arg("account")
        .arg("register")
        .arg("--name")
        .arg("L")
        .arg("--email")
        .arg("not-an-email")
        .arg("--password")
        .arg("123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("name:"))
        .stderr(predicate::str::contains("email:"))
        .stderr(predicate::str::contains("password:"))
        .stderr(predicate::str::contains("registration blocked"));
}

#[test]
fn account_requires_identity_config() {
    let dir = TempDir::new().unwrap();

    bandprep()
        .current_dir(dir.path())
        .arg("account")
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no [identity] section"));
}
