use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Run revtrail inside `dir` with the default `.revtrail` store.
fn revtrail(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("revtrail");
    cmd.current_dir(dir.path()).env_remove("REVTRAIL_DIR");
    cmd
}

fn initialized() -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    revtrail(&dir).arg("init").assert().success();
    dir
}

fn record(dir: &assert_fs::TempDir, args: &[&str]) {
    revtrail(dir).arg("record").args(args).assert().success();
}

/// Create User#1 as Brandon, then rename to Foobar and Awesome.
fn seed_history(dir: &assert_fs::TempDir) {
    record(
        dir,
        &[
            "User",
            "1",
            "create",
            "--after",
            r#"{"name":"Brandon","username":"brandon"}"#,
            "--actor",
            "admin",
        ],
    );
    record(
        dir,
        &[
            "User",
            "1",
            "update",
            "--before",
            r#"{"name":"Brandon","username":"brandon"}"#,
            "--after",
            r#"{"name":"Foobar","username":"brandon"}"#,
            "--actor",
            "admin",
        ],
    );
    record(
        dir,
        &[
            "User",
            "1",
            "update",
            "--before",
            r#"{"name":"Foobar","username":"brandon"}"#,
            "--after",
            r#"{"name":"Awesome","username":"keepers"}"#,
            "--actor",
            "User:42",
        ],
    );
}

// ─── init ────────────────────────────────────────────────────────

#[test]
fn init_creates_config_and_log() {
    let dir = initialized();

    dir.child(".revtrail/config.toml")
        .assert(predicate::str::contains("[revtrail]"))
        .assert(predicate::str::contains("format_version = 1"))
        .assert(predicate::str::contains("log_file = \"audit.log\""));
    dir.child(".revtrail/audit.log").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let dir = initialized();

    revtrail(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn init_honours_custom_dir() {
    let dir = assert_fs::TempDir::new().unwrap();

    revtrail(&dir)
        .args(["--dir", "history", "init"])
        .assert()
        .success();

    dir.child("history/config.toml").assert(predicate::path::exists());
    dir.child(".revtrail").assert(predicate::path::missing());
}

#[test]
fn commands_require_init() {
    let dir = assert_fs::TempDir::new().unwrap();

    revtrail(&dir)
        .args(["log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("revtrail init"));
}

// ─── record ──────────────────────────────────────────────────────

#[test]
fn record_assigns_consecutive_versions() {
    let dir = initialized();

    revtrail(&dir)
        .args(["record", "User", "1", "create", "--after", r#"{"name":"Brandon"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded create User#1 as version 1"));

    revtrail(&dir)
        .args([
            "record",
            "User",
            "1",
            "update",
            "--before",
            r#"{"name":"Brandon"}"#,
            "--after",
            r#"{"name":"Foobar"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded update User#1 as version 2"));

    let content = std::fs::read_to_string(dir.path().join(".revtrail/audit.log")).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("\"change_set\":{\"name\":[\"Brandon\",\"Foobar\"]}"));
}

#[test]
fn record_without_changes_writes_nothing() {
    let dir = initialized();
    record(&dir, &["User", "1", "create", "--after", r#"{"name":"Brandon"}"#]);

    revtrail(&dir)
        .args([
            "record",
            "User",
            "1",
            "update",
            "--before",
            r#"{"name":"Brandon"}"#,
            "--after",
            r#"{"name":"Brandon"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes detected for User#1"));

    let content = std::fs::read_to_string(dir.path().join(".revtrail/audit.log")).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn record_stores_actor_and_tenant_columns() {
    let dir = initialized();

    revtrail(&dir)
        .args([
            "record",
            "Company",
            "9",
            "create",
            "--after",
            r#"{"name":"The auditors"}"#,
            "--actor",
            "User:42",
            "--tenant",
            "Business:7",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("by: User:42"));

    let content = std::fs::read_to_string(dir.path().join(".revtrail/audit.log")).unwrap();
    assert!(content.contains("\"actor_id\":\"42\""));
    assert!(content.contains("\"actor_type\":\"User\""));
    assert!(content.contains("\"tenant_id\":\"7\""));
    assert!(content.contains("\"tenant_type\":\"Business\""));
}

#[test]
fn record_drops_excluded_attributes() {
    let dir = initialized();
    record(
        &dir,
        &["User", "1", "create", "--after", r#"{"name":"Brandon","password":"hunter2"}"#],
    );

    let content = std::fs::read_to_string(dir.path().join(".revtrail/audit.log")).unwrap();
    assert!(content.contains("Brandon"));
    assert!(!content.contains("hunter2"));
}

#[test]
fn record_rejects_unknown_action() {
    let dir = initialized();

    revtrail(&dir)
        .args(["record", "User", "1", "rename", "--after", r#"{"name":"x"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown action 'rename'"));
}

#[test]
fn record_rejects_non_object_attributes() {
    let dir = initialized();

    revtrail(&dir)
        .args(["record", "User", "1", "create", "--after", "[1,2]"])
        .assert()
        .failure();
}

// ─── log ─────────────────────────────────────────────────────────

#[test]
fn log_shows_entries() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("revtrail log (3 entries)"))
        .stdout(predicate::str::contains("User#1"));
}

#[test]
fn log_filters_by_actor() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["log", "--actor", "User:42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revtrail log (1 entries)"));
}

#[test]
fn log_last_limits_entries() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["log", "User", "1", "--last", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revtrail log (2 entries)"));
}

#[test]
fn log_empty_store() {
    let dir = initialized();

    revtrail(&dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries found"));
}

#[test]
fn log_rejects_bad_since() {
    let dir = initialized();

    revtrail(&dir)
        .args(["log", "--since", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date format"));
}

// ─── revision / revisions ────────────────────────────────────────

#[test]
fn revision_by_version() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["revision", "User", "1", "--version", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User#1 @ version 2"))
        .stdout(predicate::str::contains("\"name\": \"Foobar\""))
        .stdout(predicate::str::contains("\"username\": \"brandon\""))
        .stdout(predicate::str::contains("\"version\": 2"));
}

#[test]
fn revision_defaults_to_latest_and_previous_steps_back() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["revision", "User", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Awesome\""));

    revtrail(&dir)
        .args(["revision", "User", "1", "--previous"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Foobar\""));

    revtrail(&dir)
        .args(["revision", "User", "1", "--previous", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Brandon\""));
}

#[test]
fn revision_before_history_is_not_found() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["revision", "User", "1", "--at", "2000-01-01T00:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No revision found"));
}

#[test]
fn revision_rejects_conflicting_targets() {
    let dir = initialized();

    revtrail(&dir)
        .args(["revision", "User", "1", "--version", "1", "--previous"])
        .assert()
        .failure();
}

#[test]
fn revisions_lists_every_state() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["revisions", "User", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User#1 (3 revisions)"))
        .stdout(predicate::str::contains("\"name\": \"Brandon\""))
        .stdout(predicate::str::contains("\"username\": \"keepers\""));

    revtrail(&dir)
        .args(["revisions", "User", "1", "--from", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User#1 (1 revisions)"));
}

#[test]
fn revisions_of_unknown_entity() {
    let dir = initialized();

    revtrail(&dir)
        .args(["revisions", "User", "404"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No revisions recorded"));
}

// ─── prune ───────────────────────────────────────────────────────

#[test]
fn prune_first_record_keeps_later_revisions() {
    let dir = initialized();
    seed_history(&dir);

    revtrail(&dir)
        .args(["prune", "User", "1", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed version 1 of User#1"));

    revtrail(&dir)
        .args(["revision", "User", "1", "--version", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No revision found"));

    revtrail(&dir)
        .args(["revision", "User", "1", "--version", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Foobar\""));

    revtrail(&dir)
        .args(["prune", "User", "1", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User#1 has no version 1"));
}

// ─── configuration ───────────────────────────────────────────────

#[test]
fn declared_types_make_cast_equal_updates_noops() {
    let dir = initialized();
    let config = dir.child(".revtrail/config.toml");
    let mut text = std::fs::read_to_string(config.path()).unwrap();
    text.push_str("\n[entities.User]\nattributes = { logins = \"integer\" }\n");
    config.write_str(&text).unwrap();

    record(&dir, &["User", "1", "create", "--after", r#"{"logins":3}"#]);

    revtrail(&dir)
        .args([
            "record",
            "User",
            "1",
            "update",
            "--before",
            r#"{"logins":3}"#,
            "--after",
            r#"{"logins":"3"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes detected"));
}

#[test]
fn disabled_auditing_records_nothing() {
    let dir = initialized();
    let config = dir.child(".revtrail/config.toml");
    let text = std::fs::read_to_string(config.path())
        .unwrap()
        .replace("enabled = true", "enabled = false");
    config.write_str(&text).unwrap();

    revtrail(&dir)
        .args(["record", "User", "1", "create", "--after", r#"{"name":"x"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Auditing is disabled"));

    let content = std::fs::read_to_string(dir.path().join(".revtrail/audit.log")).unwrap();
    assert!(content.is_empty());
}
