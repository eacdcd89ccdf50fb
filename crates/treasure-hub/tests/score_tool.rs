// ABOUTME: Integration tests for the score batch subprocess
// ABOUTME: Runs the real binary in score mode against a seeded temp store

use hunt_store::{HuntStore, NewTreasure};
use std::process::Command;
use tempfile::TempDir;

fn add(store: &HuntStore, hunt_id: &str, username: &str, value: i64) {
    store
        .add(
            hunt_id,
            NewTreasure {
                username: username.to_string(),
                latitude: 45.0,
                longitude: 25.0,
                clue: "clue".to_string(),
                value,
            },
        )
        .expect("should add treasure");
}

fn run_score(data_dir: &std::path::Path, hunt_id: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_treasure-hub"))
        .args(["score", hunt_id, "--data-dir"])
        .arg(data_dir)
        .output()
        .expect("should run score tool")
}

#[test]
fn emits_header_and_first_seen_order_user_lines() {
    let dir = TempDir::new().unwrap();
    let store = HuntStore::new(dir.path());
    add(&store, "alpine", "bogdan", 10);
    add(&store, "alpine", "ana", 5);
    add(&store, "alpine", "bogdan", 7);

    let output = run_score(dir.path(), "alpine");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "alpine\nbogdan 17 2\nana 5 1\n"
    );
}

#[test]
fn empty_hunt_emits_only_the_header() {
    let dir = TempDir::new().unwrap();
    let store = HuntStore::new(dir.path());
    // An existing hunt whose only treasure was removed.
    add(&store, "alpine", "ana", 5);
    store.remove("alpine", 1).unwrap();

    let output = run_score(dir.path(), "alpine");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "alpine\n");
}

#[test]
fn missing_hunt_fails_with_error_on_stderr() {
    let dir = TempDir::new().unwrap();
    let output = run_score(dir.path(), "ghost");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"), "stderr was: {stderr}");
    assert!(stderr.contains("ghost"));
}
