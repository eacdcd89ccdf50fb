// ABOUTME: Integration tests for the standalone manager subcommands
// ABOUTME: add/list/view/remove/remove-hunt operate on the store without a monitor

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn run(data_dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_treasure-hub"))
        .args(args)
        .arg("--data-dir")
        .arg(data_dir)
        .output()
        .expect("should run treasure-hub")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn add_args<'a>(hunt_id: &'a str, username: &'a str, value: &'a str) -> Vec<&'a str> {
    vec![
        "add", hunt_id, "--username", username, "--latitude", "45.5", "--longitude", "25.25",
        "--clue", "look up", "--value", value,
    ]
}

#[test]
fn add_view_remove_lifecycle() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &add_args("alpine", "ana", "30"));
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Treasure added successfully with ID: 1\n");

    let output = run(dir.path(), &["view", "alpine", "1"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Username: ana"));
    assert!(text.contains("Location: 45.500000, 25.250000"));
    assert!(text.contains("Clue: look up"));
    assert!(text.contains("Value: 30"));

    let output = run(dir.path(), &["remove", "alpine", "1"]);
    assert_eq!(stdout(&output), "Treasure ID 1 removed successfully.\n");

    let output = run(dir.path(), &["list", "alpine"]);
    assert_eq!(stdout(&output), "No treasures found in hunt: alpine\n");
}

#[test]
fn list_shows_all_treasures_with_header() {
    let dir = TempDir::new().unwrap();
    run(dir.path(), &add_args("alpine", "ana", "10"));
    run(dir.path(), &add_args("alpine", "bogdan", "20"));

    let output = run(dir.path(), &["list", "alpine"]);
    let text = stdout(&output);
    assert!(text.starts_with("Hunt: alpine\nFile size: "));
    assert!(text.contains("\nTreasures:\n"));
    assert!(text.contains("ID: 1\nUsername: ana"));
    assert!(text.contains("ID: 2\nUsername: bogdan"));
}

#[test]
fn remove_hunt_deletes_everything() {
    let dir = TempDir::new().unwrap();
    run(dir.path(), &add_args("alpine", "ana", "10"));

    let output = run(dir.path(), &["remove-hunt", "alpine"]);
    assert_eq!(stdout(&output), "Hunt alpine removed successfully.\n");
    assert!(!dir.path().join("hunts").join("alpine").exists());

    let output = run(dir.path(), &["remove-hunt", "alpine"]);
    assert_eq!(stdout(&output), "Hunt alpine not found\n");
}

#[test]
fn operations_maintain_the_hunt_log_and_symlinks() {
    let dir = TempDir::new().unwrap();
    run(dir.path(), &add_args("alpine", "ana", "10"));
    run(dir.path(), &["view", "alpine", "1"]);

    let per_hunt = std::fs::read_to_string(
        dir.path().join("hunts").join("alpine").join("logged_hunt.txt"),
    )
    .expect("per-hunt log should exist");
    assert!(per_hunt.contains("ADD: Added treasure ID: 1, Username: ana, Value: 10"));
    assert!(per_hunt.contains("VIEW: Viewed treasure ID: 1, Username: ana"));

    let merged = std::fs::read_to_string(dir.path().join("hunt_log.txt"))
        .expect("merged log should exist");
    assert!(merged.contains("=== Log for Hunt: alpine ==="));

    let link = dir.path().join("links_log_hunt").join("logged_hunt-alpine");
    assert!(link.symlink_metadata().is_ok(), "symlink should exist");
}
