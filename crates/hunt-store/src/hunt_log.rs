// ABOUTME: Hunt-log housekeeping - per-hunt append, merged log rebuild, symlink farm
// ABOUTME: The merged log is rebuilt from scratch on every record, never appended forever

use crate::store::{HuntStore, StoreError};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.into();
    move |source| StoreError::Io { path, source }
}

/// Append one operation line to the hunt's log, then rebuild the merged log
/// and refresh the symlink farm.
pub fn record(
    store: &HuntStore,
    hunt_id: &str,
    operation: &str,
    details: &str,
) -> Result<(), StoreError> {
    append(store, hunt_id, operation, details)?;
    rebuild_merged(store)?;
    refresh_symlinks(store)?;
    Ok(())
}

fn append(
    store: &HuntStore,
    hunt_id: &str,
    operation: &str,
    details: &str,
) -> Result<(), StoreError> {
    let dir = store.hunt_dir(hunt_id);
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let path = store.hunt_log_path(hunt_id);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err(&path))?;

    // ctime-style timestamp, e.g. "Wed Aug 27 14:03:02 2025"
    let timestamp = Local::now().format("%a %b %e %H:%M:%S %Y");
    writeln!(file, "[{timestamp}] {operation}: {details}").map_err(io_err(&path))
}

/// Rebuild `hunt_log.txt` from every per-hunt log, one section per hunt.
pub fn rebuild_merged(store: &HuntStore) -> Result<(), StoreError> {
    let merged_path = store.merged_log_path();
    let mut merged = fs::File::create(&merged_path).map_err(io_err(&merged_path))?;

    for summary in store.list_hunts()? {
        let log_path = store.hunt_log_path(&summary.hunt_id);
        let contents = match fs::read_to_string(&log_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(StoreError::Io {
                path: log_path,
                source: e,
            }),
        };
        write!(
            merged,
            "=== Log for Hunt: {} ===\n{contents}\n",
            summary.hunt_id
        )
        .map_err(io_err(&merged_path))?;
    }
    Ok(())
}

/// Point `links_log_hunt/logged_hunt-<id>` at each existing per-hunt log.
/// Links are relative so the data directory can be moved wholesale.
pub fn refresh_symlinks(store: &HuntStore) -> Result<(), StoreError> {
    let links_dir = store.links_dir();
    fs::create_dir_all(&links_dir).map_err(io_err(&links_dir))?;

    for summary in store.list_hunts()? {
        let hunt_id = &summary.hunt_id;
        if !store.hunt_log_path(hunt_id).exists() {
            continue;
        }
        let link = links_dir.join(format!("logged_hunt-{hunt_id}"));
        let target = PathBuf::from("..")
            .join("hunts")
            .join(hunt_id)
            .join("logged_hunt.txt");

        match fs::remove_file(&link) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io {
                path: link,
                source: e,
            }),
        }
        std::os::unix::fs::symlink(&target, &link).map_err(io_err(&link))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTreasure;
    use tempfile::TempDir;

    fn store_with_hunt(hunt_id: &str) -> (TempDir, HuntStore) {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store
            .add(
                hunt_id,
                NewTreasure {
                    username: "ana".to_string(),
                    latitude: 45.0,
                    longitude: 25.0,
                    clue: "clue".to_string(),
                    value: 10,
                },
            )
            .unwrap();
        (dir, store)
    }

    #[test]
    fn record_appends_timestamped_line() {
        let (_dir, store) = store_with_hunt("alpine");
        record(&store, "alpine", "ADD", "Added treasure ID: 1").unwrap();
        record(&store, "alpine", "LIST", "Listed 1 treasures").unwrap();

        let log = fs::read_to_string(store.hunt_log_path("alpine")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("ADD: Added treasure ID: 1"));
        assert!(lines[1].ends_with("LIST: Listed 1 treasures"));
    }

    #[test]
    fn merged_log_is_rebuilt_not_appended() {
        let (_dir, store) = store_with_hunt("alpine");
        record(&store, "alpine", "ADD", "first").unwrap();
        record(&store, "alpine", "ADD", "second").unwrap();

        let merged = fs::read_to_string(store.merged_log_path()).unwrap();
        // One section header despite two record calls.
        assert_eq!(merged.matches("=== Log for Hunt: alpine ===").count(), 1);
        assert!(merged.contains("first"));
        assert!(merged.contains("second"));
    }

    #[test]
    fn merged_log_sections_per_hunt() {
        let (_dir, store) = store_with_hunt("alpine");
        store
            .add(
                "coastal",
                NewTreasure {
                    username: "bogdan".to_string(),
                    latitude: 44.0,
                    longitude: 28.0,
                    clue: "clue".to_string(),
                    value: 5,
                },
            )
            .unwrap();
        record(&store, "alpine", "ADD", "alpine entry").unwrap();
        record(&store, "coastal", "ADD", "coastal entry").unwrap();

        let merged = fs::read_to_string(store.merged_log_path()).unwrap();
        assert!(merged.contains("=== Log for Hunt: alpine ==="));
        assert!(merged.contains("=== Log for Hunt: coastal ==="));
        assert!(merged.contains("alpine entry"));
        assert!(merged.contains("coastal entry"));
    }

    #[test]
    fn symlink_points_at_per_hunt_log() {
        let (_dir, store) = store_with_hunt("alpine");
        record(&store, "alpine", "ADD", "entry").unwrap();

        let link = store.links_dir().join("logged_hunt-alpine");
        let target = fs::read_link(&link).unwrap();
        assert_eq!(
            target,
            PathBuf::from("../hunts/alpine/logged_hunt.txt")
        );
        // The relative link resolves to the real log.
        assert!(fs::read_to_string(&link).unwrap().contains("entry"));
    }

    #[test]
    fn symlink_survives_refresh() {
        let (_dir, store) = store_with_hunt("alpine");
        record(&store, "alpine", "ADD", "one").unwrap();
        record(&store, "alpine", "ADD", "two").unwrap();

        let link = store.links_dir().join("logged_hunt-alpine");
        assert!(link.exists());
    }

    #[test]
    fn remove_hunt_drops_its_symlink() {
        let (_dir, store) = store_with_hunt("alpine");
        record(&store, "alpine", "ADD", "entry").unwrap();
        let link = store.links_dir().join("logged_hunt-alpine");
        assert!(link.symlink_metadata().is_ok());

        store.remove_hunt("alpine").unwrap();
        assert!(link.symlink_metadata().is_err());
    }
}
