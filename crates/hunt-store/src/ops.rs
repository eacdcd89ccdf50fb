// ABOUTME: Store operations that return the canonical response text
// ABOUTME: Each logs to the hunt log; failures to log never fail the operation

use crate::hunt_log;
use crate::model::NewTreasure;
use crate::render;
use crate::store::{HuntStore, RemoveResult, StoreError};

fn log_op(store: &HuntStore, hunt_id: &str, operation: &str, details: &str) {
    if let Err(e) = hunt_log::record(store, hunt_id, operation, details) {
        tracing::warn!(hunt_id, operation, error = %e, "failed to record hunt log entry");
    }
}

/// Enumerate hunts with treasure counts.
pub fn list_hunts(store: &HuntStore) -> Result<String, StoreError> {
    let summaries = store.list_hunts()?;
    Ok(render::hunts_listing(&summaries))
}

/// Full treasure listing for one hunt.
pub fn list_treasures(store: &HuntStore, hunt_id: &str) -> Result<String, StoreError> {
    let treasures = store.load(hunt_id)?;
    if treasures.is_empty() {
        log_op(store, hunt_id, "LIST", "No treasures found");
        return Ok(render::no_treasures(hunt_id));
    }
    // The file can vanish between load and stat; treat that as an empty hunt.
    let Some(meta) = store.hunt_meta(hunt_id)? else {
        return Ok(render::no_treasures(hunt_id));
    };
    log_op(
        store,
        hunt_id,
        "LIST",
        &format!("Listed {} treasures", treasures.len()),
    );
    Ok(render::treasures_listing(hunt_id, &meta, &treasures))
}

/// Detail for one treasure by id.
pub fn view_treasure(
    store: &HuntStore,
    hunt_id: &str,
    treasure_id: u32,
) -> Result<String, StoreError> {
    match store.view(hunt_id, treasure_id)? {
        Some(t) => {
            log_op(
                store,
                hunt_id,
                "VIEW",
                &format!("Viewed treasure ID: {}, Username: {}", t.id, t.username),
            );
            Ok(render::treasure_detail(&t))
        }
        None => {
            log_op(
                store,
                hunt_id,
                "VIEW",
                &format!("Failed to view treasure ID: {treasure_id} (not found)"),
            );
            Ok(render::treasure_not_found(hunt_id, treasure_id))
        }
    }
}

/// Add a treasure, assigning the next sequential id.
pub fn add_treasure(
    store: &HuntStore,
    hunt_id: &str,
    new: NewTreasure,
) -> Result<String, StoreError> {
    let username = new.username.clone();
    let value = new.value;
    let id = store.add(hunt_id, new)?;
    log_op(
        store,
        hunt_id,
        "ADD",
        &format!("Added treasure ID: {id}, Username: {username}, Value: {value}"),
    );
    Ok(render::treasure_added(id))
}

/// Remove a treasure by id; the remaining ids are reassigned to 1..n.
pub fn remove_treasure(
    store: &HuntStore,
    hunt_id: &str,
    treasure_id: u32,
) -> Result<String, StoreError> {
    match store.remove(hunt_id, treasure_id)? {
        RemoveResult::Removed { remaining } => {
            log_op(
                store,
                hunt_id,
                "REMOVE",
                &format!("Removed treasure ID: {treasure_id}. Remaining count: {remaining}"),
            );
            Ok(render::treasure_removed(treasure_id))
        }
        RemoveResult::NotFound => {
            log_op(
                store,
                hunt_id,
                "REMOVE",
                &format!("Failed to remove treasure ID: {treasure_id} (not found)"),
            );
            Ok(render::remove_not_found(hunt_id, treasure_id))
        }
        RemoveResult::Empty => {
            log_op(store, hunt_id, "REMOVE", "Failed: No treasures found");
            Ok(render::no_treasures_to_remove(hunt_id))
        }
    }
}

/// Delete a whole hunt, including its log symlink.
pub fn remove_hunt(store: &HuntStore, hunt_id: &str) -> Result<String, StoreError> {
    if store.remove_hunt(hunt_id)? {
        Ok(render::hunt_removed(hunt_id))
    } else {
        Ok(render::hunt_not_found(hunt_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(username: &str, value: i64) -> NewTreasure {
        NewTreasure {
            username: username.to_string(),
            latitude: 45.1234,
            longitude: 25.5678,
            clue: "under the old bridge".to_string(),
            value,
        }
    }

    #[test]
    fn list_hunts_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(list_hunts(&store).unwrap(), "No hunts found");
    }

    #[test]
    fn add_then_view_round_trips_fields() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(
            add_treasure(&store, "alpine", sample("ana", 10)).unwrap(),
            "Treasure added successfully with ID: 1"
        );

        let text = view_treasure(&store, "alpine", 1).unwrap();
        assert!(text.contains("Username: ana"));
        assert!(text.contains("Clue: under the old bridge"));
        assert!(text.contains("Value: 10"));
    }

    #[test]
    fn view_missing_treasure_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(
            view_treasure(&store, "alpine", 3).unwrap(),
            "Treasure with ID 3 not found in hunt alpine"
        );
    }

    #[test]
    fn remove_texts_cover_all_outcomes() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(
            remove_treasure(&store, "alpine", 1).unwrap(),
            "No treasures to remove in hunt alpine"
        );

        add_treasure(&store, "alpine", sample("ana", 10)).unwrap();
        assert_eq!(
            remove_treasure(&store, "alpine", 5).unwrap(),
            "Treasure ID 5 not found in hunt alpine"
        );
        assert_eq!(
            remove_treasure(&store, "alpine", 1).unwrap(),
            "Treasure ID 1 removed successfully."
        );
    }

    #[test]
    fn remove_hunt_texts() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        add_treasure(&store, "alpine", sample("ana", 10)).unwrap();
        assert_eq!(
            remove_hunt(&store, "alpine").unwrap(),
            "Hunt alpine removed successfully."
        );
        assert_eq!(remove_hunt(&store, "alpine").unwrap(), "Hunt alpine not found");
    }

    #[test]
    fn operations_append_to_hunt_log() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        add_treasure(&store, "alpine", sample("ana", 10)).unwrap();
        list_treasures(&store, "alpine").unwrap();

        let log = std::fs::read_to_string(store.hunt_log_path("alpine")).unwrap();
        assert!(log.contains("ADD: Added treasure ID: 1, Username: ana, Value: 10"));
        assert!(log.contains("LIST: Listed 1 treasures"));
    }
}
