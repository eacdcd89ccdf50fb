// ABOUTME: HuntStore - flat-file CRUD over hunts/<id>/treasures.json
// ABOUTME: Missing files read as empty hunts; ids stay 1..n after removals

use crate::model::{HuntMeta, HuntSummary, NewTreasure, Treasure};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from store I/O or record decoding.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid treasure file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of a `remove` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveResult {
    /// Treasure deleted; ids reassigned; this many remain.
    Removed { remaining: usize },
    /// Hunt has treasures, but none with the requested id.
    NotFound,
    /// Hunt has no treasures at all.
    Empty,
}

/// Flat-file treasure store rooted at a data directory:
///
/// ```text
/// <root>/hunts/<hunt_id>/treasures.json
/// <root>/hunts/<hunt_id>/logged_hunt.txt
/// <root>/hunt_log.txt
/// <root>/links_log_hunt/logged_hunt-<hunt_id>
/// ```
#[derive(Debug, Clone)]
pub struct HuntStore {
    root: PathBuf,
}

impl HuntStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hunts_dir(&self) -> PathBuf {
        self.root.join("hunts")
    }

    pub fn hunt_dir(&self, hunt_id: &str) -> PathBuf {
        self.hunts_dir().join(hunt_id)
    }

    pub fn treasures_path(&self, hunt_id: &str) -> PathBuf {
        self.hunt_dir(hunt_id).join("treasures.json")
    }

    pub fn hunt_log_path(&self, hunt_id: &str) -> PathBuf {
        self.hunt_dir(hunt_id).join("logged_hunt.txt")
    }

    pub fn merged_log_path(&self) -> PathBuf {
        self.root.join("hunt_log.txt")
    }

    pub fn links_dir(&self) -> PathBuf {
        self.root.join("links_log_hunt")
    }

    /// Enumerate hunts, sorted by id, each with its treasure count.
    /// A missing hunts directory is simply an empty store.
    pub fn list_hunts(&self) -> Result<Vec<HuntSummary>, StoreError> {
        let hunts_dir = self.hunts_dir();
        let entries = match fs::read_dir(&hunts_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(hunts_dir, e)),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&hunts_dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| StoreError::io(entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            let hunt_id = entry.file_name().to_string_lossy().to_string();
            let treasure_count = self.load(&hunt_id)?.len();
            summaries.push(HuntSummary {
                hunt_id,
                treasure_count,
            });
        }
        summaries.sort_by(|a, b| a.hunt_id.cmp(&b.hunt_id));
        Ok(summaries)
    }

    /// Load all treasures for a hunt. A hunt with no treasure file is empty.
    pub fn load(&self, hunt_id: &str) -> Result<Vec<Treasure>, StoreError> {
        let path = self.treasures_path(hunt_id);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_str(&data).map_err(|source| StoreError::Format { path, source })
    }

    /// Persist the full treasure list for a hunt, creating its directory.
    pub fn save(&self, hunt_id: &str, treasures: &[Treasure]) -> Result<(), StoreError> {
        let dir = self.hunt_dir(hunt_id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let path = self.treasures_path(hunt_id);
        let data = serde_json::to_string_pretty(treasures).map_err(|source| {
            StoreError::Format {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, data).map_err(|e| StoreError::io(path, e))
    }

    /// Append a new treasure; its id is the current count plus one.
    pub fn add(&self, hunt_id: &str, new: NewTreasure) -> Result<u32, StoreError> {
        let mut treasures = self.load(hunt_id)?;
        let id = treasures.len() as u32 + 1;
        treasures.push(Treasure {
            id,
            username: new.username,
            latitude: new.latitude,
            longitude: new.longitude,
            clue: new.clue,
            value: new.value,
        });
        self.save(hunt_id, &treasures)?;
        Ok(id)
    }

    /// Look up one treasure by id.
    pub fn view(&self, hunt_id: &str, treasure_id: u32) -> Result<Option<Treasure>, StoreError> {
        let treasures = self.load(hunt_id)?;
        Ok(treasures.into_iter().find(|t| t.id == treasure_id))
    }

    /// Remove one treasure by id, reassigning the remaining ids to 1..n.
    pub fn remove(&self, hunt_id: &str, treasure_id: u32) -> Result<RemoveResult, StoreError> {
        let mut treasures = self.load(hunt_id)?;
        if treasures.is_empty() {
            return Ok(RemoveResult::Empty);
        }
        let Some(pos) = treasures.iter().position(|t| t.id == treasure_id) else {
            return Ok(RemoveResult::NotFound);
        };
        treasures.remove(pos);
        for (i, t) in treasures.iter_mut().enumerate() {
            t.id = i as u32 + 1;
        }
        self.save(hunt_id, &treasures)?;
        Ok(RemoveResult::Removed {
            remaining: treasures.len(),
        })
    }

    /// Delete a hunt directory and its log symlink. Returns false if the
    /// hunt did not exist.
    pub fn remove_hunt(&self, hunt_id: &str) -> Result<bool, StoreError> {
        let dir = self.hunt_dir(hunt_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::io(dir, e)),
        }
        let link = self.links_dir().join(format!("logged_hunt-{hunt_id}"));
        match fs::remove_file(&link) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(link, e)),
        }
        Ok(true)
    }

    /// Size and mtime of a hunt's treasure file, for the listing header.
    pub fn hunt_meta(&self, hunt_id: &str) -> Result<Option<HuntMeta>, StoreError> {
        let path = self.treasures_path(hunt_id);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let modified = meta
            .modified()
            .map_err(|e| StoreError::io(&path, e))
            .map(DateTime::<Local>::from)?;
        Ok(Some(HuntMeta {
            file_size: meta.len(),
            modified,
        }))
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
    fn empty_store_lists_no_hunts() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert!(store.list_hunts().unwrap().is_empty());
        assert!(store.load("alpine").unwrap().is_empty());
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(store.add("alpine", sample("ana", 10)).unwrap(), 1);
        assert_eq!(store.add("alpine", sample("bogdan", 20)).unwrap(), 2);
        assert_eq!(store.add("alpine", sample("ana", 30)).unwrap(), 3);

        let treasures = store.load("alpine").unwrap();
        assert_eq!(treasures.len(), 3);
        assert_eq!(treasures[2].id, 3);
        assert_eq!(treasures[2].value, 30);
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = HuntStore::new(dir.path());
            store.add("alpine", sample("ana", 10)).unwrap();
        }
        let store = HuntStore::new(dir.path());
        let treasures = store.load("alpine").unwrap();
        assert_eq!(treasures.len(), 1);
        assert_eq!(treasures[0].username, "ana");
        assert_eq!(treasures[0].clue, "under the old bridge");
    }

    #[test]
    fn view_finds_by_id() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store.add("alpine", sample("ana", 10)).unwrap();
        store.add("alpine", sample("bogdan", 20)).unwrap();

        let t = store.view("alpine", 2).unwrap().expect("should exist");
        assert_eq!(t.username, "bogdan");
        assert!(store.view("alpine", 9).unwrap().is_none());
        assert!(store.view("nowhere", 1).unwrap().is_none());
    }

    #[test]
    fn remove_reassigns_ids_sequentially() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store.add("alpine", sample("ana", 10)).unwrap();
        store.add("alpine", sample("bogdan", 20)).unwrap();
        store.add("alpine", sample("carla", 30)).unwrap();

        assert_eq!(
            store.remove("alpine", 2).unwrap(),
            RemoveResult::Removed { remaining: 2 }
        );
        let treasures = store.load("alpine").unwrap();
        assert_eq!(treasures[0].id, 1);
        assert_eq!(treasures[0].username, "ana");
        assert_eq!(treasures[1].id, 2);
        assert_eq!(treasures[1].username, "carla");
    }

    #[test]
    fn remove_distinguishes_missing_from_empty() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert_eq!(store.remove("alpine", 1).unwrap(), RemoveResult::Empty);

        store.add("alpine", sample("ana", 10)).unwrap();
        assert_eq!(store.remove("alpine", 9).unwrap(), RemoveResult::NotFound);
    }

    #[test]
    fn list_hunts_sorted_with_counts() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store.add("coastal", sample("ana", 10)).unwrap();
        store.add("alpine", sample("ana", 10)).unwrap();
        store.add("alpine", sample("bogdan", 20)).unwrap();

        let summaries = store.list_hunts().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].hunt_id, "alpine");
        assert_eq!(summaries[0].treasure_count, 2);
        assert_eq!(summaries[1].hunt_id, "coastal");
        assert_eq!(summaries[1].treasure_count, 1);
    }

    #[test]
    fn remove_hunt_deletes_directory() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store.add("alpine", sample("ana", 10)).unwrap();

        assert!(store.remove_hunt("alpine").unwrap());
        assert!(!store.hunt_dir("alpine").exists());
        assert!(!store.remove_hunt("alpine").unwrap());
    }

    #[test]
    fn hunt_meta_reports_size_for_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        assert!(store.hunt_meta("alpine").unwrap().is_none());

        store.add("alpine", sample("ana", 10)).unwrap();
        let meta = store.hunt_meta("alpine").unwrap().expect("should exist");
        assert!(meta.file_size > 0);
    }
}
