// ABOUTME: Data types for treasure records and hunt summaries
// ABOUTME: Serialized with serde_json in hunts/<id>/treasures.json

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One treasure record inside a hunt. Ids are 1-based and kept sequential:
/// removing a treasure reassigns the ids of everything after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: u32,
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub clue: String,
    pub value: i64,
}

/// Field values for a treasure about to be added; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewTreasure {
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub clue: String,
    pub value: i64,
}

/// One hunt as seen by `list_hunts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuntSummary {
    pub hunt_id: String,
    pub treasure_count: usize,
}

/// Treasure-file metadata shown in the listing header.
#[derive(Debug, Clone)]
pub struct HuntMeta {
    pub file_size: u64,
    pub modified: DateTime<Local>,
}
