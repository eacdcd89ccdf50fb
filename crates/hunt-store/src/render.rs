// ABOUTME: Canonical response text for store operations
// ABOUTME: Shared by the monitor handlers and the manager subcommands

use crate::model::{HuntMeta, HuntSummary, Treasure};
use std::fmt::Write;

/// One line per hunt, or the single "none found" line.
pub fn hunts_listing(summaries: &[HuntSummary]) -> String {
    if summaries.is_empty() {
        return "No hunts found".to_string();
    }
    summaries
        .iter()
        .map(|s| format!("Hunt: {} ({} treasures)", s.hunt_id, s.treasure_count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full listing: header with file metadata, then one block per treasure
/// with 4-decimal coordinates.
pub fn treasures_listing(hunt_id: &str, meta: &HuntMeta, treasures: &[Treasure]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Hunt: {hunt_id}");
    let _ = writeln!(out, "File size: {} bytes", meta.file_size);
    let _ = writeln!(
        out,
        "Last modified: {}",
        meta.modified.format("%a %b %e %H:%M:%S %Y")
    );
    let _ = writeln!(out);
    let _ = write!(out, "Treasures:");
    for t in treasures {
        let _ = write!(
            out,
            "\n\nID: {}\nUsername: {}\nLocation: {:.4}, {:.4}\nClue: {}\nValue: {}",
            t.id, t.username, t.latitude, t.longitude, t.clue, t.value
        );
    }
    out
}

pub fn no_treasures(hunt_id: &str) -> String {
    format!("No treasures found in hunt: {hunt_id}")
}

/// Single-treasure detail with 6-decimal coordinates.
pub fn treasure_detail(t: &Treasure) -> String {
    format!(
        "Treasure Details:\nID: {}\nUsername: {}\nLocation: {:.6}, {:.6}\nClue: {}\nValue: {}",
        t.id, t.username, t.latitude, t.longitude, t.clue, t.value
    )
}

pub fn treasure_not_found(hunt_id: &str, treasure_id: u32) -> String {
    format!("Treasure with ID {treasure_id} not found in hunt {hunt_id}")
}

pub fn treasure_added(id: u32) -> String {
    format!("Treasure added successfully with ID: {id}")
}

pub fn treasure_removed(id: u32) -> String {
    format!("Treasure ID {id} removed successfully.")
}

pub fn remove_not_found(hunt_id: &str, treasure_id: u32) -> String {
    format!("Treasure ID {treasure_id} not found in hunt {hunt_id}")
}

pub fn no_treasures_to_remove(hunt_id: &str) -> String {
    format!("No treasures to remove in hunt {hunt_id}")
}

pub fn hunt_removed(hunt_id: &str) -> String {
    format!("Hunt {hunt_id} removed successfully.")
}

pub fn hunt_not_found(hunt_id: &str) -> String {
    format!("Hunt {hunt_id} not found")
}
