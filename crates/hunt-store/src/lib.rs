// ABOUTME: Flat-file treasure record store and its housekeeping
// ABOUTME: Store CRUD, hunt-log append/merge/symlinks, and canonical response text

mod hunt_log;
mod model;
pub mod ops;
pub mod render;
mod store;

pub use model::{HuntMeta, HuntSummary, NewTreasure, Treasure};
pub use store::{HuntStore, RemoveResult, StoreError};
