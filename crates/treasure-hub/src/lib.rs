// ABOUTME: Library surface of the treasure-hub binary
// ABOUTME: Exposes the hub supervisor and subprocess modes for integration tests

pub mod config;
pub mod error;
pub mod escalate;
pub mod hub;
pub mod monitor;
pub mod score;
pub mod shell;
