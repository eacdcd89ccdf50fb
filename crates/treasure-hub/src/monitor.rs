// ABOUTME: Monitor worker event loop - read one command, dispatch, write framed response
// ABOUTME: Blocks only while idle on stdin; EOF or a stop command ends the loop

use anyhow::{Context, Result};
use hunt_proto::{encode_frame, Command};
use hunt_store::{ops, HuntStore, StoreError};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

/// Run the worker event loop against the store at `data_dir`. Commands
/// arrive one per line on stdin; each yields exactly one framed response
/// on stdout. Returns after `stop` or when the command stream closes.
pub async fn run(data_dir: PathBuf) -> Result<()> {
    let store = HuntStore::new(data_dir);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!(data_dir = %store.root().display(), "monitor event loop started");

    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read command stream")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match Command::parse(line) {
            Ok(Command::Stop) => {
                write_response(&mut stdout, "Monitor stopping").await?;
                tracing::info!("monitor stopping");
                return Ok(());
            }
            Ok(command) => {
                tracing::debug!(verb = command.verb(), "dispatching command");
                handle(&store, &command)
            }
            Err(e) => {
                tracing::warn!(command = line, error = %e, "rejected command");
                format!("ERROR: {e}")
            }
        };
        write_response(&mut stdout, &reply).await?;
    }

    tracing::info!("command stream closed, monitor exiting");
    Ok(())
}

// Handlers produce a String; nothing is ever printed to the worker's own
// stdout except through the framed transport.
fn handle(store: &HuntStore, command: &Command) -> String {
    let result = match command {
        Command::ListHunts => ops::list_hunts(store),
        Command::ListTreasures { hunt_id } => ops::list_treasures(store, hunt_id),
        Command::ViewTreasure {
            hunt_id,
            treasure_id,
        } => ops::view_treasure(store, hunt_id, *treasure_id),
        // Stop never reaches the handlers.
        Command::Stop => Ok("Monitor stopping".to_string()),
    };
    result.unwrap_or_else(|e: StoreError| format!("ERROR: {e}"))
}

async fn write_response(stdout: &mut Stdout, payload: &str) -> Result<()> {
    stdout
        .write_all(encode_frame(payload).as_bytes())
        .await
        .context("failed to write response")?;
    // Flush before the hub can observe data arrival: write-then-notify.
    stdout.flush().await.context("failed to flush response")
}
