// ABOUTME: treasure-hub CLI entry point
// ABOUTME: Subcommands: shell (default), monitor, score, and the standalone manager commands

use anyhow::Result;
use clap::{Parser, Subcommand};
use hunt_store::{ops, HuntStore, NewTreasure};
use std::path::PathBuf;
use treasure_hub::config::HubConfig;
use treasure_hub::{monitor, score, shell};

#[derive(Parser)]
#[command(name = "treasure-hub")]
#[command(about = "Treasure hunt store with a supervising hub and monitor worker")]
#[command(version)]
struct Cli {
    /// Path to the hub config file (default: ~/.config/treasure-hub/hub.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the hunt store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive hub shell (the default)
    Shell,

    /// Run the monitor worker event loop (spawned by the hub)
    Monitor,

    /// Emit the per-user score stream for one hunt
    Score { hunt_id: String },

    /// Add a treasure to a hunt
    Add {
        hunt_id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        latitude: f64,
        #[arg(long)]
        longitude: f64,
        #[arg(long)]
        clue: String,
        #[arg(long)]
        value: i64,
    },

    /// List all treasures in a hunt
    List { hunt_id: String },

    /// View one treasure by id
    View {
        hunt_id: String,
        treasure_id: u32,
    },

    /// Remove one treasure by id
    Remove {
        hunt_id: String,
        treasure_id: u32,
    },

    /// Remove a whole hunt
    RemoveHunt { hunt_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = HubConfig::load_or_default(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            treasure_log::init();
            shell::run(config).await
        }
        Commands::Monitor => {
            treasure_log::init_for("treasure_hub");
            monitor::run(config.data_dir).await
        }
        Commands::Score { hunt_id } => {
            treasure_log::init_for("treasure_hub");
            let store = HuntStore::new(&config.data_dir);
            match score::run_batch(&store, &hunt_id) {
                Ok(output) => {
                    print!("{output}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("ERROR: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Add {
            hunt_id,
            username,
            latitude,
            longitude,
            clue,
            value,
        } => {
            treasure_log::init();
            let store = HuntStore::new(&config.data_dir);
            let new = NewTreasure {
                username,
                latitude,
                longitude,
                clue,
                value,
            };
            println!("{}", ops::add_treasure(&store, &hunt_id, new)?);
            Ok(())
        }
        Commands::List { hunt_id } => {
            treasure_log::init();
            let store = HuntStore::new(&config.data_dir);
            println!("{}", ops::list_treasures(&store, &hunt_id)?);
            Ok(())
        }
        Commands::View {
            hunt_id,
            treasure_id,
        } => {
            treasure_log::init();
            let store = HuntStore::new(&config.data_dir);
            println!("{}", ops::view_treasure(&store, &hunt_id, treasure_id)?);
            Ok(())
        }
        Commands::Remove {
            hunt_id,
            treasure_id,
        } => {
            treasure_log::init();
            let store = HuntStore::new(&config.data_dir);
            println!("{}", ops::remove_treasure(&store, &hunt_id, treasure_id)?);
            Ok(())
        }
        Commands::RemoveHunt { hunt_id } => {
            treasure_log::init();
            let store = HuntStore::new(&config.data_dir);
            println!("{}", ops::remove_hunt(&store, &hunt_id)?);
            Ok(())
        }
    }
}
