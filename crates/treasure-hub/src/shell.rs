// ABOUTME: Interactive hub shell - line commands at a "> " prompt
// ABOUTME: Every failure is printed and the loop continues; exit refuses while the monitor runs

use crate::config::HubConfig;
use crate::hub::Hub;
use crate::score;
use anyhow::{Context, Result};
use hunt_proto::Command;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type InputLines = Lines<BufReader<Stdin>>;

/// Run the interactive shell until `exit` or end of input.
pub async fn run(config: HubConfig) -> Result<()> {
    let hub = Hub::new(config.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("> ")?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            // Input closed; best-effort stop so no orphan monitor survives.
            if hub.is_running() {
                tracing::info!("input closed, stopping monitor");
                if let Err(e) = hub.stop().await {
                    tracing::warn!(error = %e, "failed to stop monitor on exit");
                }
            }
            break;
        };

        match line.trim() {
            "" => {}
            "start_monitor" => match hub.spawn().await {
                Ok(pid) => println!("Monitor started with PID: {pid}"),
                Err(e) => println!("Error: {e}"),
            },
            "stop_monitor" => {
                println!("Waiting for monitor to terminate...");
                match hub.stop().await {
                    Ok(report) => {
                        if let Some(text) = report.final_response {
                            println!("{text}");
                        }
                        println!("Monitor terminated {} ({})", report.outcome, report.status);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "list_hunts" => dispatch(&hub, Command::ListHunts).await,
            "list_treasures" => {
                if let Some(hunt_id) = ask(&mut lines, "Enter hunt ID: ").await? {
                    dispatch(&hub, Command::ListTreasures { hunt_id }).await;
                }
            }
            "view_treasure" => {
                let Some(hunt_id) = ask(&mut lines, "Enter hunt ID: ").await? else {
                    continue;
                };
                let Some(raw_id) = ask(&mut lines, "Enter treasure ID: ").await? else {
                    continue;
                };
                match raw_id.parse::<u32>() {
                    Ok(treasure_id) => {
                        dispatch(
                            &hub,
                            Command::ViewTreasure {
                                hunt_id,
                                treasure_id,
                            },
                        )
                        .await
                    }
                    Err(_) => println!("Error: invalid treasure ID: {raw_id}"),
                }
            }
            "calculate_score" => {
                if let Some(hunt_id) = ask(&mut lines, "Enter hunt ID: ").await? {
                    match score::calculate(&config, &hunt_id).await {
                        Ok(table) => println!("{table}"),
                        Err(e) => println!("Error: {e:#}"),
                    }
                }
            }
            "exit" => {
                if hub.is_running() {
                    println!("Error: Monitor is still running. Please stop it first.");
                } else {
                    break;
                }
            }
            _ => println!("Unknown command"),
        }
    }

    Ok(())
}

async fn dispatch(hub: &Hub, command: Command) {
    match hub.dispatch(&command).await {
        Ok(response) => println!("{}", response.text),
        Err(e) => println!("Error: {e}"),
    }
}

// Returns None on end of input or a blank answer.
async fn ask(lines: &mut InputLines, question: &str) -> Result<Option<String>> {
    prompt(question)?;
    let answer = lines
        .next_line()
        .await
        .context("failed to read input")?
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    Ok(answer)
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush().context("failed to flush prompt")
}
