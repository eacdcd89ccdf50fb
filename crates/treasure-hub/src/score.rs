// ABOUTME: Score aggregation - batch subprocess output and the hub-side client
// ABOUTME: Wire format: header line echoing the hunt id, then "<user> <score> <count>" lines

use crate::config::HubConfig;
use anyhow::{bail, Context, Result};
use hunt_store::HuntStore;
use std::process::Stdio;
use tokio::process::Command as ProcessCommand;

/// Aggregated per-user score for one hunt, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScore {
    pub username: String,
    pub total_score: i64,
    pub treasure_count: u64,
}

/// Sum each user's treasure values in the order users first appear.
pub fn aggregate(treasures: &[hunt_store::Treasure]) -> Vec<UserScore> {
    let mut scores: Vec<UserScore> = Vec::new();
    for t in treasures {
        match scores.iter_mut().find(|s| s.username == t.username) {
            Some(s) => {
                s.total_score += t.value;
                s.treasure_count += 1;
            }
            None => scores.push(UserScore {
                username: t.username.clone(),
                total_score: t.value,
                treasure_count: 1,
            }),
        }
    }
    scores
}

/// Batch-mode entry point: compute the score stream for one hunt.
/// A hunt with no treasure file is an error, matching the tool's contract
/// of a nonzero exit with an ERROR line on stderr.
pub fn run_batch(store: &HuntStore, hunt_id: &str) -> Result<String> {
    if !store.treasures_path(hunt_id).exists() {
        bail!("hunt {hunt_id} not found");
    }
    let treasures = store
        .load(hunt_id)
        .with_context(|| format!("failed to load treasures for hunt {hunt_id}"))?;

    let mut out = format!("{hunt_id}\n");
    for s in aggregate(&treasures) {
        out.push_str(&format!(
            "{} {} {}\n",
            s.username, s.total_score, s.treasure_count
        ));
    }
    Ok(out)
}

/// Hub-side client: spawn the score tool as a batch subprocess, parse its
/// stream, and render the table. The wait is bounded by the configured
/// score timeout.
pub async fn calculate(config: &HubConfig, hunt_id: &str) -> Result<String> {
    let exe = std::env::current_exe().context("failed to locate own executable")?;
    let child = ProcessCommand::new(&exe)
        .arg("score")
        .arg(hunt_id)
        .arg("--data-dir")
        .arg(&config.data_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn score tool")?;

    let output = tokio::time::timeout(config.score_timeout(), child.wait_with_output())
        .await
        .context("score tool timed out")?
        .context("failed to collect score tool output")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("score tool failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let scores = parse_scores(&stdout, hunt_id)?;
    Ok(render_table(hunt_id, &scores))
}

/// Parse the score stream: a header echoing the hunt id, then one line
/// per user. Malformed lines are skipped.
pub fn parse_scores(output: &str, hunt_id: &str) -> Result<Vec<UserScore>> {
    let mut lines = output.lines();
    match lines.next() {
        Some(header) if header.trim() == hunt_id => {}
        Some(header) => bail!("score output for wrong hunt: {header:?}"),
        None => bail!("score output missing header"),
    }

    let mut scores = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [username, score, count] = fields.as_slice() else {
            if !line.trim().is_empty() {
                tracing::debug!(line, "skipping malformed score line");
            }
            continue;
        };
        let (Ok(total_score), Ok(treasure_count)) = (score.parse(), count.parse()) else {
            tracing::debug!(line, "skipping malformed score line");
            continue;
        };
        scores.push(UserScore {
            username: username.to_string(),
            total_score,
            treasure_count,
        });
    }
    Ok(scores)
}

/// Render the aligned score table, or the "none recorded" line.
pub fn render_table(hunt_id: &str, scores: &[UserScore]) -> String {
    if scores.is_empty() {
        return format!("No scores recorded for hunt {hunt_id}");
    }

    let user_width = scores
        .iter()
        .map(|s| s.username.len())
        .chain(std::iter::once("USER".len()))
        .max()
        .unwrap_or(4);
    let score_width = scores
        .iter()
        .map(|s| s.total_score.to_string().len())
        .chain(std::iter::once("SCORE".len()))
        .max()
        .unwrap_or(5);

    let mut out = format!("Scores for hunt {hunt_id}:\n");
    out.push_str(&format!(
        "{:<user_width$}  {:>score_width$}  TREASURES\n",
        "USER", "SCORE"
    ));
    for s in scores {
        out.push_str(&format!(
            "{:<user_width$}  {:>score_width$}  {:>9}\n",
            s.username, s.total_score, s.treasure_count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_store::{NewTreasure, Treasure};
    use tempfile::TempDir;

    fn treasure(username: &str, value: i64) -> Treasure {
        Treasure {
            id: 0,
            username: username.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            clue: String::new(),
            value,
        }
    }

    #[test]
    fn aggregate_accumulates_in_first_seen_order() {
        let treasures = vec![
            treasure("bogdan", 10),
            treasure("ana", 5),
            treasure("bogdan", 7),
            treasure("ana", 1),
            treasure("carla", 3),
        ];
        let scores = aggregate(&treasures);
        assert_eq!(
            scores,
            vec![
                UserScore {
                    username: "bogdan".to_string(),
                    total_score: 17,
                    treasure_count: 2,
                },
                UserScore {
                    username: "ana".to_string(),
                    total_score: 6,
                    treasure_count: 2,
                },
                UserScore {
                    username: "carla".to_string(),
                    total_score: 3,
                    treasure_count: 1,
                },
            ]
        );
    }

    #[test]
    fn run_batch_emits_header_then_user_lines() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        store
            .add(
                "alpine",
                NewTreasure {
                    username: "ana".to_string(),
                    latitude: 45.0,
                    longitude: 25.0,
                    clue: "clue".to_string(),
                    value: 12,
                },
            )
            .unwrap();

        let out = run_batch(&store, "alpine").unwrap();
        assert_eq!(out, "alpine\nana 12 1\n");
    }

    #[test]
    fn run_batch_missing_hunt_fails() {
        let dir = TempDir::new().unwrap();
        let store = HuntStore::new(dir.path());
        let err = run_batch(&store, "ghost").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let output = "alpine\nana 12 1\ngarbage line here extra\nonly-two 5\nbogdan 7 2\nx NaN 1\n";
        let scores = parse_scores(output, "alpine").unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].username, "ana");
        assert_eq!(scores[1].username, "bogdan");
        assert_eq!(scores[1].total_score, 7);
    }

    #[test]
    fn parse_rejects_wrong_or_missing_header() {
        assert!(parse_scores("", "alpine").is_err());
        assert!(parse_scores("coastal\nana 1 1\n", "alpine").is_err());
    }

    #[test]
    fn table_aligns_columns() {
        let scores = vec![
            UserScore {
                username: "ana".to_string(),
                total_score: 6,
                treasure_count: 2,
            },
            UserScore {
                username: "bartholomew".to_string(),
                total_score: 12345,
                treasure_count: 1,
            },
        ];
        let table = render_table("alpine", &scores);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Scores for hunt alpine:");
        assert_eq!(lines[1], "USER         SCORE  TREASURES");
        assert_eq!(lines[2], "ana              6          2");
        assert_eq!(lines[3], "bartholomew  12345          1");
    }

    #[test]
    fn empty_table_reports_none_recorded() {
        assert_eq!(
            render_table("alpine", &[]),
            "No scores recorded for hunt alpine"
        );
    }
}
