// ABOUTME: Command verbs and line encoding for the hub/monitor protocol
// ABOUTME: Requests are single lines "<verb> [args...]", responses are framed text

mod frame;

pub use frame::{encode_frame, FrameAssembler, MARKER_LINE};

use thiserror::Error;

/// Errors from encoding or parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("empty command")]
    Empty,

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("missing argument: {0}")]
    MissingArg(&'static str),

    #[error("unexpected extra arguments after '{0}'")]
    ExtraArgs(&'static str),

    #[error("invalid treasure id: {0}")]
    InvalidTreasureId(String),

    #[error("hunt id must not contain whitespace: {0:?}")]
    WhitespaceHuntId(String),
}

/// One request from the hub to the monitor. Serialized as a single
/// `\n`-terminated line; consumed exactly once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListHunts,
    ListTreasures { hunt_id: String },
    ViewTreasure { hunt_id: String, treasure_id: u32 },
    Stop,
}

impl Command {
    /// Wire verb for this command.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::ListHunts => "list_hunts",
            Command::ListTreasures { .. } => "list_treasures",
            Command::ViewTreasure { .. } => "view_treasure",
            Command::Stop => "stop",
        }
    }

    /// Serialize to the single-line wire form (without the trailing newline).
    ///
    /// Hunt ids are rejected if they contain whitespace: arguments are
    /// whitespace-separated on the wire, so such an id could not round-trip.
    pub fn encode(&self) -> Result<String, ProtoError> {
        match self {
            Command::ListHunts | Command::Stop => Ok(self.verb().to_string()),
            Command::ListTreasures { hunt_id } => {
                check_hunt_id(hunt_id)?;
                Ok(format!("{} {}", self.verb(), hunt_id))
            }
            Command::ViewTreasure {
                hunt_id,
                treasure_id,
            } => {
                check_hunt_id(hunt_id)?;
                Ok(format!("{} {} {}", self.verb(), hunt_id, treasure_id))
            }
        }
    }

    /// Parse one command line. Leading/trailing whitespace is ignored;
    /// arguments are split on runs of whitespace.
    pub fn parse(line: &str) -> Result<Self, ProtoError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(ProtoError::Empty)?;
        let cmd = match verb {
            "list_hunts" => {
                reject_extra(&mut parts, "list_hunts")?;
                Command::ListHunts
            }
            "stop" => {
                reject_extra(&mut parts, "stop")?;
                Command::Stop
            }
            "list_treasures" => {
                let hunt_id = parts.next().ok_or(ProtoError::MissingArg("hunt_id"))?;
                reject_extra(&mut parts, "list_treasures")?;
                Command::ListTreasures {
                    hunt_id: hunt_id.to_string(),
                }
            }
            "view_treasure" => {
                let hunt_id = parts.next().ok_or(ProtoError::MissingArg("hunt_id"))?;
                let raw_id = parts.next().ok_or(ProtoError::MissingArg("treasure_id"))?;
                reject_extra(&mut parts, "view_treasure")?;
                let treasure_id = raw_id
                    .parse::<u32>()
                    .map_err(|_| ProtoError::InvalidTreasureId(raw_id.to_string()))?;
                Command::ViewTreasure {
                    hunt_id: hunt_id.to_string(),
                    treasure_id,
                }
            }
            other => return Err(ProtoError::UnknownVerb(other.to_string())),
        };
        Ok(cmd)
    }
}

fn check_hunt_id(hunt_id: &str) -> Result<(), ProtoError> {
    if hunt_id.is_empty() {
        return Err(ProtoError::MissingArg("hunt_id"));
    }
    if hunt_id.contains(char::is_whitespace) {
        return Err(ProtoError::WhitespaceHuntId(hunt_id.to_string()));
    }
    Ok(())
}

fn reject_extra<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    verb: &'static str,
) -> Result<(), ProtoError> {
    if parts.next().is_some() {
        return Err(ProtoError::ExtraArgs(verb));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_bare_verbs() {
        assert_eq!(Command::ListHunts.encode().unwrap(), "list_hunts");
        assert_eq!(Command::Stop.encode().unwrap(), "stop");
    }

    #[test]
    fn encode_with_arguments() {
        let cmd = Command::ListTreasures {
            hunt_id: "alpine".to_string(),
        };
        assert_eq!(cmd.encode().unwrap(), "list_treasures alpine");

        let cmd = Command::ViewTreasure {
            hunt_id: "alpine".to_string(),
            treasure_id: 7,
        };
        assert_eq!(cmd.encode().unwrap(), "view_treasure alpine 7");
    }

    #[test]
    fn encode_rejects_whitespace_hunt_id() {
        let cmd = Command::ListTreasures {
            hunt_id: "two words".to_string(),
        };
        assert_eq!(
            cmd.encode(),
            Err(ProtoError::WhitespaceHuntId("two words".to_string()))
        );
    }

    #[test]
    fn encode_rejects_empty_hunt_id() {
        let cmd = Command::ViewTreasure {
            hunt_id: String::new(),
            treasure_id: 1,
        };
        assert_eq!(cmd.encode(), Err(ProtoError::MissingArg("hunt_id")));
    }

    #[test]
    fn parse_round_trips_every_verb() {
        let commands = vec![
            Command::ListHunts,
            Command::ListTreasures {
                hunt_id: "coastal".to_string(),
            },
            Command::ViewTreasure {
                hunt_id: "coastal".to_string(),
                treasure_id: 42,
            },
            Command::Stop,
        ];
        for cmd in commands {
            let line = cmd.encode().expect("should encode");
            assert_eq!(Command::parse(&line).expect("should parse"), cmd);
        }
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        assert_eq!(
            Command::parse("  list_hunts  ").unwrap(),
            Command::ListHunts
        );
    }

    #[test]
    fn parse_empty_line_fails() {
        assert_eq!(Command::parse(""), Err(ProtoError::Empty));
        assert_eq!(Command::parse("   "), Err(ProtoError::Empty));
    }

    #[test]
    fn parse_unknown_verb_fails() {
        assert_eq!(
            Command::parse("dance"),
            Err(ProtoError::UnknownVerb("dance".to_string()))
        );
    }

    #[test]
    fn parse_missing_arguments_fail() {
        assert_eq!(
            Command::parse("list_treasures"),
            Err(ProtoError::MissingArg("hunt_id"))
        );
        assert_eq!(
            Command::parse("view_treasure alpine"),
            Err(ProtoError::MissingArg("treasure_id"))
        );
    }

    #[test]
    fn parse_extra_arguments_fail() {
        assert_eq!(
            Command::parse("stop now"),
            Err(ProtoError::ExtraArgs("stop"))
        );
        assert_eq!(
            Command::parse("list_treasures alpine extra"),
            Err(ProtoError::ExtraArgs("list_treasures"))
        );
    }

    #[test]
    fn parse_non_numeric_treasure_id_fails() {
        assert_eq!(
            Command::parse("view_treasure alpine seven"),
            Err(ProtoError::InvalidTreasureId("seven".to_string()))
        );
        assert_eq!(
            Command::parse("view_treasure alpine -1"),
            Err(ProtoError::InvalidTreasureId("-1".to_string()))
        );
    }
}
