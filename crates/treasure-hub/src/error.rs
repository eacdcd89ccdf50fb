// ABOUTME: Typed errors for hub supervisor operations
// ABOUTME: Every variant is local to one operation; none is fatal to the hub

use hunt_proto::ProtoError;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors surfaced by `Hub` operations. Lifecycle errors leave existing
/// state untouched; `Timeout` marks one stale response owed; `WorkerDied`
/// is kept distinct from `Timeout` so callers can tell "no answer in time"
/// from "the process is gone".
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Monitor is not running")]
    NotRunning,

    #[error("a command is already in flight")]
    Busy,

    #[error("timed out waiting for the monitor")]
    Timeout,

    #[error("monitor process died (exit status: {0:?})")]
    WorkerDied(Option<ExitStatus>),

    #[error("failed to spawn monitor: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("transport to the monitor closed unexpectedly")]
    TransportClosed,

    #[error("malformed response from the monitor: {0}")]
    MalformedResponse(String),

    #[error("invalid command: {0}")]
    InvalidCommand(#[from] ProtoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_render_shell_messages() {
        assert_eq!(
            HubError::AlreadyRunning.to_string(),
            "Monitor is already running"
        );
        assert_eq!(HubError::NotRunning.to_string(), "Monitor is not running");
    }

    #[test]
    fn worker_died_mentions_exit_status() {
        let err = HubError::WorkerDied(None);
        assert!(err.to_string().contains("died"));
    }

    #[test]
    fn proto_errors_convert() {
        let err: HubError = ProtoError::Empty.into();
        assert!(matches!(err, HubError::InvalidCommand(ProtoError::Empty)));
    }
}
