// ABOUTME: Escalating stop sequence - grace wait, SIGTERM, SIGKILL, one timer per stage
// ABOUTME: Exits the moment the termination notification arrives; testable without processes

use crate::error::HubError;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::sync::watch;

/// Per-stage grace periods for the stop sequence.
#[derive(Debug, Clone, Copy)]
pub struct GracePeriods {
    /// After writing the `stop` command.
    pub stop: Duration,
    /// After SIGTERM.
    pub term: Duration,
    /// After SIGKILL.
    pub kill: Duration,
}

/// Which stage ended the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Acknowledged the `stop` command and exited on its own.
    Graceful,
    /// Exited after SIGTERM.
    Terminated,
    /// Exited after SIGKILL.
    Killed,
}

impl std::fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopOutcome::Graceful => write!(f, "gracefully"),
            StopOutcome::Terminated => write!(f, "after SIGTERM"),
            StopOutcome::Killed => write!(f, "after SIGKILL"),
        }
    }
}

/// Delivers the escalation signals. Split out so the stage machine can be
/// driven in tests without a real process.
pub trait Signaller {
    fn terminate(&self);
    fn kill(&self);
}

/// Signals a real process by pid.
pub struct PidSignaller {
    pid: i32,
}

impl PidSignaller {
    pub fn new(pid: u32) -> Self {
        Self { pid: pid as i32 }
    }
}

impl Signaller for PidSignaller {
    fn terminate(&self) {
        send_signal(self.pid, libc::SIGTERM);
    }

    fn kill(&self) {
        send_signal(self.pid, libc::SIGKILL);
    }
}

fn send_signal(pid: i32, signal: i32) {
    let rc = unsafe { libc::kill(pid, signal) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: already dead, which is the goal anyway.
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pid, signal, error = %err, "failed to signal monitor");
        }
    }
}

/// Drive the stop sequence after the `stop` command has been written:
/// GraceWait, then SIGTERM and TermWait, then SIGKILL and KillWait.
/// Returns as soon as the exit notification arrives, with the stage that
/// ended the worker.
pub async fn run(
    exit_rx: &mut watch::Receiver<Option<ExitStatus>>,
    graces: GracePeriods,
    signaller: &impl Signaller,
) -> Result<(ExitStatus, StopOutcome), HubError> {
    if let Some(status) = wait_for_exit(exit_rx, graces.stop).await? {
        return Ok((status, StopOutcome::Graceful));
    }

    tracing::warn!("monitor ignored stop command, sending SIGTERM");
    signaller.terminate();
    if let Some(status) = wait_for_exit(exit_rx, graces.term).await? {
        return Ok((status, StopOutcome::Terminated));
    }

    tracing::warn!("monitor survived SIGTERM, sending SIGKILL");
    signaller.kill();
    if let Some(status) = wait_for_exit(exit_rx, graces.kill).await? {
        return Ok((status, StopOutcome::Killed));
    }

    // SIGKILL was delivered but the reap never surfaced. Nothing further
    // to escalate to.
    Err(HubError::Timeout)
}

async fn wait_for_exit(
    exit_rx: &mut watch::Receiver<Option<ExitStatus>>,
    grace: Duration,
) -> Result<Option<ExitStatus>, HubError> {
    let wait = async {
        loop {
            if let Some(status) = *exit_rx.borrow() {
                return Ok(status);
            }
            exit_rx
                .changed()
                .await
                .map_err(|_| HubError::TransportClosed)?;
        }
    };
    match tokio::time::timeout(grace, wait).await {
        Ok(Ok(status)) => Ok(Some(status)),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(None),
    }
}
