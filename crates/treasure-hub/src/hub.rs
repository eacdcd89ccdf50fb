// ABOUTME: Hub supervisor - spawns the monitor, dispatches commands, runs the stop sequence
// ABOUTME: Single in-flight command enforced by a busy flag; reader/reaper tasks post notifications

use crate::config::HubConfig;
use crate::error::HubError;
use crate::escalate::{self, PidSignaller, StopOutcome};
use hunt_proto::{Command, FrameAssembler};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout, Command as ProcessCommand};
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;

/// The worker's reply to one command: the framed payload text, read once
/// and discarded after display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
}

/// What `stop` observed: the stage that ended the worker, its exit status,
/// and any final response the worker managed to write.
#[derive(Debug)]
pub struct StopReport {
    pub outcome: StopOutcome,
    pub status: ExitStatus,
    pub final_response: Option<String>,
}

// Flags shared with the reaper tasks. `busy` is written only through
// BusyGuard on the caller path; `running` is set true by spawn and false
// by the reaper of the same generation.
struct Shared {
    busy: AtomicBool,
    running: AtomicBool,
    generation: AtomicU64,
}

// Clears busy on every exit path, including panics and early returns.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn claim(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// One spawned monitor process: pid, transport endpoints, and the
/// notification channels fed by the reader and reaper tasks.
struct WorkerHandle {
    pid: u32,
    stdin: ChildStdin,
    responses: mpsc::Receiver<String>,
    exit_rx: watch::Receiver<Option<ExitStatus>>,
    /// Responses owed by timed-out dispatches, to be drained and discarded
    /// before they can be attributed to a later command.
    stale_owed: usize,
}

/// Supervisor for the monitor worker. All mutable state lives here; the
/// interactive caller and the notification tasks coordinate through the
/// busy/running flags and the handle mutex.
pub struct Hub {
    config: HubConfig,
    shared: Arc<Shared>,
    worker: Arc<tokio::sync::Mutex<Option<WorkerHandle>>>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                busy: AtomicBool::new(false),
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
            worker: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// True while a spawned monitor has not yet been reaped.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// True while a worker handle still holds transport resources (pipes,
    /// channels). Goes false shortly after the worker is reaped.
    pub async fn has_transport(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Launch the monitor worker with piped stdin/stdout/stderr and install
    /// the reader, stderr-forwarder, and reaper tasks. Returns the pid.
    pub async fn spawn(&self) -> Result<u32, HubError> {
        if self.is_running() {
            return Err(HubError::AlreadyRunning);
        }
        let mut worker = self.worker.lock().await;
        if let Some(old) = worker.take() {
            tracing::debug!(pid = old.pid, "discarding dead monitor handle");
        }

        let (program, args) = self.monitor_invocation()?;
        tracing::debug!(program = %program.display(), ?args, "launching monitor");
        let mut child = ProcessCommand::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(HubError::SpawnFailed)?;

        let pid = child
            .id()
            .ok_or_else(|| HubError::SpawnFailed(broken_pipe("monitor exited during spawn")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HubError::SpawnFailed(broken_pipe("monitor stdin not piped")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HubError::SpawnFailed(broken_pipe("monitor stdout not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| HubError::SpawnFailed(broken_pipe("monitor stderr not piped")))?;

        let (resp_tx, resp_rx) = mpsc::channel(16);
        tokio::spawn(read_responses(stdout, resp_tx));
        tokio::spawn(forward_stderr(stderr));

        // The reaper posts the exit status on a latched watch channel and
        // clears `running` - but only for its own generation, so a late
        // reap of a previous worker cannot clobber a fresh spawn.
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.busy.store(false, Ordering::SeqCst);
        self.shared.running.store(true, Ordering::SeqCst);

        let (exit_tx, exit_rx) = watch::channel(None);
        let shared = self.shared.clone();
        let slot = self.worker.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => {
                    tracing::info!(pid, %status, "monitor exited");
                    Some(status)
                }
                Err(e) => {
                    tracing::warn!(pid, error = %e, "failed to reap monitor");
                    None
                }
            };
            // Cleared before the exit status is published: anyone woken by
            // the watch channel must already observe running == false.
            if shared.generation.load(Ordering::SeqCst) == generation {
                shared.running.store(false, Ordering::SeqCst);
            }
            if let Some(status) = status {
                let _ = exit_tx.send(Some(status));
            }
            // Release the dead worker's transport. Taken only after the
            // send: a parked dispatch holds the lock until the exit status
            // wakes it.
            let mut slot = slot.lock().await;
            if shared.generation.load(Ordering::SeqCst) == generation && slot.is_some() {
                *slot = None;
                tracing::debug!(pid, "released dead monitor transport");
            }
        });

        *worker = Some(WorkerHandle {
            pid,
            stdin,
            responses: resp_rx,
            exit_rx,
            stale_owed: 0,
        });
        tracing::info!(pid, "monitor started");
        Ok(pid)
    }

    /// Send one command and wait for its response, bounded by the
    /// configured dispatch timeout.
    pub async fn dispatch(&self, command: &Command) -> Result<Response, HubError> {
        self.dispatch_with_timeout(command, self.config.dispatch_timeout())
            .await
    }

    /// Send one command and wait up to `timeout` for its response.
    ///
    /// Rejected with `Busy` (no side effects) while a prior dispatch is
    /// outstanding. On `Timeout` the worker is not cancelled; its late
    /// response is owed as stale and will be drained, never attributed to
    /// a later command.
    pub async fn dispatch_with_timeout(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, HubError> {
        if !self.is_running() {
            return Err(HubError::NotRunning);
        }
        let _guard = BusyGuard::claim(&self.shared.busy).ok_or(HubError::Busy)?;
        let mut worker = self.worker.lock().await;
        let handle = worker.as_mut().ok_or(HubError::NotRunning)?;

        drain_stale(handle);

        let wire = command.encode()?;
        if let Err(e) = write_line(&mut handle.stdin, &wire).await {
            tracing::debug!(error = %e, "command write failed");
            return Err(death_or_closed(&mut handle.exit_rx).await);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // The select only names an event; handle mutation happens
            // below, once the competing futures have been dropped.
            let event = {
                let responses = &mut handle.responses;
                let exit_rx = &mut handle.exit_rx;
                tokio::select! {
                    biased;
                    resp = responses.recv() => WaitEvent::Response(resp),
                    status = wait_exit(exit_rx) => WaitEvent::Died(status),
                    _ = tokio::time::sleep_until(deadline) => WaitEvent::TimedOut,
                }
            };

            match event {
                WaitEvent::Response(Some(payload)) => {
                    if handle.stale_owed > 0 {
                        handle.stale_owed -= 1;
                        tracing::debug!("discarded stale monitor response");
                        continue;
                    }
                    if payload.contains('\0') {
                        return Err(HubError::MalformedResponse(
                            "embedded NUL in response".to_string(),
                        ));
                    }
                    return Ok(Response { text: payload });
                }
                WaitEvent::Response(None) => {
                    return Err(death_or_closed(&mut handle.exit_rx).await)
                }
                WaitEvent::Died(status) => {
                    // The worker may have flushed our response just before
                    // dying; prefer it over reporting the death.
                    while let Ok(payload) = handle.responses.try_recv() {
                        if handle.stale_owed > 0 {
                            handle.stale_owed -= 1;
                            continue;
                        }
                        return Ok(Response { text: payload });
                    }
                    return Err(HubError::WorkerDied(status));
                }
                WaitEvent::TimedOut => {
                    handle.stale_owed += 1;
                    tracing::warn!(command = command.verb(), "dispatch timed out");
                    return Err(HubError::Timeout);
                }
            }
        }
    }

    /// Cooperative stop with escalating termination: write `stop`, then
    /// run GraceWait -> SIGTERM -> SIGKILL until the exit notification
    /// arrives. Returns once the worker is confirmed dead.
    pub async fn stop(&self) -> Result<StopReport, HubError> {
        if !self.is_running() {
            return Err(HubError::NotRunning);
        }
        let _guard = BusyGuard::claim(&self.shared.busy).ok_or(HubError::Busy)?;
        let mut worker = self.worker.lock().await;
        let Some(mut handle) = worker.take() else {
            return Err(HubError::NotRunning);
        };

        let wire = Command::Stop.encode()?;
        if let Err(e) = write_line(&mut handle.stdin, &wire).await {
            // Worker already unreachable; the escalation still settles it.
            tracing::debug!(error = %e, "stop command write failed");
        }

        let signaller = PidSignaller::new(handle.pid);
        let (status, outcome) =
            match escalate::run(&mut handle.exit_rx, self.config.grace_periods(), &signaller).await
            {
                Ok(done) => done,
                Err(e) => {
                    *worker = Some(handle);
                    return Err(e);
                }
            };

        // The child is dead, so its stdout pipe is closed and the reader
        // task finishes after draining; recv() returning None bounds this.
        let mut final_response = None;
        while let Some(payload) = handle.responses.recv().await {
            if handle.stale_owed > 0 {
                handle.stale_owed -= 1;
                continue;
            }
            final_response = Some(payload);
        }

        tracing::info!(pid = handle.pid, %outcome, "monitor stopped");
        Ok(StopReport {
            outcome,
            status,
            final_response,
        })
    }

    fn monitor_invocation(&self) -> Result<(PathBuf, Vec<String>), HubError> {
        if let Some(program) = &self.config.monitor_program {
            let args = self.config.monitor_args.clone().unwrap_or_default();
            return Ok((program.clone(), args));
        }
        let exe = std::env::current_exe().map_err(HubError::SpawnFailed)?;
        Ok((
            exe,
            vec![
                "monitor".to_string(),
                "--data-dir".to_string(),
                self.config.data_dir.display().to_string(),
            ],
        ))
    }
}

// How long a closed transport may precede the child's reap notification.
const REAP_WINDOW: Duration = Duration::from_millis(500);

// One wake observed while a dispatch is parked.
enum WaitEvent {
    Response(Option<String>),
    Died(Option<ExitStatus>),
    TimedOut,
}

fn broken_pipe(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, message.to_string())
}

fn drain_stale(handle: &mut WorkerHandle) {
    while handle.stale_owed > 0 {
        match handle.responses.try_recv() {
            Ok(_) => {
                handle.stale_owed -= 1;
                tracing::debug!("discarded stale monitor response");
            }
            Err(_) => break,
        }
    }
}

// A closed pipe usually means the worker died; give the reaper a short
// window to confirm so death is reported as WorkerDied, not TransportClosed.
async fn death_or_closed(exit_rx: &mut watch::Receiver<Option<ExitStatus>>) -> HubError {
    match tokio::time::timeout(REAP_WINDOW, wait_exit(exit_rx)).await {
        Ok(Some(status)) => HubError::WorkerDied(Some(status)),
        Ok(None) | Err(_) => HubError::TransportClosed,
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

// Resolves once the exit status is latched; None if the reaper vanished
// without reporting one.
async fn wait_exit(exit_rx: &mut watch::Receiver<Option<ExitStatus>>) -> Option<ExitStatus> {
    loop {
        if let Some(status) = *exit_rx.borrow() {
            return Some(status);
        }
        if exit_rx.changed().await.is_err() {
            return None;
        }
    }
}

// Assembles framed responses from the worker's stdout and posts each
// completed payload as a response-ready notification.
async fn read_responses(stdout: ChildStdout, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stdout).lines();
    let mut assembler = FrameAssembler::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(payload) = assembler.push_line(&line) {
                    if tx.send(payload).await.is_err() {
                        return;
                    }
                }
            }
            Ok(None) => {
                if assembler.in_progress() {
                    tracing::debug!("monitor stdout closed mid-frame");
                }
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading monitor stdout");
                return;
            }
        }
    }
}

// The worker's stderr carries its tracing output; surface it at debug.
async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.is_empty() {
            tracing::debug!(monitor = %line, "monitor stderr");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> Hub {
        Hub::new(HubConfig::default())
    }

    #[tokio::test]
    async fn dispatch_before_spawn_is_not_running() {
        let hub = hub();
        for _ in 0..3 {
            let err = hub.dispatch(&Command::ListHunts).await.unwrap_err();
            assert!(matches!(err, HubError::NotRunning));
        }
    }

    #[tokio::test]
    async fn stop_before_spawn_is_not_running() {
        let err = hub().stop().await.unwrap_err();
        assert!(matches!(err, HubError::NotRunning));
    }

    #[tokio::test]
    async fn spawn_failure_leaves_hub_usable() {
        let hub = Hub::new(HubConfig {
            monitor_program: Some(PathBuf::from("/nonexistent/monitor-binary")),
            ..HubConfig::default()
        });
        let err = hub.spawn().await.unwrap_err();
        assert!(matches!(err, HubError::SpawnFailed(_)));
        assert!(!hub.is_running());

        // Still rejects dispatches cleanly rather than being wedged.
        let err = hub.dispatch(&Command::ListHunts).await.unwrap_err();
        assert!(matches!(err, HubError::NotRunning));
    }

    #[test]
    fn busy_guard_is_exclusive_and_clears_on_drop() {
        let busy = AtomicBool::new(false);
        let guard = BusyGuard::claim(&busy).expect("should claim");
        assert!(BusyGuard::claim(&busy).is_none());
        drop(guard);
        assert!(BusyGuard::claim(&busy).is_some());
    }
}
