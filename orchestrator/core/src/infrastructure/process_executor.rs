// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Process Executor
//!
//! Runs one external command with captured output and a two-stage timeout:
//! after `timeout` the child receives SIGTERM, and if it is still alive
//! after the kill grace window it receives SIGKILL.
//!
//! The exit watcher and the escalation timer run as separate tasks. The
//! watcher raises an `exited` flag the moment the child is reaped, before
//! output is drained, and only a SIGTERM delivered to a live child marks the
//! invocation as timed out. The result is published through a
//! [`ResultLatch`], so it is delivered exactly once whichever path gets
//! there first.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `CommandExecutor` on top of `tokio::process`

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::execution::{
    CommandExecutor, CommandSpec, ExecutionResult, FAILURE_EXIT_CODE, KILL_GRACE,
};

/// How long to keep reading pipes after the child is gone. A grandchild
/// that inherited the pipes must not hold the result hostage.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

pub struct ProcessExecutor {
    default_cwd: PathBuf,
    kill_grace: Duration,
}

impl ProcessExecutor {
    pub fn new(default_cwd: impl Into<PathBuf>) -> Self {
        Self {
            default_cwd: default_cwd.into(),
            kill_grace: KILL_GRACE,
        }
    }

    /// Override the SIGTERM -> SIGKILL window
    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.kill_grace = kill_grace;
        self
    }

    pub fn default_cwd(&self) -> &PathBuf {
        &self.default_cwd
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: CommandSpec) -> ExecutionResult {
        let cwd = command
            .cwd
            .clone()
            .unwrap_or_else(|| self.default_cwd.clone());
        let (latch, result_rx) = ResultLatch::new();

        debug!(
            program = %command.program,
            args = ?command.args,
            cwd = %cwd.display(),
            timeout_ms = command.timeout.as_millis() as u64,
            "Spawning command"
        );

        let spawned = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %command.program, error = %e, "Failed to start command");
                latch.resolve(ExecutionResult::launch_failure(format!(
                    "failed to start {}: {}",
                    command.program, e
                )));
                return await_result(result_rx).await;
            }
        };

        let stdout = OutputBuffer::drain(child.stdout.take());
        let stderr = OutputBuffer::drain(child.stderr.take());
        let exited = Arc::new(AtomicBool::new(false));
        let (escalate_tx, escalate_rx) = mpsc::channel(2);

        let watcher = ChildWatcher {
            child,
            escalations: escalate_rx,
            stdout,
            stderr,
            timed_out: false,
            exited: exited.clone(),
            latch,
        };
        tokio::spawn(watcher.run());

        let timer = tokio::spawn(escalate_after(
            command.timeout,
            self.kill_grace,
            escalate_tx,
            exited,
        ));

        let result = await_result(result_rx).await;
        timer.abort();
        result
    }
}

async fn await_result(rx: oneshot::Receiver<ExecutionResult>) -> ExecutionResult {
    rx.await.unwrap_or_else(|_| {
        ExecutionResult::launch_failure("command watcher exited without a result")
    })
}

/// Single-write completion latch shared by every path that can finish an invocation.
pub(crate) struct ResultLatch {
    resolved: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<ExecutionResult>>>,
}

impl ResultLatch {
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<ExecutionResult>) {
        let (tx, rx) = oneshot::channel();
        let latch = Arc::new(Self {
            resolved: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
        });
        (latch, rx)
    }

    /// Returns `false` when another path already resolved the latch.
    pub(crate) fn resolve(&self, result: ExecutionResult) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(result);
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    Terminate,
    Kill,
}

async fn escalate_after(
    timeout: Duration,
    grace: Duration,
    escalations: mpsc::Sender<Escalation>,
    exited: Arc<AtomicBool>,
) {
    tokio::time::sleep(timeout).await;
    if exited.load(Ordering::Acquire) {
        return;
    }
    warn!(
        timeout_ms = timeout.as_millis() as u64,
        "Command timed out, sending SIGTERM"
    );
    if escalations.send(Escalation::Terminate).await.is_err() {
        return;
    }

    tokio::time::sleep(grace).await;
    if exited.load(Ordering::Acquire) {
        return;
    }
    warn!(
        grace_ms = grace.as_millis() as u64,
        "Command ignored SIGTERM, sending SIGKILL"
    );
    let _ = escalations.send(Escalation::Kill).await;
}

struct ChildWatcher {
    child: Child,
    escalations: mpsc::Receiver<Escalation>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    /// Set once SIGTERM has been delivered to the still-running child
    timed_out: bool,
    exited: Arc<AtomicBool>,
    latch: Arc<ResultLatch>,
}

impl ChildWatcher {
    async fn run(mut self) {
        let status = loop {
            tokio::select! {
                biased;
                status = self.child.wait() => break status,
                Some(step) = self.escalations.recv() => self.escalate(step),
            }
        };
        self.exited.store(true, Ordering::Release);

        let (stdout, mut stderr) = tokio::join!(
            self.stdout.finish(OUTPUT_DRAIN_TIMEOUT),
            self.stderr.finish(OUTPUT_DRAIN_TIMEOUT),
        );

        let mut exit_code = match status {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                append_line(&mut stderr, &format!("failed to wait for command: {e}"));
                FAILURE_EXIT_CODE
            }
        };

        if self.timed_out {
            append_line(&mut stderr, "command timed out");
            if exit_code == 0 {
                exit_code = FAILURE_EXIT_CODE;
            }
        }

        self.latch.resolve(ExecutionResult::new(stdout, stderr, exit_code));
    }

    fn escalate(&mut self, step: Escalation) {
        let outcome = match step {
            Escalation::Terminate => {
                self.timed_out = true;
                terminate(&mut self.child)
            }
            Escalation::Kill => self.child.start_kill(),
        };
        if let Err(e) = outcome {
            warn!(?step, error = %e, "Failed to signal command");
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    // `id()` is None once the child has been reaped; nothing left to signal.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    debug!(pid, "Sending SIGTERM");
    let rc = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

fn exit_code_of(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            debug!(?status, "Command ended without an exit code");
            FAILURE_EXIT_CODE
        }
    }
}

fn append_line(buffer: &mut Vec<u8>, line: &str) {
    if !buffer.is_empty() && !buffer.ends_with(b"\n") {
        buffer.push(b'\n');
    }
    buffer.extend_from_slice(line.as_bytes());
}

/// Pipe reader that accumulates into a shared buffer so partial output
/// survives an abandoned drain.
struct OutputBuffer {
    data: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl OutputBuffer {
    fn drain<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let data = Arc::new(Mutex::new(Vec::new()));
        let reader = pipe.map(|mut pipe| {
            let sink = data.clone();
            tokio::spawn(async move {
                let mut chunk = vec![0u8; READ_CHUNK];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            debug!(error = %e, "Output pipe read failed");
                            break;
                        }
                    }
                }
            })
        });
        Self { data, reader }
    }

    async fn finish(mut self, drain_timeout: Duration) -> Vec<u8> {
        if let Some(mut reader) = self.reader.take() {
            if tokio::time::timeout(drain_timeout, &mut reader).await.is_err() {
                debug!("Output still open after exit; keeping what was read");
                reader.abort();
            }
        }
        std::mem::take(&mut *self.data.lock())
    }
}
