//! Engine child process spoken to over stdio.
//!
//! Requests are written to the child's stdin and notifications read from its
//! stdout, one JSON object per line. Two pump tasks move the bytes; neither
//! touches mirror state, so a slow engine never stalls the UI.

use std::path::PathBuf;
use std::process::Stdio;

use stagehand_core::protocol::{Notification, Request};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::service::{BridgeError, Service};

/// How to start the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl EngineCommand {
    /// Build from an argv list: program first, then its arguments.
    pub fn from_argv(argv: &[String]) -> Result<Self, BridgeError> {
        let (program, args) = argv.split_first().ok_or(BridgeError::NoEngine)?;
        if program.is_empty() {
            return Err(BridgeError::NoEngine);
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: None,
        })
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }
}

/// A running engine. Dropping it stops the pumps and kills the child.
pub struct EngineProcess {
    requests: mpsc::UnboundedSender<Request>,
    cancel: CancellationToken,
}

impl EngineProcess {
    /// Start the engine on `handle`'s runtime. Notifications arrive on the
    /// returned receiver in the order the engine wrote them; the channel
    /// closes when the engine's stdout does.
    pub fn spawn(
        handle: &Handle,
        command: &EngineCommand,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), BridgeError> {
        let _guard = handle.enter();

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or(BridgeError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(BridgeError::MissingPipe("stdout"))?;
        tracing::info!(program = %command.program, pid = ?child.id(), "engine started");

        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (note_tx, note_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        handle.spawn(write_requests(stdin, req_rx, cancel.clone()));
        handle.spawn(read_notifications(stdout, note_tx, cancel.clone()));
        handle.spawn(supervise(child, cancel.clone()));

        Ok((
            Self {
                requests: req_tx,
                cancel,
            },
            note_rx,
        ))
    }

    /// Stop the pumps and kill the engine.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Service for EngineProcess {
    fn send(&self, request: Request) -> Result<(), BridgeError> {
        tracing::debug!(?request, "request");
        self.requests.send(request).map_err(|_| BridgeError::Closed)
    }
}

async fn write_requests(
    mut stdin: ChildStdin,
    mut requests: mpsc::UnboundedReceiver<Request>,
    cancel: CancellationToken,
) {
    loop {
        let request = tokio::select! {
            _ = cancel.cancelled() => break,
            next = requests.recv() => match next {
                Some(r) => r,
                None => break,
            },
        };
        let mut line = match serde_json::to_string(&request) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode request");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = write_line(&mut stdin, &line).await {
            tracing::warn!(error = %e, "engine stdin closed");
            break;
        }
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}

async fn read_notifications(
    stdout: ChildStdout,
    notifications: mpsc::UnboundedSender<Notification>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next_line() => match next {
                Ok(Some(line)) => line,
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::warn!(error = %e, "engine stdout read failed");
                    break;
                }
            },
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Notification>(trimmed) {
            Ok(n) => {
                if notifications.send(n).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, line = trimmed, "skipping engine line"),
        }
    }
    tracing::debug!("notification pump stopped");
}

async fn supervise(mut child: Child, cancel: CancellationToken) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => tracing::info!(%status, "engine exited"),
            Err(e) => tracing::warn!(error = %e, "failed to wait for engine"),
        },
        _ = cancel.cancelled() => {
            child.kill().await.ok();
            tracing::info!("engine stopped");
        }
    }
}
