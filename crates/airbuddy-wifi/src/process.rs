//! Background commands owned by a capture.
//!
//! Every command is started as the leader of a fresh process group so that
//! signals reach the shell loop and whatever it is currently running. Output
//! is drained by tasks from the moment of spawn; a chatty poll loop can
//! therefore never block on a full pipe while it waits to be cancelled.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

use airbuddy_logging::targets::T_PROC;

use crate::config::CommandSpec;
use crate::error::{Result, TelemetryError};

/// Upper bound on collecting output after the group is gone. A descendant
/// that escaped the group could otherwise hold the pipe open forever.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// What a finished (or cancelled) command left behind.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the status could not be collected.
    pub status: Option<ExitStatus>,
    pub cancelled: bool,
}

pub struct BackgroundCommand {
    label: String,
    child: Child,
    pgid: Pid,
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    started: Instant,
    reaped: bool,
}

impl BackgroundCommand {
    /// Start `spec` in its own process group. Needs a Tokio runtime.
    pub fn spawn(spec: &CommandSpec) -> Result<Self> {
        let label = spec.to_string();
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(TelemetryError::Config(format!(
                "cannot start `{label}` outside a tokio runtime"
            )));
        }

        let mut std_cmd = std::process::Command::new(&spec.program);
        std_cmd
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = tokio::process::Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TelemetryError::Spawn {
            command: label.clone(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| TelemetryError::Spawn {
            command: label.clone(),
            source: std::io::Error::other("child exited before its pid was read"),
        })?;
        let pgid = Pid::from_raw(pid as i32);

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        tracing::debug!(target: T_PROC, pgid = pid, "started `{}`", label);

        Ok(Self {
            label,
            child,
            pgid,
            stdout,
            stderr,
            started: Instant::now(),
            reaped: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Process group id (equal to the leader's pid).
    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Block until the command exits on its own. Past `timeout` the whole
    /// group is killed and [`TelemetryError::Timeout`] returned.
    ///
    /// A non-zero exit is only an error when the command also wrote to
    /// stderr; some tools report soft failures through the status alone.
    pub async fn wait(mut self, timeout: Duration) -> Result<CommandOutput> {
        let status = match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                tracing::warn!(target: T_PROC, "`{}` exceeded {:?}, killing", self.label, timeout);
                self.signal_group(Signal::SIGKILL)?;
                self.reap().await;
                self.collect(false).await;
                return Err(TelemetryError::Timeout {
                    command: self.label.clone(),
                    elapsed: self.elapsed(),
                });
            }
        };
        self.reaped = true;
        // the leader is gone; take any stragglers with it
        self.signal_group(Signal::SIGKILL)?;

        let mut output = self.collect(false).await;
        output.status = Some(status);

        if !status.success() && !output.stderr.trim().is_empty() {
            return Err(TelemetryError::Exit {
                command: self.label.clone(),
                status: status.to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Stop a command that would otherwise run forever: SIGINT to the group,
    /// SIGKILL if it is still there after `grace`. Whatever it printed up to
    /// that point is returned.
    pub async fn cancel(mut self, grace: Duration) -> Result<CommandOutput> {
        self.signal_group(Signal::SIGINT)?;

        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                self.reaped = true;
                status.ok()
            }
            Err(_) => {
                tracing::debug!(
                    target: T_PROC,
                    "`{}` ignored SIGINT for {:?}, killing",
                    self.label,
                    grace
                );
                None
            }
        };
        self.signal_group(Signal::SIGKILL)?;
        let status = match status {
            Some(status) => Some(status),
            None => self.reap().await,
        };

        let mut output = self.collect(true).await;
        output.status = status;
        if !output.stderr.trim().is_empty() {
            tracing::debug!(target: T_PROC, "`{}` stderr: {}", self.label, output.stderr.trim());
        }
        Ok(output)
    }

    /// Signal every process in the group. A group that no longer exists is
    /// not an error.
    fn signal_group(&self, signal: Signal) -> Result<()> {
        match killpg(self.pgid, signal) {
            Ok(()) => {
                tracing::trace!(
                    target: T_PROC,
                    pgid = self.pgid.as_raw(),
                    ?signal,
                    "signalled group"
                );
                Ok(())
            }
            Err(Errno::ESRCH) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn reap(&mut self) -> Option<ExitStatus> {
        match self.child.wait().await {
            Ok(status) => {
                self.reaped = true;
                Some(status)
            }
            Err(err) => {
                tracing::warn!(target: T_PROC, "failed to reap `{}`: {}", self.label, err);
                None
            }
        }
    }

    async fn collect(&mut self, cancelled: bool) -> CommandOutput {
        let stdout = join_output(self.stdout.take(), &self.label).await;
        let stderr = join_output(self.stderr.take(), &self.label).await;
        CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            status: None,
            cancelled,
        }
    }
}

impl Drop for BackgroundCommand {
    fn drop(&mut self) {
        if !self.reaped {
            // abandoned before resolution: don't leave the group running
            let _ = killpg(self.pgid, Signal::SIGKILL);
        }
        for handle in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(err) = reader.read_to_end(&mut buf).await {
            tracing::debug!(target: T_PROC, "output pipe read failed: {}", err);
        }
        buf
    })
}

async fn join_output(handle: Option<JoinHandle<Vec<u8>>>, label: &str) -> Vec<u8> {
    let Some(mut handle) = handle else {
        return Vec::new();
    };
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut handle).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(err)) => {
            tracing::warn!(target: T_PROC, "output reader for `{}` failed: {}", label, err);
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(target: T_PROC, "output of `{}` still open, giving up", label);
            handle.abort();
            Vec::new()
        }
    }
}
