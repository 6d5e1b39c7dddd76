//! Monitored converter processes
//!
//! A [`MonitoredProcess`] is the supervisor's handle on one converter. The
//! OS process itself is owned by a driver task that waits for it to exit and
//! acts on termination requests; the exit is published on a `watch` channel
//! so any number of observers can await it.
//!
//! ```text
//!   MonitoredProcess ──terminate/kill──► driver task ──► Child
//!          ▲                                  │
//!          └────────── watch<ProcessExit> ◄───┘ (child.wait())
//! ```
//!
//! [`MonitoredProcess::channel`] exposes the driver side directly so a
//! [`ConverterLauncher`](super::ConverterLauncher) can be backed by anything
//! that can report an exit.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, watch};

/// How a converter process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exited with a status code
    Exited(i32),
    /// Terminated by a signal
    Signaled(i32),
    /// Exit could not be observed
    Unknown,
}

impl ProcessExit {
    /// Classify an OS exit status
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ProcessExit::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ProcessExit::Signaled(signal);
            }
        }

        ProcessExit::Unknown
    }

    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Exited(0))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessExit::Exited(code) => write!(f, "exit code {}", code),
            ProcessExit::Signaled(signal) => write!(f, "signal {}", signal),
            ProcessExit::Unknown => write!(f, "unknown exit"),
        }
    }
}

/// Request sent from a handle to its driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ask the process to exit (SIGTERM on unix)
    Graceful,
    /// Force the process down
    Kill,
}

/// Supervisor-side handle on a running converter
///
/// Dropping every handle asks the driver to kill the process.
#[derive(Debug)]
pub struct MonitoredProcess {
    pid: Option<u32>,
    requests: mpsc::UnboundedSender<Termination>,
    exit: watch::Receiver<Option<ProcessExit>>,
}

/// Driver side of a [`MonitoredProcess`]
#[derive(Debug)]
pub struct ProcessMonitor {
    requests: mpsc::UnboundedReceiver<Termination>,
    exit: watch::Sender<Option<ProcessExit>>,
}

impl MonitoredProcess {
    /// Create a handle and the driver side that feeds it
    pub fn channel(pid: Option<u32>) -> (MonitoredProcess, ProcessMonitor) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = watch::channel(None);

        (
            MonitoredProcess {
                pid,
                requests: request_tx,
                exit: exit_rx,
            },
            ProcessMonitor {
                requests: request_rx,
                exit: exit_tx,
            },
        )
    }

    /// Take ownership of a spawned child and start its driver task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(child: Child) -> MonitoredProcess {
        let (process, monitor) = Self::channel(child.id());
        tokio::spawn(monitor.drive(child));
        process
    }

    /// OS process id, if known
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit status, `None` while the process is running
    pub fn exit_status(&self) -> Option<ProcessExit> {
        *self.exit.borrow()
    }

    /// Whether the process is still running
    pub fn is_running(&self) -> bool {
        self.exit_status().is_none()
    }

    /// Ask the process to exit
    pub fn terminate(&self) {
        let _ = self.requests.send(Termination::Graceful);
    }

    /// Force the process down
    pub fn kill(&self) {
        let _ = self.requests.send(Termination::Kill);
    }

    /// Future resolving once the process has exited
    ///
    /// The future is independent of the handle and can be moved into another
    /// task.
    pub fn exited(&self) -> impl Future<Output = ProcessExit> + Send + 'static {
        let mut exit = self.exit.clone();

        async move {
            loop {
                let current = *exit.borrow_and_update();
                if let Some(status) = current {
                    return status;
                }
                if exit.changed().await.is_err() {
                    let last = *exit.borrow();
                    return last.unwrap_or(ProcessExit::Unknown);
                }
            }
        }
    }

    /// Terminate and wait, escalating to a kill after `grace`
    pub async fn stop(&self, grace: Duration) -> ProcessExit {
        if let Some(status) = self.exit_status() {
            return status;
        }

        self.terminate();

        match tokio::time::timeout(grace, self.exited()).await {
            Ok(status) => status,
            Err(_) => {
                tracing::warn!(
                    pid = ?self.pid,
                    grace_ms = grace.as_millis() as u64,
                    "Converter ignored termination, killing"
                );
                self.kill();
                self.exited().await
            }
        }
    }
}

impl ProcessMonitor {
    /// Wait for the next termination request
    ///
    /// Returns `None` once every handle has been dropped.
    pub async fn recv(&mut self) -> Option<Termination> {
        self.requests.recv().await
    }

    /// Publish the exit status, consuming the driver side
    pub fn report(self, status: ProcessExit) {
        let _ = self.exit.send(Some(status));
    }

    async fn drive(mut self, mut child: Child) {
        let pid = child.id();

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                request = self.requests.recv() => match request {
                    Some(Termination::Graceful) => signal_terminate(&mut child),
                    Some(Termination::Kill) => {
                        let _ = child.start_kill();
                    }
                    None => {
                        let _ = child.start_kill();
                        break child.wait().await;
                    }
                },
            }
        };

        let exit = match status {
            Ok(status) => ProcessExit::from_status(status),
            Err(e) => {
                tracing::warn!(pid = ?pid, error = %e, "Failed to observe converter exit");
                ProcessExit::Unknown
            }
        };

        self.report(exit);
    }
}

#[cfg(unix)]
fn signal_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };

    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        tracing::debug!(pid = pid, error = %e, "SIGTERM failed, killing");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn signal_terminate(child: &mut Child) {
    let _ = child.start_kill();
}
