//! In-process converter stand-in for supervisor tests

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use super::converter::{ConverterCommand, ConverterLauncher};
use super::key::SessionKey;
use super::process::{MonitoredProcess, ProcessExit, Termination};

/// What happened to a fake process, identified by its pid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessEvent {
    Launched(u32),
    Requested(u32, Termination),
    Exited(u32, ProcessExit),
}

/// Launcher whose "processes" exit when the test says so
///
/// Termination requests are honoured immediately, reporting SIGTERM (15) or
/// SIGKILL (9). A handle dropped without a request also reports SIGKILL.
/// Every launch, request and exit is logged in order.
#[derive(Default)]
pub(crate) struct FakeLauncher {
    launches: AtomicUsize,
    fail: AtomicBool,
    exits: Mutex<Vec<(SessionKey, oneshot::Sender<ProcessExit>)>>,
    commands: Mutex<Vec<ConverterCommand>>,
    events: Arc<Mutex<Vec<ProcessEvent>>>,
}

impl FakeLauncher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of successful launches so far
    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Make subsequent launches fail
    pub(crate) fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Commands launched so far, in order
    pub(crate) fn commands(&self) -> Vec<ConverterCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Event log so far
    pub(crate) fn events(&self) -> Vec<ProcessEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Make the most recent process for `key` exit with `status`
    pub(crate) fn exit(&self, key: &SessionKey, status: ProcessExit) -> bool {
        let mut exits = self.exits.lock().unwrap();
        match exits.iter().rposition(|(k, _)| k == key) {
            Some(index) => {
                let (_, tx) = exits.remove(index);
                tx.send(status).is_ok()
            }
            None => false,
        }
    }
}

impl ConverterLauncher for FakeLauncher {
    fn launch(&self, key: &SessionKey, command: &ConverterCommand) -> io::Result<MonitoredProcess> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "converter not found"));
        }

        let n = self.launches.fetch_add(1, Ordering::SeqCst);
        let pid = 10_000 + n as u32;
        let (process, mut monitor) = MonitoredProcess::channel(Some(pid));
        let (tx, mut rx) = oneshot::channel();

        self.exits.lock().unwrap().push((key.clone(), tx));
        self.commands.lock().unwrap().push(command.clone());
        self.events.lock().unwrap().push(ProcessEvent::Launched(pid));

        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            let status = tokio::select! {
                Ok(status) = &mut rx => status,
                request = monitor.recv() => match request {
                    Some(request) => {
                        events.lock().unwrap().push(ProcessEvent::Requested(pid, request));
                        match request {
                            Termination::Graceful => ProcessExit::Signaled(15),
                            Termination::Kill => ProcessExit::Signaled(9),
                        }
                    }
                    None => ProcessExit::Signaled(9),
                },
            };
            // Logged before it is observable, so it orders against later launches
            events.lock().unwrap().push(ProcessEvent::Exited(pid, status));
            monitor.report(status);
        });

        Ok(process)
    }
}

/// Poll `check` until it holds or two seconds pass
pub(crate) async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
