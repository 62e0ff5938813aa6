//! Core EmbeddedContainer struct, state and errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::ContainerConfig;

/// Lifecycle of an [`EmbeddedContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerState::NotStarted => "not started",
            ContainerState::Starting => "starting",
            ContainerState::Running => "running",
            ContainerState::Stopping => "stopping",
            ContainerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container can't start, it is {state}")]
    AlreadyStarted { state: ContainerState },

    #[error("container is not running, it is {state}")]
    NotRunning { state: ContainerState },

    #[error("webapp dir '{}' is absent, package the project first", path.display())]
    WebdirAbsent { path: PathBuf },

    #[error("failed to bind port {port}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("container on port {port} didn't accept connections within {}ms", waited.as_millis())]
    StartTimeout { port: u16, waited: Duration },
}

/// Maximum number of requests served at the same time.
pub(super) const MAX_CONNECTIONS: usize = 64;

/// Mutable part of the container, guarded by one mutex so that `start`
/// and `stop` never interleave.
pub(super) struct Inner {
    pub(super) state: ContainerState,
    pub(super) port: Option<u16>,
    pub(super) server: Option<JoinHandle<()>>,
    pub(super) shutdown: Option<oneshot::Sender<()>>,
    pub(super) init_params: BTreeMap<String, String>,
    pub(super) bootstrapped: bool,
}

/// Static-file web container serving the packaged webdir on localhost.
///
/// One instance goes through `NotStarted -> Starting -> Running ->
/// Stopping -> Stopped` exactly once.
pub struct EmbeddedContainer {
    pub(super) inner: Mutex<Inner>,
    pub(super) config: ContainerConfig,
    pub(super) stop_count: AtomicUsize,
}

impl EmbeddedContainer {
    /// Create a container with default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ContainerState::NotStarted,
                port: None,
                server: None,
                shutdown: None,
                init_params: BTreeMap::new(),
                bootstrapped: false,
            }),
            config,
            stop_count: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> ContainerState {
        self.lock().state
    }

    /// Port the container listens on once started.
    pub fn port(&self) -> Option<u16> {
        self.lock().port
    }

    /// Base URL while running.
    pub fn home(&self) -> Option<String> {
        self.port().map(|port| format!("http://localhost:{port}/"))
    }

    /// Init parameters injected on start.
    pub fn init_params(&self) -> BTreeMap<String, String> {
        self.lock().init_params.clone()
    }

    /// How many times the container went through a successful stop.
    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the guard leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EmbeddedContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EmbeddedContainer {
    fn drop(&mut self) {
        if self.state() == ContainerState::Running {
            let _ = self.stop();
        }
    }
}
