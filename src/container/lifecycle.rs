//! Container lifecycle: start, bootstrap, stop.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::core::{ContainerError, ContainerState, EmbeddedContainer, Inner};
use super::server::serve;
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::script::{BindingBuilder, ScriptRunner, ScriptTask};
use crate::utils::display_path;

/// Init parameter holding the absolute project basedir.
pub const PARAM_BASEDIR: &str = "BASEDIR";
/// Init parameter listing folders served at runtime, separated by `;`.
pub const PARAM_RUNTIME_FOLDERS: &str = "RUNTIME_FOLDERS";
/// Init parameter pointing at the XSD folder.
pub const PARAM_XSD_FOLDER: &str = "XSD_FOLDER";

impl EmbeddedContainer {
    /// Start serving `env.webdir()` on `env.port()`.
    ///
    /// Valid only from `NotStarted`. A missing webdir or a bind failure
    /// leaves the container in `NotStarted`.
    pub fn start(&self, env: &Environment) -> std::result::Result<(), ContainerError> {
        let mut inner = self.lock();
        if inner.state != ContainerState::NotStarted {
            return Err(ContainerError::AlreadyStarted { state: inner.state });
        }
        if !env.webdir().is_dir() {
            return Err(ContainerError::WebdirAbsent {
                path: env.webdir().to_path_buf(),
            });
        }
        inner.state = ContainerState::Starting;

        let port = env.port();
        let listener = match bind(port) {
            Ok(listener) => listener,
            Err(e) => {
                inner.state = ContainerState::NotStarted;
                return Err(e);
            }
        };

        let webdir = env.webdir().to_path_buf();
        let (shutdown, signal) = oneshot::channel();
        inner.shutdown = Some(shutdown);
        inner.server = Some(thread::spawn(move || serve(listener, webdir, signal)));

        if let Some(limit) = self.config.start_timeout() {
            if let Err(e) = wait_until_ready(port, limit) {
                shut_down(&mut inner);
                inner.state = ContainerState::Stopped;
                return Err(e);
            }
        }

        inner.init_params = init_params(env);
        inner.port = Some(port);
        inner.state = ContainerState::Running;
        info!(port, webdir = %env.webdir().display(), "embedded container started");
        Ok(())
    }

    /// Stop a running container and wait for in-flight requests to finish.
    pub fn stop(&self) -> std::result::Result<(), ContainerError> {
        let mut inner = self.lock();
        if inner.state != ContainerState::Running {
            return Err(ContainerError::NotRunning { state: inner.state });
        }
        inner.state = ContainerState::Stopping;
        shut_down(&mut inner);
        inner.state = ContainerState::Stopped;
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        info!(port = inner.port.unwrap_or_default(), "embedded container stopped");
        Ok(())
    }

    /// Run every bootstrap script once, in lexicographic order.
    ///
    /// Scripts see the standard binding plus the init parameters. The
    /// first failure aborts with [`RexslError::Bootstrap`]. Later calls are
    /// no-ops. Returns the number of scripts run.
    pub fn bootstrap(
        &self,
        env: &Environment,
        runner: &ScriptRunner,
        extension: &str,
    ) -> Result<usize> {
        let params = {
            let mut inner = self.lock();
            if inner.state != ContainerState::Running {
                return Err(ContainerError::NotRunning { state: inner.state }.into());
            }
            if inner.bootstrapped {
                return Ok(0);
            }
            inner.bootstrapped = true;
            inner.init_params.clone()
        };

        let dir = env.basedir().join(&self.config.bootstrap_dir);
        let scripts = FileFinder::new(&dir, extension).ordered()?;
        if scripts.is_empty() {
            debug!(dir = %dir.display(), "no bootstrap scripts");
            return Ok(0);
        }

        let mut builder = BindingBuilder::new(env);
        for (name, value) in &params {
            builder = builder.with(name.to_lowercase(), value.clone());
        }
        let binding = builder.build();

        for script in &scripts {
            info!(script = %display_path(script, env.basedir()), "running bootstrap script");
            runner
                .execute(&ScriptTask::new(script, binding.clone()))
                .map_err(|failure| RexslError::Bootstrap {
                    script: script.clone(),
                    failure,
                })?;
        }
        Ok(scripts.len())
    }
}

/// Signal graceful shutdown and wait for the server thread.
fn shut_down(inner: &mut Inner) {
    if let Some(shutdown) = inner.shutdown.take() {
        let _ = shutdown.send(());
    }
    if let Some(handle) = inner.server.take() {
        let _ = handle.join();
    }
}

fn bind(port: u16) -> std::result::Result<TcpListener, ContainerError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .map_err(|source| ContainerError::Bind { port, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ContainerError::Bind { port, source })?;
    Ok(listener)
}

fn wait_until_ready(port: u16, limit: Duration) -> std::result::Result<(), ContainerError> {
    let started = Instant::now();
    loop {
        if TcpStream::connect((Ipv4Addr::LOCALHOST, port)).is_ok() {
            return Ok(());
        }
        if started.elapsed() >= limit {
            return Err(ContainerError::StartTimeout {
                port,
                waited: started.elapsed(),
            });
        }
        thread::sleep(Duration::from_millis(20));
    }
}

/// Parameters a deployed application would read from its context.
pub(super) fn init_params(env: &Environment) -> BTreeMap<String, String> {
    let basedir = env.basedir();
    let folders = [
        basedir.join("src/main/webapp"),
        basedir.join("src/test/rexsl"),
    ]
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(";");

    let mut params = BTreeMap::new();
    params.insert(PARAM_BASEDIR.to_string(), basedir.display().to_string());
    params.insert(PARAM_RUNTIME_FOLDERS.to_string(), folders);
    params.insert(
        PARAM_XSD_FOLDER.to_string(),
        basedir.join("src/test/rexsl/xsd").display().to_string(),
    );
    params
}
