//! Execution of one script through an external interpreter.

use std::borrow::Cow;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use shell_escape::escape;
use tracing::debug;
use wait_timeout::ChildExt;

use super::binding::Binding;
use crate::config::ScriptConfig;
use crate::utils::{last_line, truncate};
use crate::validation::script_name;

/// Timeout for collecting output from child process pipes
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured output per stream (1MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// A script together with the variables it runs with.
#[derive(Debug, Clone)]
pub struct ScriptTask {
    pub script: PathBuf,
    pub binding: Binding,
}

impl ScriptTask {
    pub fn new(script: impl Into<PathBuf>, binding: Binding) -> Self {
        Self {
            script: script.into(),
            binding,
        }
    }
}

/// Uniform failure of a script, whatever went wrong.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ScriptFailure {
    pub message: String,
    #[source]
    pub cause: Option<ScriptCause>,
}

impl ScriptFailure {
    fn new(script: &Path, cause: ScriptCause) -> Self {
        Self {
            message: format!("{}: {cause}", script.display()),
            cause: Some(cause),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptCause {
    #[error("illegal script name, {0}")]
    IllegalName(String),

    #[error("failed to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for the script")]
    Wait(#[source] std::io::Error),

    #[error("exit status {}: {detail}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Exit { code: Option<i32>, detail: String },

    #[error("killed after {}s timeout", .0.as_secs())]
    Timeout(Duration),
}

/// What a successful script printed.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Runs scripts with `interpreter <script>`, passing the binding through
/// `REXSL_*` environment variables.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: Vec<String>,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl ScriptRunner {
    pub fn new(interpreter: Vec<String>) -> Self {
        Self {
            interpreter,
            timeout: None,
            working_dir: None,
        }
    }

    pub fn from_config(config: &ScriptConfig) -> Self {
        Self::new(config.interpreter.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run one task. Non-zero exit, timeout and spawn problems all come
    /// back as [`ScriptFailure`].
    pub fn execute(&self, task: &ScriptTask) -> Result<ScriptOutput, ScriptFailure> {
        script_name(&task.script)
            .map_err(|reason| ScriptFailure::new(&task.script, ScriptCause::IllegalName(reason)))?;

        let start = Instant::now();
        let mut child = self.spawn(task)?;

        // Drain both pipes while waiting, a full pipe would block the child.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let waited = match self.timeout {
            Some(limit) => child.wait_timeout(limit),
            None => child.wait().map(Some),
        }
        .map_err(|e| ScriptFailure::new(&task.script, ScriptCause::Wait(e)));

        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_child_process(&mut child);
                let limit = self.timeout.unwrap_or_default();
                return Err(ScriptFailure::new(&task.script, ScriptCause::Timeout(limit)));
            }
            Err(failure) => {
                kill_child_process(&mut child);
                return Err(failure);
            }
        };

        let stdout = collect(stdout_rx);
        let stderr = collect(stderr_rx);
        let duration = start.elapsed();
        debug!(
            script = %task.script.display(),
            elapsed_ms = duration.as_millis() as u64,
            "script finished"
        );

        if status.success() {
            return Ok(ScriptOutput {
                stdout,
                stderr,
                duration,
            });
        }
        let detail = last_line(&stderr)
            .or_else(|| last_line(&stdout))
            .map(|line| truncate(line, 200))
            .unwrap_or_else(|| "no output".to_string());
        Err(ScriptFailure::new(
            &task.script,
            ScriptCause::Exit {
                code: status.code(),
                detail,
            },
        ))
    }

    fn spawn(&self, task: &ScriptTask) -> Result<Child, ScriptFailure> {
        let (program, args) = match self.interpreter.split_first() {
            Some(split) => split,
            None => {
                return Err(ScriptFailure::new(
                    &task.script,
                    ScriptCause::Spawn {
                        program: String::new(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "no interpreter configured",
                        ),
                    },
                ))
            }
        };
        let resolved = which::which(program).map_err(|e| {
            ScriptFailure::new(
                &task.script,
                ScriptCause::Spawn {
                    program: program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
                },
            )
        })?;
        debug!(command = %command_line(&self.interpreter, &task.script), "spawning script");
        let mut cmd = Command::new(resolved);
        cmd.args(args)
            .arg(&task.script)
            .envs(task.binding.env_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.spawn().map_err(|source| {
            ScriptFailure::new(
                &task.script,
                ScriptCause::Spawn {
                    program: program.clone(),
                    source,
                },
            )
        })
    }
}

/// Interpreter and script as a shell-quoted line, for logs.
fn command_line(interpreter: &[String], script: &Path) -> String {
    interpreter
        .iter()
        .map(|arg| escape(Cow::Borrowed(arg.as_str())).into_owned())
        .chain(std::iter::once(
            escape(Cow::Owned(script.display().to_string())).into_owned(),
        ))
        .collect::<Vec<_>>()
        .join(" ")
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_stream_to_string(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

fn collect(rx: mpsc::Receiver<String>) -> String {
    rx.recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string())
}

/// Read a stream up to [`MAX_OUTPUT_SIZE`], draining and dropping the rest.
fn read_stream_to_string<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(remaining)]);
                if n > remaining {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }
    if truncated {
        buf.extend_from_slice(b"\n[output truncated]");
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn kill_child_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
