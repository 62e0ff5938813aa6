//! Read-only description of the project under validation.

use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};

use crate::error::{Result, RexslError};

/// Default location of the packaged web application, relative to basedir.
pub const DEFAULT_WEBDIR: &str = "target/webapp";

/// Where project files live and how the project is wired for validation.
///
/// Built once per run and shared by reference with every check; nothing
/// hands out mutable access after [`EnvironmentBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    basedir: PathBuf,
    webdir: PathBuf,
    port: u16,
    runtime_classpath: Vec<PathBuf>,
    test_classpath: Vec<PathBuf>,
}

impl Environment {
    /// Start building an environment rooted at `basedir`.
    pub fn builder(basedir: impl Into<PathBuf>) -> EnvironmentBuilder {
        EnvironmentBuilder::new(basedir)
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn webdir(&self) -> &Path {
        &self.webdir
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Classpath entries exposed to scripts.
    ///
    /// With `test_only` set only the test entries are returned, otherwise
    /// test entries come first followed by the runtime ones.
    pub fn classpath(&self, test_only: bool) -> Vec<PathBuf> {
        let mut entries = self.test_classpath.clone();
        if !test_only {
            for entry in &self.runtime_classpath {
                if !entries.contains(entry) {
                    entries.push(entry.clone());
                }
            }
        }
        entries
    }

    /// Base URL of the application once a container serves it.
    pub fn home(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }
}

/// Builder for [`Environment`].
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    basedir: PathBuf,
    webdir: Option<PathBuf>,
    port: Option<u16>,
    runtime_classpath: Vec<PathBuf>,
    test_classpath: Vec<PathBuf>,
}

impl EnvironmentBuilder {
    fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            webdir: None,
            port: None,
            runtime_classpath: Vec::new(),
            test_classpath: Vec::new(),
        }
    }

    /// Web directory; relative paths are resolved against basedir.
    pub fn webdir(mut self, webdir: impl Into<PathBuf>) -> Self {
        self.webdir = Some(webdir.into());
        self
    }

    /// Port for the embedded container; `0` reserves a free one.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn runtime_classpath<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.runtime_classpath
            .extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn test_classpath<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.test_classpath.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Environment> {
        let webdir = match self.webdir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => self.basedir.join(dir),
            None => self.basedir.join(DEFAULT_WEBDIR),
        };
        let port = match self.port {
            Some(port) if port != 0 => port,
            _ => reserve_port()?,
        };
        Ok(Environment {
            basedir: self.basedir,
            webdir,
            port,
            runtime_classpath: self.runtime_classpath,
            test_classpath: self.test_classpath,
        })
    }
}

/// Ask the OS for a currently free TCP port on the loopback interface.
///
/// The listener is dropped before returning, so another process may grab
/// the port in between; callers bind it shortly afterwards.
pub fn reserve_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|e| RexslError::io("Failed to reserve a free port", e))?;
    let port = listener
        .local_addr()
        .map_err(|e| RexslError::io("Failed to read reserved port", e))?
        .port();
    Ok(port)
}
