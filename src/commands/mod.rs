//! CLI subcommands. Each returns whether the run succeeded so `main` can
//! pick the exit status.

pub mod check;
pub mod http;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::RexslConfig;
use crate::environment::Environment;

/// Where the project is and how to reach it, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ProjectArgs {
    pub basedir: PathBuf,
    pub webdir: Option<PathBuf>,
    /// `None` or `0` reserves a free port.
    pub port: Option<u16>,
    pub classpath: Option<String>,
    pub config: Option<PathBuf>,
}

impl ProjectArgs {
    /// `--config` if given, else `rexsl.toml` in basedir, else defaults.
    pub fn load_config(&self) -> Result<RexslConfig> {
        match &self.config {
            Some(path) => RexslConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => RexslConfig::discover(&self.basedir).with_context(|| {
                format!("Failed to load config from {}", self.basedir.display())
            }),
        }
    }

    pub fn environment(&self) -> Result<Environment> {
        let basedir = absolute(&self.basedir)?;
        let mut builder = Environment::builder(&basedir).port(self.port.unwrap_or(0));
        if let Some(webdir) = &self.webdir {
            builder = builder.webdir(webdir);
        }
        if let Some(classpath) = &self.classpath {
            builder = builder.runtime_classpath(std::env::split_paths(classpath));
        }
        builder.build().context("Failed to prepare environment")
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}
