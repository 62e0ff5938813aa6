//! Scripts run against the packaged webapp served by an embedded container.

use tracing::{error, info, warn};

use super::check::{Check, CheckKind, Outcome, Scope};
use super::css_static::file_name;
use crate::config::{ContainerConfig, RexslConfig};
use crate::container::EmbeddedContainer;
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::script::{BindingBuilder, ScriptRunner, ScriptTask};
use crate::utils::display_path;

/// Scripts folder, relative to basedir.
pub const SCRIPTS_DIR: &str = "src/test/rexsl/scripts";

#[derive(Debug, Clone)]
pub struct InContainerScriptsCheck {
    runner: ScriptRunner,
    extension: String,
    container: ContainerConfig,
    scope: Scope,
}

impl InContainerScriptsCheck {
    pub fn new(runner: ScriptRunner, extension: impl Into<String>, container: ContainerConfig) -> Self {
        Self {
            runner,
            extension: extension.into(),
            container,
            scope: Scope::all(),
        }
    }

    pub fn from_config(config: &RexslConfig) -> Self {
        Self::new(
            ScriptRunner::from_config(&config.scripts),
            config.scripts.extension.clone(),
            config.container.clone(),
        )
    }

    /// Start `container`, bootstrap it, run the scripts and stop it again.
    ///
    /// The container is stopped whatever happens once it has started.
    pub fn validate_in(&self, env: &Environment, container: &EmbeddedContainer) -> Result<Outcome> {
        let dir = env.basedir().join(SCRIPTS_DIR);
        if !dir.is_dir() {
            info!("{SCRIPTS_DIR} directory is absent, no scripts to run");
            return Ok(Outcome::pass().with_note(format!(
                "{SCRIPTS_DIR} directory is absent, no scripts to run"
            )));
        }
        if !env.webdir().is_dir() {
            return Err(RexslError::WebdirAbsent {
                path: env.webdir().to_path_buf(),
            });
        }

        info!(webdir = %env.webdir().display(), "starting embedded container");
        container.start(env)?;
        info!("Web front available at {}", env.home());
        let result = self.run_scripts(env, container);
        let stopped = container.stop();
        let outcome = result?;
        stopped?;
        Ok(outcome)
    }

    fn run_scripts(&self, env: &Environment, container: &EmbeddedContainer) -> Result<Outcome> {
        container.bootstrap(env, &self.runner, &self.extension)?;

        let mut builder = BindingBuilder::new(env);
        for (name, value) in container.init_params() {
            builder = builder.with(name.to_lowercase(), value);
        }
        let binding = builder.build();

        let scripts = FileFinder::new(env.basedir().join(SCRIPTS_DIR), &self.extension).random()?;
        let mut failed = Vec::new();
        let mut executed = 0;
        for script in &scripts {
            let name = file_name(script);
            let shown = display_path(script, env.basedir());
            if !self.scope.matches(&name) {
                info!(script = %shown, "Ignored, out of scope '{}'", self.scope.expr());
                continue;
            }
            info!(script = %shown, "Testing");
            executed += 1;
            if let Err(failure) = self.runner.execute(&ScriptTask::new(script, binding.clone())) {
                error!(script = %shown, "Test failed: {failure}");
                failed.push(format!("{name}: {failure}"));
            }
        }
        if executed == 0 && !scripts.is_empty() {
            warn!(scope = %self.scope.expr(), "no script matched the scope");
        }
        Ok(Outcome::from_diagnostics(failed)
            .with_note(format!("{executed} of {} script(s) executed", scripts.len())))
    }
}

impl Check for InContainerScriptsCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::InContainerScripts
    }

    fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.clone();
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let container = EmbeddedContainer::with_config(self.container.clone());
        self.validate_in(env, &container)
    }
}
