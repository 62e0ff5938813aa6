//! Stylesheets validated by the W3C Jigsaw service.

use std::fs;

use tracing::{info, warn};

use super::check::{Check, CheckKind, Outcome, Scope};
use super::css_static::{in_scope, CSS_DIR};
use crate::config::{HttpConfig, RexslConfig, CONFIG_FILE};
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::http::{RetryingHttpClient, Wire};
use crate::utils::display_path;
use crate::w3c::JigsawValidator;

#[derive(Debug, Clone)]
pub struct JigsawCssCheck {
    http: HttpConfig,
    url: String,
    scope: Scope,
}

impl JigsawCssCheck {
    pub fn from_config(config: &RexslConfig) -> Self {
        Self {
            http: config.http.clone(),
            url: config.jigsaw.url.clone(),
            scope: Scope::all(),
        }
    }

    /// Validate every stylesheet in scope with `validator`.
    ///
    /// Errors reported by the service fail the check, warnings become
    /// notes. An unreachable service fails the file it was asked about.
    pub fn validate_with<W: Wire>(
        &self,
        env: &Environment,
        validator: &JigsawValidator<W>,
    ) -> Result<Outcome> {
        let files = in_scope(&FileFinder::new(env.basedir().join(CSS_DIR), "css"), &self.scope)?;
        let mut diagnostics = Vec::new();
        let mut notes = Vec::new();
        for file in &files {
            let css = fs::read_to_string(file)
                .map_err(|e| RexslError::io(format!("Failed to read {}", file.display()), e))?;
            let shown = display_path(file, env.basedir());
            match validator.validate(&css) {
                Ok(response) => {
                    info!(file = %shown, valid = response.valid, "validated by W3C");
                    diagnostics.extend(response.errors.iter().map(|d| format!("{shown}:{d}")));
                    notes.extend(response.warnings.iter().map(|d| format!("{shown}:{d}")));
                    if !response.valid && response.errors.is_empty() {
                        diagnostics.push(format!("{shown}: invalid according to W3C"));
                    }
                }
                Err(e) => {
                    warn!(file = %shown, "W3C validator failed: {e}");
                    diagnostics.push(format!("{shown}: W3C validator failed: {e}"));
                }
            }
        }
        let mut outcome = Outcome::from_diagnostics(diagnostics);
        outcome.notes = notes;
        Ok(outcome)
    }
}

impl Check for JigsawCssCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::JigsawCss
    }

    fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.clone();
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let client = RetryingHttpClient::from_config(&self.http).map_err(|e| RexslError::Config {
            path: CONFIG_FILE.into(),
            message: format!("can't build HTTP client: {e}"),
        })?;
        self.validate_with(env, &JigsawValidator::new(client, self.url.clone()))
    }
}
