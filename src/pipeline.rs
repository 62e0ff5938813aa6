//! Sequential run of the active checks against one environment.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::checks::{Check, CheckKind, CheckRegistry};
use crate::config::RexslConfig;
use crate::environment::Environment;
use crate::error::Result;

/// Verdict of one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub check: CheckKind,
    pub passed: bool,
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub duration_ms: u64,
}

/// Verdict of a whole run: passed iff every check passed.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub passed: bool,
    pub checks: Vec<CheckReport>,
}

impl PipelineReport {
    /// Diagnostics of failed checks, keyed by check name.
    pub fn failures(&self) -> BTreeMap<String, Vec<String>> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| (c.check.name().to_string(), c.diagnostics.clone()))
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

pub struct Pipeline {
    registry: CheckRegistry,
}

impl Pipeline {
    pub fn new(registry: CheckRegistry) -> Self {
        Self { registry }
    }

    pub fn from_config(config: RexslConfig) -> Self {
        Self::new(CheckRegistry::new(config))
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CheckRegistry {
        &mut self.registry
    }

    /// Build the active checks and run them all.
    ///
    /// An unknown identifier aborts before anything runs.
    pub fn run(&self, env: &Environment) -> Result<PipelineReport> {
        let checks = self.registry.all()?;
        run_checks(&checks, env)
    }
}

/// Run `checks` in order. A failed check does not stop the others; a fatal
/// error does.
pub fn run_checks(checks: &[Box<dyn Check>], env: &Environment) -> Result<PipelineReport> {
    let started_at = Utc::now();
    let mut reports = Vec::with_capacity(checks.len());
    for check in checks {
        let kind = check.kind();
        info!(check = %kind, "running check");
        let start = Instant::now();
        let outcome = check.validate(env)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        for note in &outcome.notes {
            info!(check = %kind, "{note}");
        }
        if outcome.passed {
            info!(check = %kind, duration_ms, "check passed");
        } else {
            for diagnostic in &outcome.diagnostics {
                warn!(check = %kind, "{diagnostic}");
            }
            warn!(check = %kind, defects = outcome.diagnostics.len(), "check failed");
        }
        reports.push(CheckReport {
            check: kind,
            passed: outcome.passed,
            diagnostics: outcome.diagnostics,
            notes: outcome.notes,
            duration_ms,
        });
    }
    Ok(PipelineReport {
        started_at,
        passed: reports.iter().all(|r| r.passed),
        checks: reports,
    })
}
