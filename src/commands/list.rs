//! `rexsl checks`: list the known check identifiers.

use anyhow::Result;
use colored::Colorize;

use super::ProjectArgs;
use crate::checks::{CheckKind, CheckRegistry};

/// Print every known check, marking the ones the project runs.
pub fn execute(project: &ProjectArgs) -> Result<bool> {
    let registry = CheckRegistry::new(project.load_config()?);
    let active: Vec<_> = registry
        .active()
        .iter()
        .filter_map(|name| CheckKind::from_name(name))
        .collect();
    for kind in CheckKind::ALL {
        let marker = if active.contains(&kind) {
            "●".green()
        } else {
            "○".dimmed()
        };
        println!("{marker} {:<24} {}", kind.name(), kind.qualified_name().dimmed());
    }
    Ok(true)
}
