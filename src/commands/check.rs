//! `rexsl check`: run the validation pipeline and print the verdict.

use anyhow::{Context, Result};
use colored::Colorize;

use super::ProjectArgs;
use crate::pipeline::{Pipeline, PipelineReport};
use crate::utils::truncate;

/// Execute the check command. Returns whether every check passed.
pub fn execute(
    project: &ProjectArgs,
    checks: Option<&str>,
    scope: Option<&str>,
    json: bool,
) -> Result<bool> {
    let config = project.load_config()?;
    let env = project.environment()?;

    let mut pipeline = Pipeline::from_config(config);
    if let Some(names) = checks {
        pipeline.registry_mut().set_check(names);
    }
    if let Some(expr) = scope {
        pipeline.registry_mut().set_scope(expr);
    }

    if !json {
        println!(
            "{} Validating {} ({} checks)\n",
            "→".cyan().bold(),
            env.basedir().display(),
            pipeline.registry().active().len()
        );
    }
    let report = pipeline.run(&env).context("Validation aborted")?;

    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    Ok(report.passed)
}

fn print_report(report: &PipelineReport) {
    for check in &report.checks {
        if check.passed {
            let elapsed = format!("({}ms)", check.duration_ms);
            println!("{} {} {}", "✓".green().bold(), check.check, elapsed.dimmed());
        } else {
            println!("{} {}", "✗".red().bold(), check.check.to_string().red());
        }
        for diagnostic in &check.diagnostics {
            println!("    {}", truncate(diagnostic, 400));
        }
        for note in &check.notes {
            println!("    {}", note.dimmed());
        }
    }
    println!();
    if report.passed {
        println!("{} All {} checks passed", "✓".green().bold(), report.checks.len());
    } else {
        println!(
            "{} {} of {} checks failed",
            "✗".red().bold(),
            report.failed_count(),
            report.checks.len()
        );
    }
}
