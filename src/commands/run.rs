//! `rexsl run`: serve the webapp with the embedded container until Ctrl-C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use super::ProjectArgs;
use crate::container::EmbeddedContainer;
use crate::script::ScriptRunner;

/// Execute the run command: start, bootstrap, wait for Ctrl-C, stop.
pub fn execute(project: &ProjectArgs) -> Result<bool> {
    let config = project.load_config()?;
    let env = project.environment()?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let container = EmbeddedContainer::with_config(config.container.clone());
    container
        .start(&env)
        .with_context(|| format!("Failed to serve {}", env.webdir().display()))?;

    let runner = ScriptRunner::from_config(&config.scripts).with_working_dir(env.basedir());
    let bootstrapped = container.bootstrap(&env, &runner, &config.scripts.extension);
    let count = match bootstrapped {
        Ok(count) => count,
        Err(e) => {
            container.stop().ok();
            return Err(e).context("Bootstrap failed");
        }
    };

    println!(
        "{} Serving {} at {}",
        "✓".green().bold(),
        env.webdir().display(),
        env.home().cyan()
    );
    if count > 0 {
        println!("  {count} bootstrap script(s) executed");
    }
    println!("  Press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    container.stop().context("Failed to stop container")?;
    println!("{} Container stopped", "✓".green().bold());
    Ok(true)
}
