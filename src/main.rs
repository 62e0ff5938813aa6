use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rexsl::commands::http::HttpArgs;
use rexsl::commands::{check, http, list, run, ProjectArgs};
use rexsl::config::RexslConfig;
use rexsl::logging::{init_logging, level_from_verbosity};
use rexsl::validation::{clap_check_validator, clap_scope_validator};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rexsl")]
#[command(about = "Build validation for XSL web applications", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Project {
    /// Project base directory
    #[arg(short, long, default_value = ".")]
    basedir: PathBuf,

    /// Packaged web application (default: target/webapp under basedir)
    #[arg(short, long)]
    webdir: Option<PathBuf>,

    /// Port for the embedded container (0 picks a free one)
    #[arg(short, long)]
    port: Option<u16>,

    /// Runtime classpath, separated like PATH
    #[arg(long)]
    classpath: Option<String>,

    /// Configuration file (default: rexsl.toml in basedir)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl From<Project> for ProjectArgs {
    fn from(p: Project) -> Self {
        ProjectArgs {
            basedir: p.basedir,
            webdir: p.webdir,
            port: p.port,
            classpath: p.classpath,
            config: p.config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation checks against a project
    Check {
        #[command(flatten)]
        project: Project,

        /// Comma-separated check identifiers to run instead of the defaults
        #[arg(short, long, value_parser = clap_check_validator)]
        check: Option<String>,

        /// Only files and scripts whose name matches this expression
        #[arg(short, long, value_parser = clap_scope_validator)]
        test: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the webapp with the embedded container until Ctrl+C
    Run {
        #[command(flatten)]
        project: Project,
    },

    /// Send one request and assert on the response, with retries
    Http {
        /// HTTP method
        method: String,

        /// Absolute URL
        url: String,

        /// Request header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Expected status code
        #[arg(short, long)]
        status: Option<u16>,

        /// Text the response body must contain
        #[arg(long)]
        contains: Option<String>,

        /// How many times to retry a failed assertion
        #[arg(short, long, default_value_t = 0)]
        retries: u32,

        /// Configuration file for transport settings
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List known check identifiers
    Checks {
        #[command(flatten)]
        project: Project,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json, level_from_verbosity(cli.verbose, cli.quiet));

    let passed = match cli.command {
        Commands::Check {
            project,
            check: checks,
            test,
            json,
        } => check::execute(&project.into(), checks.as_deref(), test.as_deref(), json)?,
        Commands::Run { project } => run::execute(&project.into())?,
        Commands::Http {
            method,
            url,
            headers,
            data,
            status,
            contains,
            retries,
            config,
        } => {
            let config = match config {
                Some(path) => RexslConfig::load(&path)?,
                None => RexslConfig::discover(&std::env::current_dir()?)?,
            };
            let args = HttpArgs {
                method,
                url,
                headers,
                body: data,
                status,
                contains,
                retries,
            };
            http::execute(&args, &config.http)?
        }
        Commands::Checks { project } => list::execute(&project.into())?,
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
