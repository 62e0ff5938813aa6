pub mod archive;
pub mod checks;
pub mod commands;
pub mod config;
pub mod container;
pub mod environment;
pub mod error;
pub mod fs;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod script;
pub mod utils;
pub mod validation;
pub mod w3c;

pub use checks::{Check, CheckKind, CheckRegistry, Outcome, Scope};
pub use config::RexslConfig;
pub use environment::Environment;
pub use error::{Result, RexslError};
pub use pipeline::{Pipeline, PipelineReport};
