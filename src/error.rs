//! Error taxonomy for the validation pipeline.
//!
//! Validation failures are not errors: a check that finds defects returns a
//! failed [`Outcome`](crate::checks::Outcome). The variants here are the
//! fatal conditions that abort a pipeline run.

use std::path::PathBuf;

use crate::container::ContainerError;
use crate::script::ScriptFailure;

/// Fatal errors raised while configuring or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RexslError {
    #[error("check '{name}' can't be built, known checks: {}", known.join(", "))]
    UnknownCheck { name: String, known: Vec<String> },

    #[error("webapp dir '{}' is absent, package the project first", path.display())]
    WebdirAbsent { path: PathBuf },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("bootstrap script '{}' failed: {failure}", script.display())]
    Bootstrap {
        script: PathBuf,
        #[source]
        failure: ScriptFailure,
    },

    #[error("invalid configuration in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read archive '{}': {message}", path.display())]
    Archive { path: PathBuf, message: String },
}

impl RexslError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error comes from configuration rather than the project.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RexslError::UnknownCheck { .. }
                | RexslError::WebdirAbsent { .. }
                | RexslError::Config { .. }
                | RexslError::Container(ContainerError::WebdirAbsent { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, RexslError>;
