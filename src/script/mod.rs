//! Script execution with an injected variable binding.

mod binding;
mod runner;

pub use binding::{Binding, BindingBuilder, VARIABLE_PREFIX};
pub use runner::{ScriptCause, ScriptFailure, ScriptOutput, ScriptRunner, ScriptTask};
