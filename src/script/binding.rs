//! Variables handed to a script.

use std::collections::BTreeMap;
use std::path::Path;

use crate::environment::Environment;

/// Prefix of the environment variables a script receives.
pub const VARIABLE_PREFIX: &str = "REXSL_";

/// Named string variables visible to a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    variables: BTreeMap<String, String>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Variables as process environment pairs, `home` becomes `REXSL_HOME`.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.variables
            .iter()
            .map(|(name, value)| (env_name(name), value.clone()))
            .collect()
    }
}

fn env_name(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{VARIABLE_PREFIX}{upper}")
}

/// Builds the standard binding for an [`Environment`].
///
/// The result always carries `home`, `basedir`, `webdir`, `port` and
/// `classpath`; callers add their own variables on top.
#[derive(Debug, Clone)]
pub struct BindingBuilder {
    binding: Binding,
}

impl BindingBuilder {
    pub fn new(env: &Environment) -> Self {
        let mut binding = Binding::new();
        binding.set("home", env.home());
        binding.set("basedir", env.basedir().display().to_string());
        binding.set("webdir", env.webdir().display().to_string());
        binding.set("port", env.port().to_string());
        let classpath = std::env::join_paths(env.classpath(false))
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_default();
        binding.set("classpath", classpath);
        Self { binding }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.binding.set(name, value);
        self
    }

    pub fn with_path(self, name: impl Into<String>, path: &Path) -> Self {
        self.with(name, path.display().to_string())
    }

    pub fn build(self) -> Binding {
        self.binding
    }
}
