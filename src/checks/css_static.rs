//! Offline lint of the stylesheets under `src/main/webapp/css`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use super::check::{Check, CheckKind, Outcome, Scope};
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::utils::display_path;

/// Stylesheet folder, relative to basedir.
pub const CSS_DIR: &str = "src/main/webapp/css";

#[derive(Debug, Clone, Default)]
pub struct CssStaticCheck {
    scope: Scope,
}

impl CssStaticCheck {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Check for CssStaticCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::CssStatic
    }

    fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.clone();
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let files = in_scope(&FileFinder::new(env.basedir().join(CSS_DIR), "css"), &self.scope)?;
        let mut diagnostics = Vec::new();
        for file in &files {
            let css = fs::read_to_string(file)
                .map_err(|e| RexslError::io(format!("Failed to read {}", file.display()), e))?;
            let shown = display_path(file, env.basedir());
            diagnostics.extend(
                lint(&css)
                    .into_iter()
                    .map(|(line, message)| format!("{shown}:{line}: {message}")),
            );
        }
        debug!(files = files.len(), defects = diagnostics.len(), "stylesheets linted");
        Ok(Outcome::from_diagnostics(diagnostics))
    }
}

/// Ordered files whose name is in scope.
pub(super) fn in_scope(finder: &FileFinder, scope: &Scope) -> Result<Vec<std::path::PathBuf>> {
    Ok(finder
        .ordered()?
        .into_iter()
        .filter(|file| scope.matches(&file_name(file)))
        .collect())
}

pub(super) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct Block {
    line: usize,
    body: String,
    nested: bool,
}

/// Defects of one stylesheet as `(line, message)`, in source order.
pub fn lint(css: &str) -> Vec<(usize, String)> {
    let mut defects = Vec::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut line = 1;
    let mut comment_start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            quote = None;
        }
        if comment_start.is_some() {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                comment_start = None;
            }
            continue;
        }
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            push(&mut stack, c);
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                comment_start = Some(line);
            }
            '"' | '\'' => {
                quote = Some(c);
                push(&mut stack, c);
            }
            '{' => {
                if let Some(parent) = stack.last_mut() {
                    parent.nested = true;
                }
                stack.push(Block {
                    line,
                    body: String::new(),
                    nested: false,
                });
            }
            '}' => match stack.pop() {
                Some(block) if !block.nested => check_rule_set(&block, &mut defects),
                Some(_) => {}
                None => defects.push((line, "unexpected '}' without matching '{'".to_string())),
            },
            _ => push(&mut stack, c),
        }
    }

    if let Some(start) = comment_start {
        defects.push((start, "unterminated comment".to_string()));
    }
    for block in stack {
        defects.push((block.line, "'{' is never closed".to_string()));
    }
    defects.sort_by_key(|(line, _)| *line);
    defects
}

fn push(stack: &mut [Block], c: char) {
    if let Some(block) = stack.last_mut() {
        block.body.push(c);
    }
}

fn check_rule_set(block: &Block, defects: &mut Vec<(usize, String)>) {
    if block.body.trim().is_empty() {
        defects.push((block.line, "empty rule set".to_string()));
        return;
    }
    let mut seen = HashSet::new();
    for declaration in block.body.split(';') {
        let Some((property, _)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        if !property.is_empty() && !seen.insert(property.clone()) {
            defects.push((block.line, format!("duplicate property '{property}'")));
        }
    }
}
