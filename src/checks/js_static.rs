//! Offline lint of the scripts under `src/main/webapp/js`.

use std::fs;

use tracing::{debug, info};

use super::check::{Check, CheckKind, Outcome, Scope};
use super::css_static::in_scope;
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::utils::display_path;

/// Script folder, relative to basedir.
pub const JS_DIR: &str = "src/main/webapp/js";

#[derive(Debug, Clone, Default)]
pub struct JsStaticCheck {
    scope: Scope,
}

impl JsStaticCheck {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Check for JsStaticCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::JsStatic
    }

    fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.clone();
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let dir = env.basedir().join(JS_DIR);
        if !dir.is_dir() {
            info!("{JS_DIR} directory is absent, no JS tests");
            return Ok(Outcome::pass().with_note(format!("{JS_DIR} directory is absent")));
        }
        let files = in_scope(&FileFinder::new(&dir, "js"), &self.scope)?;
        let mut diagnostics = Vec::new();
        for file in &files {
            let js = fs::read_to_string(file)
                .map_err(|e| RexslError::io(format!("Failed to read {}", file.display()), e))?;
            let shown = display_path(file, env.basedir());
            diagnostics.extend(
                lint(&js)
                    .into_iter()
                    .map(|(line, message)| format!("{shown}:{line}: {message}")),
            );
        }
        debug!(files = files.len(), defects = diagnostics.len(), "scripts linted");
        Ok(Outcome::from_diagnostics(diagnostics))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment(usize),
    Quoted(char, usize),
    Regex(usize),
}

/// Defects of one script as `(line, message)`, in source order.
///
/// Strings, template literals, comments and regex literals are skipped.
/// A `/` starts a regex literal when the previous significant character
/// cannot end an expression.
pub fn lint(js: &str) -> Vec<(usize, String)> {
    let chars: Vec<char> = js.chars().collect();
    let mut defects = Vec::new();
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut mode = Mode::Code;
    let mut line = 1;
    let mut last_significant = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == '\n' {
            line += 1;
        }
        match mode {
            Mode::LineComment => {
                if c == '\n' {
                    mode = Mode::Code;
                }
            }
            Mode::BlockComment(_) => {
                if c == '*' && next == Some('/') {
                    mode = Mode::Code;
                    i += 1;
                }
            }
            Mode::Quoted(..) | Mode::Regex(_) if c == '\\' => {
                if next == Some('\n') {
                    line += 1;
                }
                i += 1;
            }
            Mode::Quoted(q, start) => {
                if c == q {
                    mode = Mode::Code;
                    last_significant = Some(c);
                } else if c == '\n' && q != '`' {
                    defects.push((start, "unterminated string literal".to_string()));
                    mode = Mode::Code;
                }
            }
            Mode::Regex(start) => {
                if c == '/' {
                    mode = Mode::Code;
                    last_significant = Some(c);
                } else if c == '\n' {
                    defects.push((start, "unterminated regex literal".to_string()));
                    mode = Mode::Code;
                }
            }
            Mode::Code => match c {
                '/' if next == Some('/') => {
                    mode = Mode::LineComment;
                    i += 1;
                }
                '/' if next == Some('*') => {
                    mode = Mode::BlockComment(line);
                    i += 1;
                }
                '/' if starts_regex(last_significant) => mode = Mode::Regex(line),
                '"' | '\'' | '`' => mode = Mode::Quoted(c, line),
                '(' | '[' | '{' => {
                    brackets.push((c, line));
                    last_significant = Some(c);
                }
                ')' | ']' | '}' => {
                    match brackets.pop() {
                        Some((open, _)) if closing(open) == c => {}
                        Some((open, opened)) => defects.push((
                            line,
                            format!("'{c}' does not match '{open}' opened on line {opened}"),
                        )),
                        None => defects.push((line, format!("unexpected '{c}'"))),
                    }
                    last_significant = Some(c);
                }
                c if is_ident_start(c) => {
                    let start = i;
                    while i + 1 < chars.len() && is_ident_part(chars[i + 1]) {
                        i += 1;
                    }
                    let word: String = chars[start..=i].iter().collect();
                    let preceded_by_dot = start > 0 && chars[start - 1] == '.';
                    if word == "debugger" && !preceded_by_dot {
                        defects.push((line, "'debugger' statement".to_string()));
                    }
                    if word == "eval" && followed_by_paren(&chars, i + 1) {
                        defects.push((line, "eval() call".to_string()));
                    }
                    last_significant = Some('a');
                }
                c if !c.is_whitespace() => last_significant = Some(c),
                _ => {}
            },
        }
        i += 1;
    }

    match mode {
        Mode::BlockComment(start) => defects.push((start, "unterminated comment".to_string())),
        Mode::Quoted(_, start) => defects.push((start, "unterminated string literal".to_string())),
        _ => {}
    }
    for (open, opened) in brackets {
        defects.push((opened, format!("'{open}' is never closed")));
    }
    defects.sort_by_key(|(line, _)| *line);
    defects
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn starts_regex(previous: Option<char>) -> bool {
    match previous {
        None => true,
        Some(c) => "(,=:[!&|?{};+-*%<>~^".contains(c),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn followed_by_paren(chars: &[char], from: usize) -> bool {
    chars[from.min(chars.len())..]
        .iter()
        .find(|c| !c.is_whitespace())
        .is_some_and(|c| *c == '(')
}
