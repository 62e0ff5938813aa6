//! Filesystem helpers shared by the checks.

mod finder;

pub use finder::{is_hidden, list_files, FileFinder};
