//! Archive scanning for the web application's libraries.

mod conflicts;

pub use conflicts::{class_entries, ClassEntry, Conflict, ConflictDetector, ConflictReport};
