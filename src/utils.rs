use std::path::Path;

/// Display a path relative to the project basedir, or just its file name
/// when it lives elsewhere.
pub fn display_path(path: &Path, basedir: &Path) -> String {
    path.strip_prefix(basedir)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string())
        })
}

/// Truncate by character count so multi-byte text stays valid UTF-8.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Last non-empty line of command output, used as a one-line summary.
pub fn last_line(output: &str) -> Option<&str> {
    output.lines().rev().map(str::trim).find(|l| !l.is_empty())
}
