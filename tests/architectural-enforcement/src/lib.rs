//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The chat core stays free of terminal UI crates
//! - No blocking HTTP or thread sleeps in production code
//!
//! These tests are designed to catch violations early in the development cycle.
//! The helpers here locate the workspace and walk its Rust sources.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Numbered lines of a source file that belong to production code
///
/// Stops at the first `#[cfg(test)]`, which is where unit test modules
/// live in this workspace. Line comments are stripped.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .collect()
}

/// Scan production code under `dirs` and report lines containing any pattern
#[must_use]
pub fn find_violations(dirs: &[&str], patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();

    for dir in dirs {
        for path in rust_sources(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for (line_number, code) in production_lines(&content) {
                for pattern in patterns {
                    if code.contains(pattern) {
                        violations.push(format!(
                            "{}:{} - {}: {}",
                            path.display(),
                            line_number,
                            pattern,
                            code.trim()
                        ));
                    }
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "use a; // note\nfn main() {}\n#[cfg(test)]\nmod tests { fn sleep() {} }\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "use a; "), (2, "fn main() {}")]);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
