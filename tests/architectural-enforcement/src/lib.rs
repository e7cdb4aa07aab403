//! Architectural Enforcement Integration Tests
//!
//! Source-scanning helpers shared by the tests in `tests/`. They keep the
//! engine core deterministic:
//! - No sleep() calls anywhere in production code
//! - No wall-clock reads outside the clock module
//! - No file access outside the config loader
//!
//! Test modules (everything after a `#[cfg(test)]` line) and comments are
//! not scanned.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Production source directory of the engine core
pub fn core_src() -> PathBuf {
    workspace_root().join("engine").join("core").join("src")
}

/// Production source directory of the host daemon
pub fn daemon_src() -> PathBuf {
    workspace_root().join("engine").join("daemon").join("src")
}

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Every `.rs` file under `dir`
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of `content` as `(line_number, code)` with comments removed
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// Find `patterns` in production code under `dir`, skipping files whose
/// name is in `allowed_files`
pub fn scan(dir: &Path, patterns: &[&str], allowed_files: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for path in rust_files(dir) {
        let allowed = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| allowed_files.contains(&name));
        if allowed {
            continue;
        }

        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };

        for (line, code) in production_lines(&content) {
            if patterns.iter().any(|p| code.contains(p)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }

    violations
}

/// Print violations and fail with `summary`
pub fn report(violations: &[Violation], summary: &str) {
    if violations.is_empty() {
        return;
    }
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\n{summary}: {} violation(s)", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_strip_comments_and_tests() {
        let source = "let a = 1; // Utc::now()\n// sleep(\nlet b = 2;\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "let a = 1; "), (3, "let b = 2;")]);
    }

    #[test]
    fn test_core_sources_found() {
        let files = rust_files(&core_src());
        assert!(files.iter().any(|p| p.ends_with("lib.rs")));
        assert!(files.iter().any(|p| p.ends_with("clock.rs")));
    }
}
