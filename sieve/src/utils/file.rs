//! File utility functions

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Path argument that means standard input
pub const STDIN_PATH: &str = "-";

/// Expand a path string to an absolute path.
///
/// Handles `~` and `~/path` via the home directory and resolves relative
/// paths against the current directory. Absolute paths pass through.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a whole input, `-` meaning standard input
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIN_PATH {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read standard input")?;
        return Ok(content);
    }

    let expanded = expand_path(&path.to_string_lossy());
    tracing::debug!(path = %expanded.display(), "Reading input file");
    std::fs::read_to_string(&expanded)
        .with_context(|| format!("Failed to read file: {}", expanded.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let abs = std::env::temp_dir().join("sieve.json");
        assert_eq!(expand_path(&abs.to_string_lossy()), abs);
    }

    #[test]
    fn test_relative_path_is_absolute() {
        let expanded = expand_path("data.json");
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("data.json"));
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/.sieve"), home.join(".sieve"));
        }
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert_eq!(read_input(&path).unwrap(), "[1, 2]");
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
