//! PATH shadowing detection.
//!
//! Switching only changes what `<root>/terraform` points at. If another
//! `terraform` comes earlier in `PATH` (or the cache root is not on `PATH`
//! at all), the shell keeps running that one. This is only ever reported,
//! never fixed.

use std::path::{Path, PathBuf};

/// A `terraform` on `PATH` that is not the managed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathShadowing {
    /// What `which terraform` resolves to.
    pub found: PathBuf,
    /// The managed active link.
    pub expected: PathBuf,
}

/// Looks up `binary` on `PATH` and reports it if it is not `active_link`.
///
/// Returns `None` when nothing is found on `PATH` or when the lookup lands on
/// the managed link itself.
#[must_use]
pub fn detect_path_shadowing(binary: &str, active_link: &Path) -> Option<PathShadowing> {
    let found = which::which(binary).ok()?;
    shadowing_between(found, active_link)
}

fn shadowing_between(found: PathBuf, active_link: &Path) -> Option<PathShadowing> {
    if found == active_link {
        return None;
    }
    Some(PathShadowing {
        found,
        expected: active_link.to_path_buf(),
    })
}

/// Formats a user-facing warning for a shadowing binary.
#[must_use]
pub fn format_shadowing_warning(shadowing: &PathShadowing) -> String {
    let mut lines = vec![
        format!("'terraform' resolves to {}", shadowing.found.display()),
        format!("  but the managed version is at {}", shadowing.expected.display()),
    ];

    if let Some(dir) = shadowing.expected.parent() {
        lines.push(format!(
            "  Fix: ensure {} comes before {} in $PATH",
            dir.display(),
            shadowing
                .found
                .parent()
                .map_or_else(|| "other entries".to_string(), |p| p.display().to_string())
        ));
    }

    lines.join("\n")
}
