//! Path management for the version cache.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.tfget/versions/              # Cache root (or TFGET_HOME)
//!   terraform_1.5.7               # Cached binary for 1.5.7
//!   terraform_1.9.2
//!   terraform -> terraform_1.9.2  # Active link, the directory to put on PATH
//! ```
//!
//! Transient files (`*.zip`, `*.zip.tmp`, hidden staging directories and the
//! temporary link) only exist while a command runs.

use std::path::{Path, PathBuf};

use crate::config::PRODUCT;
use crate::errors::{Result, TfgetError};
use crate::toolchain::version::VersionId;

/// Prefix of cached binaries: `terraform_`.
fn entry_prefix() -> String {
    format!("{PRODUCT}_")
}

/// Paths derived from the cache root.
///
/// Every path is a pure function of the root and the version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    #[must_use = "returns new paths instance without side effects"]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `<root>/terraform_<version>`
    #[must_use = "returns the path without side effects"]
    pub fn entry_path(&self, version: &VersionId) -> PathBuf {
        self.root.join(format!("{}{version}", entry_prefix()))
    }

    /// `<root>/terraform_<version>.zip`
    #[must_use = "returns the path without side effects"]
    pub fn archive_path(&self, version: &VersionId) -> PathBuf {
        self.root.join(format!("{}{version}.zip", entry_prefix()))
    }

    /// Hidden directory an archive is unpacked into before the binary is
    /// moved onto [`entry_path`](Self::entry_path).
    #[must_use = "returns the path without side effects"]
    pub fn staging_dir(&self, version: &VersionId) -> PathBuf {
        self.root.join(format!(".{}{version}.extract", entry_prefix()))
    }

    /// `<root>/terraform`
    #[must_use = "returns the path without side effects"]
    pub fn active_link(&self) -> PathBuf {
        self.root.join(PRODUCT)
    }

    /// Where the replacement link is created before being renamed onto
    /// [`active_link`](Self::active_link).
    #[must_use = "returns the path without side effects"]
    pub fn pending_link(&self) -> PathBuf {
        self.root.join(format!(".{PRODUCT}.link"))
    }

    #[must_use = "returns installation status without side effects"]
    pub fn is_cached(&self, version: &VersionId) -> bool {
        self.entry_path(version).exists()
    }

    /// Recovers the version from a cached binary's path
    /// (`.../terraform_1.0.5` gives `1.0.5`).
    #[must_use]
    pub fn version_of(&self, path: &Path) -> Option<VersionId> {
        let name = path.file_name()?.to_str()?;
        let version = name.strip_prefix(&entry_prefix())?;
        let version = version.strip_suffix(".exe").unwrap_or(version);
        (!version.is_empty()).then(|| VersionId::new(version))
    }

    /// Names of the entries in the cache directory, sorted, skipping hidden
    /// transient files.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn list_entries(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            TfgetError::io(format!("failed to read directory {}", self.root.display()), e)
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TfgetError::io("failed to read directory entry", e))?;
            if let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> CachePaths {
        CachePaths::new(PathBuf::from("/cache"))
    }

    #[test]
    fn entry_path_is_pure_function_of_root_and_version() {
        let version = VersionId::new("1.0.5");
        assert_eq!(
            paths().entry_path(&version),
            PathBuf::from("/cache/terraform_1.0.5")
        );
        assert_eq!(paths().entry_path(&version), paths().entry_path(&version));
    }

    #[test]
    fn archive_sits_next_to_entry() {
        assert_eq!(
            paths().archive_path(&VersionId::new("0.12")),
            PathBuf::from("/cache/terraform_0.12.zip")
        );
    }

    #[test]
    fn active_link_is_fixed() {
        assert_eq!(paths().active_link(), PathBuf::from("/cache/terraform"));
    }

    #[test]
    fn version_of_reverses_entry_path() {
        let version = VersionId::new("1.9.2");
        let path = paths().entry_path(&version);

        assert_eq!(paths().version_of(&path), Some(version));
        assert_eq!(paths().version_of(Path::new("/cache/terraform")), None);
        assert_eq!(paths().version_of(Path::new("/cache/terraform_")), None);
    }

    #[test]
    fn list_entries_skips_hidden_files() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("terraform_1.0.0"), b"").unwrap();
        std::fs::write(temp.path().join("terraform_0.9.0"), b"").unwrap();
        std::fs::create_dir(temp.path().join(".terraform_2.0.0.extract")).unwrap();

        let listed = CachePaths::new(temp.path().to_path_buf())
            .list_entries()
            .unwrap();

        assert_eq!(listed, vec!["terraform_0.9.0", "terraform_1.0.0"]);
    }

    #[test]
    fn list_entries_fails_for_missing_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = CachePaths::new(temp.path().join("missing")).list_entries();
        assert!(matches!(result, Err(TfgetError::Io { .. })));
    }
}
