//! Switching the active version.
//!
//! The active version is whatever `<root>/terraform` links to. Switching
//! builds the new link under a hidden name and renames it over the old one,
//! so the active path always resolves to some complete binary.
//!
//! ## State
//!
//! ```text
//! Unlinked --switch(v)--> LinkedTo(v) --switch(w)--> LinkedTo(w)
//! ```
//!
//! There is no "unswitch"; removing the link is left to the user.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, TfgetError};
use crate::toolchain::cache::VersionCache;
use crate::toolchain::download::ArchiveFetcher;
use crate::toolchain::paths::CachePaths;
use crate::toolchain::version::VersionId;

pub struct Activator<F> {
    cache: VersionCache<F>,
}

impl<F: ArchiveFetcher> Activator<F> {
    #[must_use]
    pub fn new(cache: VersionCache<F>) -> Self {
        Self { cache }
    }

    /// Makes `version` the active one, downloading it first if needed.
    ///
    /// Returns the path of the active link.
    ///
    /// # Errors
    ///
    /// - [`TfgetError::Conflict`] if a system-wide installation exists; the
    ///   cache and the link are left untouched
    /// - any error from [`VersionCache::ensure`]
    /// - an I/O error if the link cannot be created or moved into place
    pub async fn switch(&self, version: &VersionId) -> Result<PathBuf> {
        let config = self.cache.config();
        if config.system_install.exists() {
            warn!(path = %config.system_install.display(), "System-wide installation detected");
            return Err(TfgetError::conflict(config.system_install.clone()));
        }

        self.cache.ensure(version).await?;

        let paths = config.paths();
        let source = paths.entry_path(version);
        let pending = paths.pending_link();
        let active = paths.active_link();

        remove_if_present(&pending)?;
        create_link(&source, &pending)?;
        std::fs::rename(&pending, &active).map_err(|e| {
            let _ = std::fs::remove_file(&pending);
            TfgetError::io(
                format!("failed to move {} to {}", pending.display(), active.display()),
                e,
            )
        })?;

        info!(%version, link = %active.display(), "Switched active version");
        Ok(active)
    }
}

/// Reads the active link under `paths` and returns the version it names.
///
/// Returns `None` when there is no link, or when the active binary is a hard
/// link or copy (the fallbacks on Windows) whose version cannot be recovered.
///
/// # Errors
///
/// Returns an error if the link exists but cannot be read.
pub fn active_version(paths: &CachePaths) -> Result<Option<VersionId>> {
    let active = paths.active_link();

    let metadata = match active.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(TfgetError::io(
                format!("failed to inspect {}", active.display()),
                e,
            ));
        }
    };

    if !metadata.file_type().is_symlink() {
        debug!(path = %active.display(), "Active binary is not a symlink");
        return Ok(None);
    }

    let target = std::fs::read_link(&active)
        .map_err(|e| TfgetError::io(format!("failed to read link {}", active.display()), e))?;
    Ok(paths.version_of(&target))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(TfgetError::io(
            format!("failed to remove {}", path.display()),
            e,
        )),
        _ => Ok(()),
    }
}

/// Creates a link at `target` pointing to `source`.
///
/// On Windows, falls back to a hard link or a copy when symlinks are not
/// permitted.
fn create_link(source: &Path, target: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(source, target).map_err(|e| {
        TfgetError::io(
            format!(
                "failed to create symlink from {} to {}",
                source.display(),
                target.display()
            ),
            e,
        )
    })?;

    #[cfg(windows)]
    std::os::windows::fs::symlink_file(source, target)
        .or_else(|_| std::fs::hard_link(source, target))
        .or_else(|_| std::fs::copy(source, target).map(|_| ()))
        .map_err(|e| {
            TfgetError::io(
                format!(
                    "failed to create link from {} to {}",
                    source.display(),
                    target.display()
                ),
                e,
            )
        })?;

    Ok(())
}
