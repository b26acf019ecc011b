//! Download command for the tfget CLI.
//!
//! Caches a version without activating it.
//!
//! ## Usage
//!
//! ```bash
//! tfget download 1.5.7
//! tfget download latest
//! ```

use anyhow::Result;

use crate::toolchain::VersionCache;

use super::{SelectorArgs, load_config, resolve_selector};

/// Executes the download command.
///
/// # Process
///
/// 1. Fetch the release index and resolve the selector
/// 2. Download and unpack the archive unless the version is already cached
///
/// # Errors
///
/// Returns an error if:
/// - No selector was given or it matches no published version
/// - The release index or the archive cannot be downloaded
/// - The archive cannot be extracted
pub async fn execute(args: &SelectorArgs) -> Result<()> {
    let config = load_config()?;
    let version = resolve_selector(&config, args.selector()).await?;

    let cache = VersionCache::from_config(config)?;
    let path = cache.config().paths().entry_path(&version);

    if cache.ensure(&version).await? {
        println!("Downloaded terraform {version} to {}", path.display());
    } else {
        println!("terraform {version} is already cached at {}", path.display());
    }

    Ok(())
}
