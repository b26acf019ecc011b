//! List-remote command for the tfget CLI.
//!
//! Prints every version published on the release index, newest first, one
//! per line.
//!
//! ## Usage
//!
//! ```bash
//! tfget list-remote
//! tfget list-remote | head -5
//! ```

use anyhow::{Context, Result};

use crate::config::Config;
use crate::errors::TfgetError;
use crate::toolchain::fetch_release_index;

/// Executes the list-remote command.
///
/// # Errors
///
/// Returns an error if the release index cannot be fetched or lists no
/// versions.
pub async fn execute() -> Result<()> {
    let config = Config::from_env()?;
    let catalog = fetch_release_index(&config)
        .await
        .context("Could not load the list of available versions")?;

    if catalog.is_empty() {
        return Err(TfgetError::EmptyCatalog.into());
    }

    for version in &catalog {
        println!("{version}");
    }

    Ok(())
}
