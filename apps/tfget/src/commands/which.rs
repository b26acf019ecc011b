//! Which command for the tfget CLI.
//!
//! Prints the version the active link points at.
//!
//! ## Usage
//!
//! ```bash
//! tfget which
//! tfget which-version
//! ```

use anyhow::Result;

use crate::toolchain::activate::active_version;

use super::load_config;

/// Executes the which command.
///
/// Prints nothing and succeeds when no version is active.
///
/// # Errors
///
/// Returns an error if the active link cannot be read.
pub fn execute() -> Result<()> {
    let config = load_config()?;

    match active_version(&config.paths())? {
        Some(version) => println!("{version}"),
        None => tracing::info!("No active version; run 'tfget switch <version>'"),
    }

    Ok(())
}
