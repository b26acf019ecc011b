//! List command for the tfget CLI.
//!
//! Displays the cached binaries and marks the active one.
//!
//! ## Usage
//!
//! ```bash
//! tfget list
//! tfget list-local
//! ```
//!
//! ## Output Format
//!
//! ```text
//!   terraform_0.14.3
//! * terraform_1.0.0
//! ```

use anyhow::Result;

use crate::toolchain::activate::active_version;

use super::load_config;

/// Executes the list command.
///
/// Works offline; the release index is never consulted.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be read.
pub fn execute() -> Result<()> {
    let config = load_config()?;
    let paths = config.paths();
    let entries = paths.list_entries()?;

    let active_name = active_version(&paths)?
        .map(|version| paths.entry_path(&version))
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()));
    let link_name = paths
        .active_link()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let cached: Vec<&String> = entries
        .iter()
        .filter(|name| Some(*name) != link_name.as_ref())
        .collect();

    if cached.is_empty() {
        println!("No versions cached.");
        println!();
        println!("Run 'tfget download <version>' or 'tfget switch <version>' to fetch one.");
        return Ok(());
    }

    for name in cached {
        let marker = if Some(name) == active_name.as_ref() { "*" } else { " " };
        println!("{marker} {name}");
    }

    Ok(())
}
