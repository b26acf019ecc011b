//! Switch command for the tfget CLI.
//!
//! Makes a version the active one, downloading it first if needed.
//!
//! ## Usage
//!
//! ```bash
//! tfget switch 1.5.7
//! tfget use latest
//! ```
//!
//! The active binary is `<cache root>/terraform`; the cache root must be on
//! `PATH` for the shell to pick it up.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::PRODUCT;
use crate::toolchain::conflict::{detect_path_shadowing, format_shadowing_warning};
use crate::toolchain::{Activator, VersionCache};

use super::{SelectorArgs, load_config, resolve_selector};

/// Executes the switch command.
///
/// # Process
///
/// 1. Fetch the release index and resolve the selector
/// 2. Refuse if a system-wide installation exists
/// 3. Download the version unless it is cached
/// 4. Point the active link at it
/// 5. Warn if another `terraform` shadows the link on `PATH`
///
/// # Errors
///
/// Returns an error if:
/// - No selector was given or it matches no published version
/// - A system-wide installation is present
/// - Downloading, extracting or linking fails
pub async fn execute(args: &SelectorArgs) -> Result<()> {
    let config = load_config()?;
    let version = resolve_selector(&config, args.selector()).await?;
    let executable = format!("{PRODUCT}{}", config.platform.executable_extension());
    let root = config.cache_root.clone();

    let activator = Activator::new(VersionCache::from_config(config)?);
    let link = activator.switch(&version).await?;

    println!("Switched to terraform {version}");

    info!(
        path = %std::env::var("PATH").unwrap_or_default(),
        "Make sure the cache directory is on PATH: export PATH=\"{}:$PATH\"",
        root.display()
    );

    if let Some(shadowing) = detect_path_shadowing(&executable, &link) {
        warn!("{}", format_shadowing_warning(&shadowing));
    }

    Ok(())
}
