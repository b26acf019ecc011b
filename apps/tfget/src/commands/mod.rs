//! Command modules for the tfget CLI.
//!
//! ## Local Commands
//!
//! - [`list`] - List cached versions
//! - [`which`] - Print the active version
//!
//! ## Remote Commands
//!
//! - [`list_remote`] - List versions published on the release index
//! - [`download`] - Cache a version without activating it
//! - [`switch`] - Cache and activate a version

pub mod download;
pub mod list;
pub mod list_remote;
pub mod switch;
pub mod which;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Config;
use crate::errors::TfgetError;
use crate::toolchain::{VersionId, fetch_release_index, resolve};

/// Arguments shared by commands that act on one version.
#[derive(Args)]
pub struct SelectorArgs {
    /// Version to act on: `latest`, a full version such as `1.5.7`, or a
    /// fragment such as `1.5` (first match in the release index wins).
    pub selector: Option<String>,
}

impl SelectorArgs {
    fn selector(&self) -> &str {
        self.selector.as_deref().unwrap_or_default()
    }
}

/// Loads the configuration and makes sure the cache root exists.
fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    config.ensure_cache_root()?;
    Ok(config)
}

/// Fetches the release index and resolves `selector` against it.
async fn resolve_selector(config: &Config, selector: &str) -> Result<VersionId> {
    if selector.is_empty() {
        return Err(TfgetError::MissingSelector.into());
    }

    let catalog = fetch_release_index(config)
        .await
        .context("Could not load the list of available versions")?;
    if catalog.is_empty() {
        return Err(TfgetError::EmptyCatalog.into());
    }

    Ok(resolve(selector, &catalog)?)
}
