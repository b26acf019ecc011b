//! The local version cache.
//!
//! A version is cached when `<root>/terraform_<version>` exists; nothing else
//! is recorded. [`VersionCache::ensure`] is the only way entries are created.

use tracing::info;

use crate::config::{Config, PRODUCT};
use crate::errors::Result;
use crate::toolchain::archive::install_binary;
use crate::toolchain::download::{ArchiveFetcher, HttpFetcher, format_bytes};
use crate::toolchain::version::VersionId;

/// Downloads and unpacks versions on demand.
pub struct VersionCache<F> {
    config: Config,
    fetcher: F,
}

impl VersionCache<HttpFetcher> {
    /// Cache backed by the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: ArchiveFetcher> VersionCache<F> {
    #[must_use]
    pub fn new(config: Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Makes sure `version` is present in the cache.
    ///
    /// Returns `true` if it had to be downloaded and `false` if it was
    /// already there, in which case the network is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the extraction fails. The cache
    /// entry is not created in that case.
    pub async fn ensure(&self, version: &VersionId) -> Result<bool> {
        let paths = self.config.paths();
        let target = paths.entry_path(version);

        if paths.is_cached(version) {
            info!(%version, path = %target.display(), "Version already cached");
            return Ok(false);
        }

        let url = self.config.archive_url(version.as_str());
        let archive = paths.archive_path(version);

        info!(%version, %url, "Downloading");
        let bytes = self.fetcher.fetch(&url, &archive).await?;
        info!(%version, size = %format_bytes(bytes), "Download finished, extracting");

        let binary_name = format!("{PRODUCT}{}", self.config.platform.executable_extension());
        install_binary(
            &archive,
            &paths.staging_dir(version),
            &target,
            &binary_name,
            self.config.max_extract_bytes,
        )?;

        info!(%version, path = %target.display(), "Installed");
        Ok(true)
    }
}
