//! Runtime configuration for tfget.
//!
//! Every component receives its settings from a [`Config`] value instead of
//! reading process-wide constants, so tests can point the tool at a temp
//! directory and a mock release server.
//!
//! ## Environment Variables
//!
//! - `TFGET_HOME` - cache root (default: `~/.tfget/versions`)
//! - `TFGET_RELEASES_URL` - release index (default: `https://releases.hashicorp.com/terraform/`)
//! - `TFGET_SYSTEM_INSTALL` - reserved system-wide install path (default: `/usr/local/bin/terraform`)
//! - `TFGET_TIMEOUT_SECS` - per-request deadline in seconds (default: 10)
//! - `TFGET_MAX_EXTRACT_BYTES` - extraction size limit (default: 1 GiB)

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, TfgetError};
use crate::toolchain::paths::CachePaths;
use crate::toolchain::platform::Platform;

pub const TFGET_HOME_ENV: &str = "TFGET_HOME";
pub const RELEASES_URL_ENV: &str = "TFGET_RELEASES_URL";
pub const SYSTEM_INSTALL_ENV: &str = "TFGET_SYSTEM_INSTALL";
pub const TIMEOUT_ENV: &str = "TFGET_TIMEOUT_SECS";
pub const MAX_EXTRACT_ENV: &str = "TFGET_MAX_EXTRACT_BYTES";

/// Name of the managed product; prefixes index entries and cached binaries.
pub const PRODUCT: &str = "terraform";

const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com/terraform/";

/// Cache root relative to the user's home directory.
const DEFAULT_CACHE_DIR: &str = ".tfget/versions";

const DEFAULT_SYSTEM_INSTALL: &str = "/usr/local/bin/terraform";

/// Deadline applied to every HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on bytes written while extracting one archive (1 GiB).
pub const DEFAULT_MAX_EXTRACT_BYTES: u64 = 1 << 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding cached binaries and the active link.
    pub cache_root: PathBuf,
    /// Release index URL, without trailing slash.
    pub releases_url: String,
    /// Platform whose archives are downloaded.
    pub platform: Platform,
    /// A file here means an unmanaged installation exists.
    pub system_install: PathBuf,
    pub request_timeout: Duration,
    pub max_extract_bytes: u64,
}

impl Config {
    /// Builds the configuration from the environment and detected platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported, the home directory
    /// cannot be found (and `TFGET_HOME` is unset), or a numeric override
    /// does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    fn from_lookup(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Result<Self> {
        let cache_root = match env(TFGET_HOME_ENV) {
            Some(value) => expand_home(&value, home.as_deref())?,
            None => home.ok_or(TfgetError::HomeNotFound)?.join(DEFAULT_CACHE_DIR),
        };

        let mut config = Self::with_root(cache_root, Platform::detect()?);

        if let Some(url) = env(RELEASES_URL_ENV) {
            config.releases_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = env(SYSTEM_INSTALL_ENV) {
            config.system_install = PathBuf::from(path);
        }
        if let Some(secs) = env(TIMEOUT_ENV) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                TfgetError::invalid_config(format!("{TIMEOUT_ENV} must be whole seconds, got '{secs}'"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = env(MAX_EXTRACT_ENV) {
            config.max_extract_bytes = bytes.trim().parse::<u64>().map_err(|_| {
                TfgetError::invalid_config(format!("{MAX_EXTRACT_ENV} must be a byte count, got '{bytes}'"))
            })?;
        }

        Ok(config)
    }

    /// Configuration with default settings rooted at `cache_root`.
    #[must_use]
    pub fn with_root(cache_root: PathBuf, platform: Platform) -> Self {
        Self {
            cache_root,
            releases_url: DEFAULT_RELEASES_URL.trim_end_matches('/').to_string(),
            platform,
            system_install: PathBuf::from(DEFAULT_SYSTEM_INSTALL),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_extract_bytes: DEFAULT_MAX_EXTRACT_BYTES,
        }
    }

    #[must_use]
    pub fn paths(&self) -> CachePaths {
        CachePaths::new(self.cache_root.clone())
    }

    /// URL of the release index page.
    #[must_use]
    pub fn index_url(&self) -> String {
        format!("{}/", self.releases_url)
    }

    /// URL of the archive for `version` on the configured platform.
    #[must_use]
    pub fn archive_url(&self, version: &str) -> String {
        format!(
            "{}/{version}/{PRODUCT}_{version}_{}_{}.zip",
            self.releases_url,
            self.platform.os(),
            self.platform.arch()
        )
    }

    /// Creates the cache root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_cache_root(&self) -> Result<()> {
        if self.cache_root.is_dir() {
            return Ok(());
        }
        tracing::info!(path = %self.cache_root.display(), "Cache directory not found, creating");

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.cache_root).map_err(|e| {
            TfgetError::io(
                format!("failed to create directory {}", self.cache_root.display()),
                e,
            )
        })
    }
}

/// Expands a leading `~` or `$HOME` in a configured path.
fn expand_home(value: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = value
        .strip_prefix("$HOME")
        .or_else(|| value.strip_prefix('~'));

    match rest {
        Some(rest) => {
            let home = home.ok_or(TfgetError::HomeNotFound)?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        }
        None => Ok(PathBuf::from(value)),
    }
}
