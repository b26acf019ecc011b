//! Error types for the tfget CLI.
//!
//! Every layer below `main` returns [`TfgetError`] so that callers (and tests)
//! can match on the failure class. Commands wrap these in `anyhow` for extra
//! context; only the entry point decides how to exit.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the toolchain layer.
pub type Result<T> = std::result::Result<T, TfgetError>;

/// Consolidated error type for tfget operations.
#[derive(Debug, Error)]
pub enum TfgetError {
    /// Timeout, DNS failure, refused connection or a non-success HTTP status.
    #[error("network error: {message}")]
    Network {
        /// Description of the failed request.
        message: String,
        /// The underlying transport error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The selector matched nothing in the release catalog.
    #[error("version not found: {selector}")]
    NotFound {
        /// The selector as typed by the user.
        selector: String,
    },

    /// No selector was given to a command that needs one.
    #[error("no version selector given")]
    MissingSelector,

    /// The release index produced no versions at all.
    #[error("release index contained no versions")]
    EmptyCatalog,

    /// A system-wide installation occupies the reserved path.
    #[error("detected system-wide installation at {path}; refusing to switch")]
    Conflict {
        /// The reserved install path that exists.
        path: PathBuf,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive is unreadable or does not contain what we expect.
    #[error("archive error: {message}")]
    Archive {
        /// Description of the archive problem.
        message: String,
    },

    /// Extraction wrote more bytes than allowed.
    #[error("archive expands beyond the {limit} byte limit")]
    ArchiveTooLarge {
        /// The configured limit in bytes.
        limit: u64,
    },

    /// No release is published for this OS/architecture.
    #[error("unsupported platform: {os} on {arch}")]
    UnsupportedPlatform {
        /// Rust OS name.
        os: String,
        /// Rust architecture name.
        arch: String,
    },

    /// The home directory could not be determined.
    #[error("cannot determine home directory; set TFGET_HOME")]
    HomeNotFound,

    /// An environment override could not be parsed.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// Unknown or missing subcommand.
    #[error("help not implemented yet: {message}")]
    UnknownCommand {
        /// What was typed (or that nothing was).
        message: String,
    },
}

impl TfgetError {
    /// Creates a new `Network` error without a source.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Network` error with a source error.
    #[must_use]
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::NotFound {
            selector: selector.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(path: impl Into<PathBuf>) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `Archive` error.
    #[must_use]
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownCommand` error.
    #[must_use]
    pub fn unknown_command(message: impl Into<String>) -> Self {
        Self::UnknownCommand {
            message: message.into(),
        }
    }

    /// Exit status the process should terminate with for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownCommand { .. } | Self::MissingSelector => 2,
            _ => 1,
        }
    }
}

impl From<zip::result::ZipError> for TfgetError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => Self::io("failed to read archive", source),
            other => Self::archive(other.to_string()),
        }
    }
}
