//! Platform detection for release archives.
//!
//! Terraform archives are named after Go's `GOOS`/`GOARCH` pairs
//! (`linux_amd64`, `darwin_arm64`, ...), so Rust's target names are mapped
//! onto those identifiers here.

use std::fmt;

use crate::errors::{Result, TfgetError};

/// An OS/architecture pair in the release naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// Creates a platform from release identifiers (e.g. `"linux"`, `"amd64"`).
    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// Detects the platform this binary was compiled for.
    ///
    /// # Errors
    ///
    /// Returns [`TfgetError::UnsupportedPlatform`] if no release is published
    /// for the current OS or architecture.
    pub fn detect() -> Result<Self> {
        Self::from_rust(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_rust(os: &str, arch: &str) -> Result<Self> {
        let unsupported = || TfgetError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let release_os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            "freebsd" => "freebsd",
            "openbsd" => "openbsd",
            "solaris" => "solaris",
            _ => return Err(unsupported()),
        };
        let release_arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "arm",
            _ => return Err(unsupported()),
        };

        Ok(Self::new(release_os, release_arch))
    }

    /// Release OS identifier.
    #[must_use]
    pub const fn os(self) -> &'static str {
        self.os
    }

    /// Release architecture identifier.
    #[must_use]
    pub const fn arch(self) -> &'static str {
        self.arch
    }

    /// Returns `.exe` on Windows, empty otherwise.
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        if self.os == "windows" { ".exe" } else { "" }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}
