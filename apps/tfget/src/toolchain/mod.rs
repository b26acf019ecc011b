//! Terraform version management.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture naming for release archives
//! - [`version`] - Version ordering and the release catalog
//! - [`paths`] - Cache directory layout
//! - [`index`] - Release index fetching and scraping
//! - [`resolver`] - Selector to version resolution
//! - [`download`] - Streaming archive downloads
//! - [`archive`] - ZIP extraction
//! - [`cache`] - Download-once cache of binaries
//! - [`activate`] - The active version link
//! - [`conflict`] - PATH shadowing detection

pub mod activate;
pub mod archive;
pub mod cache;
pub mod conflict;
pub mod download;
pub mod index;
pub mod paths;
pub mod platform;
pub mod resolver;
pub mod version;

pub use activate::Activator;
pub use cache::VersionCache;
pub use index::fetch_release_index;
pub use paths::CachePaths;
pub use platform::Platform;
pub use resolver::resolve;
pub use version::{ReleaseCatalog, VersionId};
