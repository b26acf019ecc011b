//! Selector resolution.
//!
//! Maps what the user typed to one concrete entry of the release catalog:
//!
//! 1. `latest` - the newest version in the catalog
//! 2. anything else - the first version (newest first) whose text contains
//!    the selector
//!
//! Matching is substring containment, not equality. `0.12` picks `0.12.31`
//! when no exact `0.12` release exists, but `1.0` also matches `11.0.3` if
//! that sorts first. Users wanting a specific release should type it in full.

use tracing::debug;

use crate::errors::{Result, TfgetError};
use crate::toolchain::version::{ReleaseCatalog, VersionId};

/// Selector that always picks the newest release.
pub const LATEST: &str = "latest";

/// Resolves `selector` against `catalog`, returning the matched entry.
///
/// # Errors
///
/// - [`TfgetError::MissingSelector`] if `selector` is empty
/// - [`TfgetError::EmptyCatalog`] if `selector` is `latest` and the catalog is empty
/// - [`TfgetError::NotFound`] if no entry contains `selector`
pub fn resolve(selector: &str, catalog: &ReleaseCatalog) -> Result<VersionId> {
    if selector.is_empty() {
        return Err(TfgetError::MissingSelector);
    }

    let resolved = if selector == LATEST {
        catalog.latest().ok_or(TfgetError::EmptyCatalog)?
    } else {
        catalog
            .iter()
            .find(|v| v.as_str().contains(selector))
            .ok_or_else(|| TfgetError::not_found(selector))?
    };

    debug!(selector, version = %resolved, "Resolved selector");
    Ok(resolved.clone())
}
