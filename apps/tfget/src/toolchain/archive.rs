//! Archive extraction.
//!
//! Release archives are ZIP files holding the binary (and, for newer
//! releases, a `LICENSE.txt`). [`install_binary`] unpacks into a hidden
//! staging directory and renames the binary onto its cache path, so the
//! cache path only ever holds a complete file.
//!
//! Extraction is bounded: the total number of bytes written for one archive
//! may not exceed the configured limit, which guards against archives that
//! expand far beyond their download size.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{Result, TfgetError};

/// Extracts every entry of the ZIP archive at `archive_path` below `dest_dir`.
///
/// Entry bytes are streamed to `dest_dir/<entry name>`, which is created or
/// truncated, and the entry's unix mode bits are applied when the archive
/// declares them. Returns the relative paths of the files written.
///
/// # Errors
///
/// Any failure aborts the whole extraction:
/// - the archive cannot be opened or is not a valid ZIP file
/// - an entry has an absolute path or contains `..`
/// - a file or directory cannot be created or written
/// - more than `limit` bytes would be written ([`TfgetError::ArchiveTooLarge`])
pub fn extract_archive(archive_path: &Path, dest_dir: &Path, limit: u64) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| {
        TfgetError::io(format!("failed to open archive {}", archive_path.display()), e)
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    create_dir_all(dest_dir)?;

    let mut written: u64 = 0;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let relative_path = entry
            .enclosed_name()
            .filter(|p| is_safe_relative(p))
            .ok_or_else(|| {
                TfgetError::archive(format!(
                    "refusing to extract entry with unsafe path: {}",
                    entry.name()
                ))
            })?;

        let output_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            create_dir_all(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            create_dir_all(parent)?;
        }

        let mode = permission_bits(entry.unix_mode());
        let mut outfile = open_destination(&output_path, mode)?;

        let remaining = limit.saturating_sub(written);
        let copied = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut outfile)
            .map_err(|e| {
                TfgetError::io(format!("failed to extract {}", output_path.display()), e)
            })?;
        if copied > remaining {
            warn!(archive = %archive_path.display(), limit, "Archive exceeds extraction limit");
            return Err(TfgetError::ArchiveTooLarge { limit });
        }
        written += copied;

        if let Some(mode) = mode {
            set_mode(&output_path, mode)?;
        }

        debug!(entry = %relative_path.display(), bytes = copied, "Extracted");
        extracted.push(relative_path);
    }

    Ok(extracted)
}

/// Unpacks the archive and moves the product binary onto `target`.
///
/// The binary is the entry named `binary_name`, or the only file of a
/// single-file archive. It is made executable before being renamed into
/// place. The staging directory and the archive are removed afterwards,
/// whether or not installation succeeded.
///
/// # Errors
///
/// Returns an error if extraction fails, no binary can be identified, or the
/// binary cannot be moved onto `target`.
pub fn install_binary(
    archive_path: &Path,
    staging_dir: &Path,
    target: &Path,
    binary_name: &str,
    limit: u64,
) -> Result<()> {
    if staging_dir.exists() {
        remove_dir_all(staging_dir)?;
    }

    let result = extract_archive(archive_path, staging_dir, limit).and_then(|files| {
        let binary = staging_dir.join(select_binary(&files, binary_name)?);
        make_executable(&binary)?;
        std::fs::rename(&binary, target).map_err(|e| {
            TfgetError::io(
                format!("failed to move {} to {}", binary.display(), target.display()),
                e,
            )
        })
    });

    if let Err(e) = remove_dir_all(staging_dir) {
        warn!(error = %e, "Failed to clean up staging directory");
    }

    match result {
        Ok(()) => std::fs::remove_file(archive_path).map_err(|e| {
            TfgetError::io(format!("failed to remove {}", archive_path.display()), e)
        }),
        Err(e) => {
            let _ = std::fs::remove_file(archive_path);
            Err(e)
        }
    }
}

fn select_binary<'a>(files: &'a [PathBuf], binary_name: &str) -> Result<&'a Path> {
    if let Some(binary) = files
        .iter()
        .find(|p| p.file_name().is_some_and(|n| n == binary_name))
    {
        return Ok(binary);
    }

    match files {
        [only] => Ok(only),
        _ => Err(TfgetError::archive(format!(
            "archive does not contain {binary_name}"
        ))),
    }
}

/// Keeps the rwx bits of a declared mode. File type, setuid, setgid and
/// sticky bits from a downloaded archive are never applied.
fn permission_bits(unix_mode: Option<u32>) -> Option<u32> {
    unix_mode.map(|m| m & 0o777)
}

/// Defense in depth on top of `enclosed_name`.
fn is_safe_relative(path: &Path) -> bool {
    !path.is_absolute() && !path.components().any(|c| matches!(c, Component::ParentDir))
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| TfgetError::io(format!("failed to create directory {}", dir.display()), e))
}

fn remove_dir_all(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(TfgetError::io(
            format!("failed to remove directory {}", dir.display()),
            e,
        )),
        _ => Ok(()),
    }
}

#[allow(unused_variables)]
fn open_destination(path: &Path, mode: Option<u32>) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    options
        .open(path)
        .map_err(|e| TfgetError::io(format!("failed to create file {}", path.display()), e))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| TfgetError::io(format!("failed to set permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Adds execute bits for everyone who can read the file (Unix only).
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .map_err(|e| TfgetError::io(format!("failed to get metadata of {}", path.display()), e))?
        .permissions()
        .mode();
    let readable = mode & 0o444;
    set_mode(path, (mode | 0o700 | (readable >> 2)) & 0o777)
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Writes a ZIP archive with the given `(name, body, mode)` entries.
    fn create_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
        let file = File::create(path).expect("Should create file");
        let mut zip = zip::ZipWriter::new(file);
        for (name, body, mode) in entries {
            let options = SimpleFileOptions::default().unix_permissions(*mode);
            zip.start_file(*name, options).expect("Should start file");
            zip.write_all(body).expect("Should write");
        }
        zip.finish().expect("Should finish");
    }

    #[test]
    fn single_entry_round_trips_byte_for_byte() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("test.zip");
        let dest = temp.path().join("out");
        create_zip(&archive, &[("foo.txt", b"Dummy file", 0o644)]);

        let files = extract_archive(&archive, &dest, 1024).expect("Should extract");

        assert_eq!(files, vec![PathBuf::from("foo.txt")]);
        assert_eq!(std::fs::read(dest.join("foo.txt")).unwrap(), b"Dummy file");
    }

    #[cfg(unix)]
    #[test]
    fn preserves_declared_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("test.zip");
        let dest = temp.path().join("out");
        create_zip(
            &archive,
            &[("terraform", b"#!/bin/sh\n", 0o755), ("LICENSE.txt", b"MPL", 0o640)],
        );

        extract_archive(&archive, &dest, 1024).expect("Should extract");

        let mode = |name: &str| {
            std::fs::metadata(dest.join(name)).unwrap().permissions().mode() & 0o777
        };
        assert_eq!(mode("terraform"), 0o755);
        assert_eq!(mode("LICENSE.txt"), 0o640);
    }

    #[test]
    fn truncates_existing_destination() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("test.zip");
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("foo.txt"), b"a much longer previous content").unwrap();
        create_zip(&archive, &[("foo.txt", b"short", 0o644)]);

        extract_archive(&archive, &dest, 1024).expect("Should extract");

        assert_eq!(std::fs::read(dest.join("foo.txt")).unwrap(), b"short");
    }

    #[test]
    fn rejects_archives_over_the_limit() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("big.zip");
        let dest = temp.path().join("out");
        create_zip(
            &archive,
            &[("a.bin", &[0u8; 600], 0o644), ("b.bin", &[0u8; 600], 0o644)],
        );

        let result = extract_archive(&archive, &dest, 1000);

        assert!(matches!(result, Err(TfgetError::ArchiveTooLarge { limit: 1000 })));
    }

    #[test]
    fn limit_is_inclusive() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("exact.zip");
        let dest = temp.path().join("out");
        create_zip(&archive, &[("a.bin", &[1u8; 100], 0o644)]);

        assert!(extract_archive(&archive, &dest, 100).is_ok());
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("corrupt.zip");
        std::fs::write(&archive, b"this is not a zip file").unwrap();

        let result = extract_archive(&archive, &temp.path().join("out"), 1024);

        assert!(matches!(result, Err(TfgetError::Archive { .. })));
    }

    #[test]
    fn missing_archive_is_an_io_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = extract_archive(&temp.path().join("nope.zip"), temp.path(), 1024);
        assert!(matches!(result, Err(TfgetError::Io { .. })));
    }

    #[test]
    fn install_binary_places_binary_and_removes_archive() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("terraform_1.0.0.zip");
        let staging = temp.path().join(".terraform_1.0.0.extract");
        let target = temp.path().join("terraform_1.0.0");
        create_zip(
            &archive,
            &[("LICENSE.txt", b"MPL", 0o644), ("terraform", b"binary", 0o755)],
        );

        install_binary(&archive, &staging, &target, "terraform", 1024).expect("Should install");

        assert_eq!(std::fs::read(&target).unwrap(), b"binary");
        assert!(!archive.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn install_binary_accepts_single_entry_with_other_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        let staging = temp.path().join(".staging");
        let target = temp.path().join("terraform_0.1.0");
        create_zip(&archive, &[("foo.txt", b"Dummy file", 0o644)]);

        install_binary(&archive, &staging, &target, "terraform", 1024).expect("Should install");

        assert_eq!(std::fs::read(&target).unwrap(), b"Dummy file");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn install_binary_without_binary_leaves_no_target() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        let staging = temp.path().join(".staging");
        let target = temp.path().join("terraform_0.1.0");
        create_zip(
            &archive,
            &[("README.md", b"hi", 0o644), ("LICENSE.txt", b"MPL", 0o644)],
        );

        let result = install_binary(&archive, &staging, &target, "terraform", 1024);

        assert!(matches!(result, Err(TfgetError::Archive { .. })));
        assert!(!target.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn install_binary_over_limit_leaves_no_target() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        let staging = temp.path().join(".staging");
        let target = temp.path().join("terraform_0.1.0");
        create_zip(&archive, &[("terraform", &[0u8; 4096], 0o755)]);

        let result = install_binary(&archive, &staging, &target, "terraform", 1024);

        assert!(matches!(result, Err(TfgetError::ArchiveTooLarge { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn special_mode_bits_are_dropped() {
        assert_eq!(permission_bits(Some(0o104_755)), Some(0o755));
        assert_eq!(permission_bits(Some(0o6755)), Some(0o755));
        assert_eq!(permission_bits(Some(0o1777)), Some(0o777));
        assert_eq!(permission_bits(Some(0o640)), Some(0o640));
        assert_eq!(permission_bits(None), None);
    }

    #[test]
    fn unsafe_paths_are_rejected() {
        assert!(!is_safe_relative(Path::new("../etc/passwd")));
        assert!(!is_safe_relative(Path::new("/etc/passwd")));
        assert!(is_safe_relative(Path::new("bin/terraform")));
    }
}
