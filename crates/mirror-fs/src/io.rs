//! Flat directory listing and atomic single-file transfers

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

const TEMP_SUFFIX: &str = ".tmp";

/// List the names of the regular files directly inside `dir`.
///
/// Subdirectories are not part of a mirror and are skipped, as are
/// in-flight temp files left by [`copy_atomic`]. Names that are not valid
/// UTF-8 cannot be addressed remotely and are skipped with a warning.
pub fn list_file_names(dir: &NormalizedPath) -> Result<BTreeSet<String>> {
    let native = dir.to_native();
    if native.exists() && !native.is_dir() {
        return Err(Error::NotADirectory { path: native });
    }

    let entries = fs::read_dir(&native).map_err(|e| Error::io(&native, e))?;
    let mut names = BTreeSet::new();

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&native, e))?;
        if !entry.path().is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if is_transfer_temp(&name) => {}
            Ok(name) => {
                names.insert(name);
            }
            Err(raw) => {
                tracing::warn!(dir = %dir, name = ?raw, "Skipping non UTF-8 file name");
            }
        }
    }

    Ok(names)
}

/// Copy `src` to `dst` atomically, returning the number of bytes copied.
///
/// The content is streamed into a temp file next to `dst` (same filesystem),
/// synced, then renamed over `dst`, so readers of `dst` never observe a
/// partial file. The parent of `dst` must already exist.
pub fn copy_atomic(src: &NormalizedPath, dst: &NormalizedPath) -> Result<u64> {
    let src_native = src.to_native();
    let mut source = File::open(&src_native).map_err(|e| Error::io(&src_native, e))?;

    let dst_native = dst.to_native();
    let temp_path = temp_path_for(&dst_native);

    let result = stream_locked(&mut source, &temp_path, &dst_native).and_then(|bytes| {
        fs::rename(&temp_path, &dst_native).map_err(|e| Error::io(&dst_native, e))?;
        Ok(bytes)
    });

    if result.is_err() {
        // Best effort: the temp file is ours and never visible as a mirror entry
        let _ = fs::remove_file(&temp_path);
    }

    result
}

/// Remove a single file.
pub fn remove_file(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    fs::remove_file(&native).map_err(|e| Error::io(native, e))
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Creates missing parent directories.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(&native_path);
    let mut reader = content;
    stream_locked(&mut reader, &temp_path, &native_path)?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Stream `reader` into a freshly truncated, exclusively locked temp file.
fn stream_locked(
    reader: &mut impl std::io::Read,
    temp_path: &Path,
    target: &Path,
) -> Result<u64> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: target.to_path_buf(),
        })?;

    let bytes = std::io::copy(reader, &mut temp_file).map_err(|e| Error::io(temp_path, e))?;
    temp_file.flush().map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    Ok(bytes)
}

/// Temp file path in the same directory as `target`: `.{name}.{pid}.tmp`
fn temp_path_for(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}{}",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_SUFFIX
    );
    target.with_file_name(temp_name)
}

/// Matches exactly the `.{name}.{pid}.tmp` shape produced by [`temp_path_for`].
fn is_transfer_temp(name: &str) -> bool {
    let Some(inner) = name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_SUFFIX))
    else {
        return false;
    };

    match inner.rsplit_once('.') {
        Some((target, pid)) => {
            !target.is_empty() && !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
