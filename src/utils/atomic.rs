//! Atomic file replacement
//!
//! The daily spreadsheet is rewritten in full on every append. To keep a
//! crash from leaving a truncated file behind, writes go through a hidden
//! sibling temp file:
//!
//! 1. Write the new content to `.<name>.tmp`
//! 2. `sync_all()` the temp file
//! 3. Rename it over the final path
//!
//! A reader therefore sees either the previous version or the new one.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = "tmp";

/// Temp path used while replacing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}", name, TEMP_SUFFIX))
}

/// Atomically replace `path` with `content`
///
/// Parent directories are created when missing.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
    atomic_write_with(path, |file| file.write_all(content))
}

/// Atomically replace `path` with whatever `write_fn` writes
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = File::create(&temp_path).and_then(|mut file| {
        write_fn(&mut file)?;
        file.sync_all()
    });
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
}

/// Remove temp files left behind by interrupted writes
///
/// Call on startup, before the store accepts requests.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_temp = path.extension().map(|e| e == TEMP_SUFFIX).unwrap_or(false);
        if is_temp {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
