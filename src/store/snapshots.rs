//! FIFO snapshot queue
//!
//! Rotated daily files live in `snapshots/` under a name that embeds the
//! rotation instant. The directory listing plus modification time is the
//! only index: oldest first, ties broken by name.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::layout::StoreLayout;
use crate::utils::instant_stamp;

/// A snapshot file on disk
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// File name, which is also the snapshot id
    pub name: String,
    pub modified: SystemTime,
}

/// What a client-supplied file name points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A file in the snapshot directory
    Snapshot(PathBuf),
    /// A file in the live data directory
    Live(PathBuf),
}

/// Manages the snapshot directory
pub struct SnapshotQueue {
    layout: StoreLayout,
}

impl SnapshotQueue {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn dir(&self) -> PathBuf {
        self.layout.snapshots_dir()
    }

    /// All snapshots, oldest first
    pub fn entries(&self) -> StoreResult<Vec<SnapshotInfo>> {
        let dir = self.dir();

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.layout.has_extension(&name) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            snapshots.push(SnapshotInfo {
                name,
                modified: metadata.modified()?,
            });
        }

        snapshots.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(snapshots)
    }

    /// Snapshot ids, oldest first
    pub fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|s| s.name).collect())
    }

    /// Id of the oldest snapshot, if any
    pub fn oldest(&self) -> StoreResult<Option<String>> {
        Ok(self.entries()?.into_iter().next().map(|s| s.name))
    }

    /// Move `daily` into the queue under a fresh unique name
    ///
    /// The move is a single rename, so the file is observed either at its
    /// old path or at its new one. The snapshot's mtime is then set to the
    /// rotation instant, which keeps it at the tail of the queue.
    pub fn rotate(&self, daily: &Path) -> StoreResult<String> {
        if !daily.is_file() {
            return Err(StoreError::NotFound(display_name(daily)));
        }

        let dir = self.dir();
        fs::create_dir_all(&dir)?;

        let now = Local::now();
        let name = self.unique_name(&now);
        let target = dir.join(&name);

        fs::rename(daily, &target)?;

        if let Err(e) = stamp_modified(&target, now) {
            warn!(snapshot = %name, error = %e, "Could not stamp snapshot mtime");
        }

        info!(daily = %display_name(daily), snapshot = %name, "Rotated daily file");

        Ok(name)
    }

    /// `<prefix>_<YYYYMMDD_HHMMSS_ffffff>.<ext>`, with a counter on collision
    fn unique_name(&self, now: &DateTime<Local>) -> String {
        let stem = format!("{}_{}", self.layout.file_prefix, instant_stamp(now));
        let ext = &self.layout.extension;
        let dir = self.dir();

        let mut name = format!("{}.{}", stem, ext);
        let mut n = 1;
        while dir.join(&name).exists() {
            name = format!("{}_{}.{}", stem, n, ext);
            n += 1;
        }
        name
    }

    /// Resolve a client-supplied name, snapshots first
    pub fn resolve(&self, name: &str) -> StoreResult<Resolved> {
        check_file_name(name)?;

        let snapshot = self.dir().join(name);
        if snapshot.is_file() {
            return Ok(Resolved::Snapshot(snapshot));
        }

        let live = self.layout.data_dir().join(name);
        if live.is_file() {
            return Ok(Resolved::Live(live));
        }

        Err(StoreError::NotFound(name.to_string()))
    }

    /// Delete a snapshot
    ///
    /// Names that resolve to a live file are refused rather than reported
    /// as missing.
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        match self.resolve(name)? {
            Resolved::Snapshot(path) => {
                fs::remove_file(&path)?;
                info!(snapshot = %name, "Deleted snapshot");
                Ok(())
            }
            Resolved::Live(_) => {
                warn!(file = %name, "Refused to delete live file");
                Err(StoreError::Refused(name.to_string()))
            }
        }
    }
}

/// Reject anything that is not a bare file name
pub fn check_file_name(name: &str) -> StoreResult<()> {
    let bare = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);

    if bare {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn stamp_modified(path: &Path, at: DateTime<Local>) -> std::io::Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(at))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
