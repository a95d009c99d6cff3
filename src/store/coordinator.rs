//! Serialized access to the daily file and the snapshot queue
//!
//! The coordinator owns both the [`TabularStore`] and the [`SnapshotQueue`]
//! behind one mutex, so an append can never interleave with a rotation.
//! Every call does blocking file I/O; async callers should run it on a
//! blocking thread.

use std::fs::File;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::info;

use super::error::{StoreError, StoreResult};
use super::layout::StoreLayout;
use super::snapshots::{Resolved, SnapshotQueue};
use super::tabular::{AppendOutcome, TabularStore};
use crate::types::{FieldSet, Record};
use crate::utils::today;

/// Where a download came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// An existing snapshot
    Snapshot,
    /// A snapshot created by this flush
    Rotated,
    /// A file in the live data directory
    Live,
}

/// A file opened for delivery
///
/// The handle is opened while the store lock is held, so the content stays
/// readable even if the file is deleted before it is streamed.
#[derive(Debug)]
pub struct Download {
    pub name: String,
    pub file: File,
    pub source: Source,
}

/// Store state reachable only through the lock
struct Resources {
    tabular: TabularStore,
    snapshots: SnapshotQueue,
}

/// The mutual-exclusion boundary around the store
pub struct AppendCoordinator {
    layout: StoreLayout,
    fields: FieldSet,
    resources: Mutex<Resources>,
}

impl AppendCoordinator {
    /// Open the store at `layout`, creating directories and clearing
    /// temp files from interrupted writes
    pub fn open(layout: StoreLayout, fields: FieldSet) -> StoreResult<Self> {
        let cleaned = layout.prepare()?;
        if cleaned > 0 {
            info!(count = cleaned, "Removed leftover temp files");
        }

        let resources = Resources {
            tabular: TabularStore::new(layout.clone(), fields.clone()),
            snapshots: SnapshotQueue::new(layout.clone()),
        };

        Ok(Self {
            layout,
            fields,
            resources: Mutex::new(resources),
        })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Append a record to today's daily file
    pub fn submit(&self, record: &Record) -> StoreResult<AppendOutcome> {
        self.submit_on(today(), record)
    }

    /// Append a record to the daily file of `date`
    pub fn submit_on(&self, date: NaiveDate, record: &Record) -> StoreResult<AppendOutcome> {
        if record.identifier(&self.fields).is_none() {
            return Err(StoreError::MissingField(self.fields.identifier().to_string()));
        }

        let resources = self.resources.lock();
        resources.tabular.append(date, record)
    }

    /// Hand out the next file for the consumer, using today's daily file
    pub fn flush(&self) -> StoreResult<Option<Download>> {
        self.flush_on(today())
    }

    /// Hand out the next file for the consumer
    ///
    /// The oldest snapshot wins. Only when the queue is empty is the daily
    /// file of `date` rotated into it. `None` means there is nothing to
    /// deliver.
    pub fn flush_on(&self, date: NaiveDate) -> StoreResult<Option<Download>> {
        let resources = self.resources.lock();
        let snapshots = &resources.snapshots;

        if let Some(name) = snapshots.oldest()? {
            let file = File::open(snapshots.dir().join(&name))?;
            return Ok(Some(Download {
                name,
                file,
                source: Source::Snapshot,
            }));
        }

        let daily = resources.tabular.daily_path(date);
        if !daily.is_file() {
            return Ok(None);
        }

        let name = snapshots.rotate(&daily)?;
        let file = File::open(snapshots.dir().join(&name))?;
        Ok(Some(Download {
            name,
            file,
            source: Source::Rotated,
        }))
    }

    /// Snapshot ids, oldest first
    pub fn list(&self) -> StoreResult<Vec<String>> {
        self.resources.lock().snapshots.list()
    }

    /// Open a snapshot, or failing that a live file, by name
    pub fn open_file(&self, name: &str) -> StoreResult<Download> {
        let resources = self.resources.lock();

        let (path, source) = match resources.snapshots.resolve(name)? {
            Resolved::Snapshot(path) => (path, Source::Snapshot),
            Resolved::Live(path) => (path, Source::Live),
        };

        Ok(Download {
            name: name.to_string(),
            file: File::open(path)?,
            source,
        })
    }

    /// Delete a snapshot; live files are refused
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        self.resources.lock().snapshots.delete(name)
    }
}
