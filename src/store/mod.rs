//! Daily file store with FIFO snapshot rotation
//!
//! - `TabularStore`: reads and rewrites the day's spreadsheet
//! - `SnapshotQueue`: the directory of rotated files, oldest first
//! - `AppendCoordinator`: one lock around both, so appends and rotations
//!   never interleave
//!
//! # Architecture
//!
//! ```text
//! submit:
//! ┌─────────┐    ┌──────┐    ┌──────────────────────────────┐
//! │ Request │───►│ lock │───►│ read daily.xlsx, push row,   │
//! └─────────┘    └──────┘    │ write temp, rename over      │
//!                            └──────────────────────────────┘
//! flush:
//! ┌─────────┐    ┌──────┐    ┌────────────────┐  none  ┌─────────────────┐
//! │ Request │───►│ lock │───►│ oldest snapshot│───────►│ rename daily -> │
//! └─────────┘    └──────┘    └────────────────┘        │ snapshots/<ts>  │
//!                                                      └─────────────────┘
//! ```

mod coordinator;
mod error;
mod layout;
mod snapshots;
mod tabular;

pub use coordinator::{AppendCoordinator, Download, Source};
pub use error::{StoreError, StoreResult};
pub use layout::StoreLayout;
pub use snapshots::{check_file_name, Resolved, SnapshotInfo, SnapshotQueue};
pub use tabular::{AppendOutcome, TabularStore};
