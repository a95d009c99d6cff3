//! Receipt Drop
//!
//! An HTTP service that appends delivery receipts (voucher/box/site, or any
//! configured field set) to one spreadsheet per day, and hands that file to a
//! consumer through a FIFO queue of rotated snapshots.
//!
//! # Features
//!
//! - **Serialized store**: appends and rotations share one lock
//! - **Crash-safe rewrites**: temp file, fsync, atomic rename
//! - **Text identifiers**: the identifier column keeps leading zeros
//! - **FIFO hand-off**: `/flush` drains old snapshots before rotating
//!
//! # Modules
//!
//! - `types`: Record and field set
//! - `store`: Daily file, snapshot queue and the coordinator around them
//! - `api`: Axum router, API key guard and REST handlers
//! - `config`: Environment-driven configuration
//! - `utils`: Atomic writes and clock helpers
//!
//! # Example
//!
//! ```no_run
//! use receipt_drop::{AppendCoordinator, FieldSet, Record, StoreLayout};
//!
//! let store = AppendCoordinator::open(StoreLayout::new("data"), FieldSet::default()).unwrap();
//! let outcome = store
//!     .submit(&Record::new().with("voucher", "00012").with("box", "B4"))
//!     .unwrap();
//! println!("{} now has {} rows", outcome.file, outcome.row_count);
//! ```

pub mod api;
pub mod config;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::ServiceConfig;
pub use store::{
    AppendCoordinator, AppendOutcome, Download, SnapshotQueue, Source, StoreError, StoreLayout,
    StoreResult, TabularStore,
};
pub use types::{FieldSet, Record};

/// Result type for the binary entry point
pub type ServiceResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
