//! Data types shared by the store and the HTTP layer

mod record;

pub use record::{FieldSet, Record};
