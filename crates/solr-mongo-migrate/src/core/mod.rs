//! Core record types shared by every stage of the pipeline.
//!
//! - [`value`]: typed field values with JSON input and BSON output
//! - [`record`]: raw source records and normalized store records

pub mod record;
pub mod value;

pub use record::{Fields, NormalizedRecord, RawRecord, PRIMARY_KEY_FIELD};
pub use value::FieldValue;
