//! `nullable-generic` provides nullable scalar wrappers that keep an explicit
//! validity flag next to their payload, so a missing value is never confused
//! with a zero value.
//!
//! - [`NullString`] coerces text, numbers and booleans into a string.
//! - [`TimestampMs`] stores an instant at millisecond resolution.
//!
//! Both render `null` in JSON when invalid and expose a storable
//! [`Value`] for data-store boundaries.

mod error;
mod generic;
mod json;
mod string;
mod timestamp;
mod valid;
mod value;

pub use error::GenericError;
pub use generic::{scan_all, values_of, Generic};
pub use json::{to_json, to_json_string, to_json_with, EncodeOptions};
pub use string::{marshal_string, must_string, NullString};
pub use timestamp::{marshal_timestamp_ms, must_timestamp_ms, TimestampMs};
pub use valid::ValidFlag;
pub use value::Value;

pub type Result<T> = std::result::Result<T, GenericError>;
