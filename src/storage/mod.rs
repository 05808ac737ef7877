//!  Day records are organized through [day_store::DayStore].
//!  The basic idea is:
//!   - There is one record per calendar day that was ever touched.
//!   - The whole collection lives under a single key of a [key_value::KeyValueStore], as a json
//!     object from `YYYY-MM-DD` to the record.
//!   - Conflicting writes are settled by `updated_at`, last write wins.

pub mod day_store;
pub mod entities;
pub mod error;
pub mod key_value;
