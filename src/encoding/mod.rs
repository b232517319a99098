//! Encoding module
//!
//! Decoding of textual field literals (decimal / hex) and formatting of values for reports.

mod value;

pub use value::*;
