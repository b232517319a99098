//! API module
//!
//! This module contains the check pipeline entry points and the JSON
//! report types shared by the CLI and library callers.

pub mod core;
mod types;

pub use self::core::{check_circuit, check_path, check_source};
pub use types::{CheckResponse, ErrorResponse, REPORT_VERSION};
