//! Circuit module
//!
//! This module contains the typed circuit model and its JSON loader.

mod loader;
mod model;

pub use loader::*;
pub use model::*;
