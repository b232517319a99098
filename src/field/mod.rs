//! Field module
//!
//! Modular prime-field arithmetic, sign conventions, and the [`FieldDomain`]
//! abstraction shared by concrete evaluation and constraint construction.

mod domain;
mod element;

pub use domain::*;
pub use element::*;
