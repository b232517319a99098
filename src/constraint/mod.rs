//! Constraint module
//!
//! Turns a [`crate::circuit::Circuit`] into a solver-independent
//! [`ConstraintSystem`]: gate equations, the fixed constants, public-input
//! pins, optional range constraints and the negated evaluation property.

mod gates;
mod property;
mod system;
mod term;

pub use gates::*;
pub use property::*;
pub use system::*;
pub use term::*;
