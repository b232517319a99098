//! PlonkSMT Library
//!
//! This library checks whether a PLONK gate circuit over the BN254 scalar
//! field really enforces polynomial evaluation by Horner's rule.
//!
//! # How a check works
//!
//! The circuit's gates, its fixed constants (`v0 = 0`, `v1 = 1`) and its
//! public-input pins are turned into field constraints, together with the
//! *negation* of the property:
//!
//! ```ignore
//! ev := 0
//! for c in coefficients { ev := ev * point + c }
//! assert ev != result
//! ```
//!
//! A backend then searches for an assignment:
//!
//! - **UNSAT**: no assignment exists, the circuit enforces the evaluation
//! - **SAT**: a counterexample witness, reported per variable of interest
//! - **UNKNOWN**: no verdict within the budget (never treated as UNSAT)
//!
//! # Circuit format
//!
//! ```json
//! {
//!   "variables": ["0", "1", "5", "7", "2", "17", "10"],
//!   "public_inps": [4],
//!   "vars_of_interest": {"2": "c0", "3": "c1", "4": "point", "5": "result"},
//!   "gates": [["1", "0", "0", "-1", "0", 2, 4, 6],
//!             ["0", "1", "1", "-1", "0", 6, 3, 5]]
//! }
//! ```
//!
//! Each gate row is `[q_m, q_1, q_2, q_3, q_c, w_l, w_r, w_o]` and enforces
//! `q_m·a·b + q_1·a + q_2·b + q_3·c + q_c = 0`. The split form
//! `"selectors": [[...5]]` + `"wits": [[...3]]` is accepted as well.
//!
//! # Supported Value Formats
//!
//! - **Decimal**: `"12345"`, `"-1"`
//! - **Hexadecimal**: `"0x1a2b"` (bare hex with `ValueEncoding::Hex`)
//! - **JSON integers** for selectors and variables

// Core modules
pub mod api;
pub mod circuit;
pub mod config;
pub mod constraint;
pub mod encoding;
pub mod error;
pub mod field;
pub mod solver;

// Re-export commonly used types
pub use api::{check_circuit, check_path, check_source, CheckResponse};
pub use circuit::{Circuit, CircuitFormat, Gate, InterestVars, LoadOptions, VarId};
pub use config::CheckConfig;
pub use constraint::{ConstraintSystem, EncodeOptions};
pub use encoding::ValueEncoding;
pub use error::{EncodingError, Error, MalformedCircuitError, Result, SolverBackendError};
pub use field::{FieldElement, PrimeField, SignConvention};
pub use solver::{solve, Backend, BackendKind, Budget, Outcome, Report, Witness};
