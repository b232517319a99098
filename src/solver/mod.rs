//! Solver module
//!
//! A [`Backend`] decides one [`ConstraintSystem`]; [`solve`] wraps it with
//! timing, model normalization and a concrete re-check of the answer.
//!
//! Two backends are available:
//! - [`NativeBackend`]: in-process polynomial elimination plus bounded search
//! - [`SmtLibBackend`]: an external SMT solver (cvc5 or z3) driven over SMT-LIB2

mod driver;
mod native;
mod poly;
mod sexpr;
mod smtlib;

pub use driver::*;
pub use native::*;
pub use poly::*;
pub use smtlib::*;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::circuit::VarId;
use crate::constraint::ConstraintSystem;
use crate::error::SolverBackendError;
use crate::field::{PrimeField, SignConvention};

/// Variable assignment returned by a backend, any integer representative
pub type Model = BTreeMap<VarId, BigInt>;

/// Raw backend verdict, before the driver post-processes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAnswer {
    Unsat,
    Sat(Model),
    Unknown(String),
}

/// Resource limits for a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Wall-clock limit for the backend call
    pub timeout: Duration,

    /// Node limit for the native search
    pub max_search_nodes: u64,
}

impl Budget {
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_SEARCH_NODES: u64 = 10_000;

    pub fn deadline_from(&self, start: Instant) -> Instant {
        start + self.timeout
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(Self::DEFAULT_TIMEOUT_MS),
            max_search_nodes: Self::DEFAULT_SEARCH_NODES,
        }
    }
}

/// A decision procedure for constraint systems
pub trait Backend {
    /// Short name used in reports
    fn name(&self) -> &str;

    /// True when the backend reasons over the field directly, so integer
    /// range constraints are unnecessary
    fn native_field(&self) -> bool;

    fn check(
        &self,
        system: &ConstraintSystem,
        field: &PrimeField,
        budget: Budget,
    ) -> Result<BackendAnswer, SolverBackendError>;
}

/// Which backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process search (always available)
    Native,
    /// cvc5 with the finite-field theory
    Cvc5,
    /// z3 over integers modulo p
    Z3,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::Cvc5 => "cvc5",
            BackendKind::Z3 => "z3",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BackendKind::Native => "Built-in polynomial elimination and bounded search; UNKNOWN when inconclusive",
            BackendKind::Cvc5 => "External cvc5 process, QF_FF finite-field logic",
            BackendKind::Z3 => "External z3 process, QF_NIA integers reduced modulo p",
        }
    }

    /// Instantiate the backend
    ///
    /// `program` overrides the solver executable for external backends and
    /// is ignored by the native one.
    pub fn create(&self, program: Option<PathBuf>, convention: SignConvention) -> Box<dyn Backend> {
        match self {
            BackendKind::Native => Box::new(NativeBackend::new()),
            BackendKind::Cvc5 => Box::new(SmtLibBackend::cvc5(program, convention)),
            BackendKind::Z3 => Box::new(SmtLibBackend::z3(program, convention)),
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Native
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "cvc5" => Ok(BackendKind::Cvc5),
            "z3" => Ok(BackendKind::Z3),
            _ => Err(format!(
                "Unknown backend: {}. Valid options: native, cvc5, z3",
                s
            )),
        }
    }
}
