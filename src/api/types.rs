//! JSON report structures
//!
//! This module defines the serialized form of a check result, as printed by
//! `plonk-smt-cli check --json`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::solver::{Outcome, Report};

/// Current report format version
pub const REPORT_VERSION: u32 = 1;

/// Response from a soundness check
///
/// # Example
///
/// ```json
/// {
///   "version": 1,
///   "result": "SAT",
///   "elapsed_seconds": 0.0021,
///   "gates": 12,
///   "backend": "native",
///   "witness": { "c0": "5", "c1": "7", "point": "2", "result": "19" },
///   "ev": "17"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Report format version (current: 1)
    #[serde(default = "default_version")]
    pub version: u32,

    /// "UNSAT", "SAT" or "UNKNOWN"
    pub result: String,

    /// Wall-clock time spent in the backend
    pub elapsed_seconds: f64,

    /// Number of gates in the checked circuit
    pub gates: usize,

    /// Backend that produced the verdict
    pub backend: String,

    /// Why no verdict was reached (UNKNOWN only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Counterexample values as canonical decimal residues (SAT only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<IndexMap<String, String>>,

    /// Evaluation of the witness coefficients at the witness point (SAT only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<String>,
}

fn default_version() -> u32 {
    REPORT_VERSION
}

impl From<&Report> for CheckResponse {
    fn from(report: &Report) -> Self {
        let (reason, witness, ev) = match &report.outcome {
            Outcome::Unsat => (None, None, None),
            Outcome::Unknown { reason } => (Some(reason.clone()), None, None),
            Outcome::Sat(witness) => (
                None,
                Some(
                    witness
                        .values
                        .iter()
                        .map(|(name, value)| (name.clone(), value.to_string()))
                        .collect(),
                ),
                Some(witness.ev.to_string()),
            ),
        };

        Self {
            version: REPORT_VERSION,
            result: report.outcome.label().to_string(),
            elapsed_seconds: report.elapsed.as_secs_f64(),
            gates: report.gate_count,
            backend: report.backend.clone(),
            reason,
            witness,
            ev,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error family: "malformed_circuit", "encoding", "solver_backend", "io" or "config"
    pub kind: String,
}

impl From<&crate::error::Error> for ErrorResponse {
    fn from(err: &crate::error::Error) -> Self {
        use crate::error::Error;
        let kind = match err {
            Error::MalformedCircuit(_) => "malformed_circuit",
            Error::Encoding(_) => "encoding",
            Error::SolverBackend(_) => "solver_backend",
            Error::Io { .. } => "io",
            Error::Config(_) => "config",
        };
        Self {
            error: err.to_string(),
            kind: kind.to_string(),
        }
    }
}
