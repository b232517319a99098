//! Core API functions for soundness checks
//!
//! This module contains the platform-independent pipeline:
//! - `check_source()`  - Check a circuit given as JSON text
//! - `check_path()`    - Check a circuit JSON file
//! - `check_circuit()` - Check an already loaded circuit
//!
//! Each call loads (if needed), encodes, and solves exactly once.

use std::path::Path;

use crate::circuit::Circuit;
use crate::config::CheckConfig;
use crate::constraint::ConstraintSystem;
use crate::error::Result;
use crate::field::PrimeField;
use crate::solver::{solve, Report};

/// Check whether a loaded circuit enforces its evaluation relation
///
/// # Arguments
/// * `circuit` - Circuit over `field`
/// * `field` - Field the circuit literals were parsed in
/// * `config` - Backend, budget and rendering options
///
/// # Returns
/// * `Ok(Report)` - UNSAT, SAT with witness, or UNKNOWN, with timing
/// * `Err(Error)` - Encoding or backend failure
pub fn check_circuit(circuit: &Circuit, field: &PrimeField, config: &CheckConfig) -> Result<Report> {
    config.validate()?;
    let backend = config.create_backend();
    let options = config.encode_options(backend.as_ref());
    let system = ConstraintSystem::build(circuit, field, &options)?;
    solve(system, field, backend.as_ref(), config.budget())
}

/// Load a circuit from JSON text and check it over BN254
///
/// # Example
/// ```ignore
/// let report = check_source(&json, &CheckConfig::default())?;
/// println!("{}", report.outcome.label());
/// ```
pub fn check_source(source: &str, config: &CheckConfig) -> Result<Report> {
    let field = PrimeField::bn254();
    let circuit = Circuit::load(source, &field, config.load_options())?;
    check_circuit(&circuit, &field, config)
}

/// Load a circuit JSON file and check it over BN254
pub fn check_path(path: impl AsRef<Path>, config: &CheckConfig) -> Result<Report> {
    let field = PrimeField::bn254();
    let circuit = Circuit::load_path(path, &field, config.load_options())?;
    check_circuit(&circuit, &field, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodingError, Error, MalformedCircuitError};
    use crate::solver::Outcome;

    const SOUND: &str = r#"{
        "variables": ["0", "1", "5", "7", "2", "17", "10"],
        "public_inps": [],
        "vars_of_interest": {"2": "c0", "3": "c1", "4": "point", "5": "result"},
        "gates": [
            ["1", "0", "0", "-1", "0", 2, 4, 6],
            ["0", "1", "1", "-1", "0", 6, 3, 5]
        ]
    }"#;

    #[test]
    fn test_check_source_sound_circuit() {
        let report = check_source(SOUND, &CheckConfig::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Unsat);
        assert_eq!(report.gate_count, 2);
        assert_eq!(report.backend, "native");
    }

    #[test]
    fn test_check_source_reports_malformed_input() {
        let err = check_source(r#"{"variables": ["0", "1"]}"#, &CheckConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedCircuit(MalformedCircuitError::MissingKey(_))));
    }

    #[test]
    fn test_check_source_reports_encoding_errors() {
        let source = r#"{
            "variables": ["0", "1", "zz", "4"],
            "public_inps": [],
            "vars_of_interest": {"2": "point", "3": "result"},
            "gates": []
        }"#;
        let err = check_source(source, &CheckConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Encoding(EncodingError::InvalidDecimal { .. })));
    }

    #[test]
    fn test_check_path_missing_file() {
        let err = check_path("/nonexistent/circuit.json", &CheckConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CheckConfig {
            time_budget_ms: 0,
            ..CheckConfig::default()
        };
        assert!(matches!(check_source(SOUND, &config), Err(Error::Config(_))));
    }
}
