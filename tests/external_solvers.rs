//! cvc5 / z3 backends; each test is skipped when the solver is not installed

use std::path::PathBuf;

use plonk_smt_core::solver::SmtLibBackend;
use plonk_smt_core::{
    check_path, BackendKind, CheckConfig, Error, Outcome, SignConvention, SolverBackendError,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn available(kind: BackendKind) -> bool {
    let backend = match kind {
        BackendKind::Cvc5 => SmtLibBackend::cvc5(None, SignConvention::Canonical),
        _ => SmtLibBackend::z3(None, SignConvention::Canonical),
    };
    if !backend.is_available() {
        eprintln!("{} not installed, skipping", kind);
        return false;
    }
    true
}

fn config(kind: BackendKind, sign: SignConvention) -> CheckConfig {
    CheckConfig {
        backend: kind,
        sign_convention: sign,
        time_budget_ms: 20_000,
        ..CheckConfig::default()
    }
}

/// Run a check; `None` when the solver build lacks the needed theory
fn run(kind: BackendKind, sign: SignConvention, name: &str) -> Option<Outcome> {
    match check_path(fixture(name), &config(kind, sign)) {
        Ok(report) => Some(report.outcome),
        Err(Error::SolverBackend(SolverBackendError::Reported(msg))) => {
            eprintln!("{} rejected the query ({}), skipping", kind, msg);
            None
        }
        Err(e) => panic!("{} failed: {}", kind, e),
    }
}

#[test]
fn test_cvc5_finds_counterexample() {
    if !available(BackendKind::Cvc5) {
        return;
    }
    for sign in [SignConvention::Canonical, SignConvention::Signed] {
        if let Some(outcome) = run(BackendKind::Cvc5, sign, "horner_wrong_wire.json") {
            assert!(matches!(outcome, Outcome::Sat(_)), "got {:?}", outcome);
        }
    }
}

#[test]
fn test_cvc5_proves_sound_circuit() {
    if !available(BackendKind::Cvc5) {
        return;
    }
    if let Some(outcome) = run(BackendKind::Cvc5, SignConvention::Signed, "horner_sound.json") {
        assert!(!matches!(outcome, Outcome::Sat(_)), "got {:?}", outcome);
    }
}

#[test]
fn test_z3_finds_counterexample() {
    if !available(BackendKind::Z3) {
        return;
    }
    if let Some(outcome) = run(BackendKind::Z3, SignConvention::Signed, "horner_wrong_wire.json") {
        // nonlinear integer reasoning may time out, but must never claim UNSAT
        assert!(!matches!(outcome, Outcome::Unsat), "got {:?}", outcome);
    }
}

#[test]
fn test_z3_never_refutes_sound_circuit() {
    if !available(BackendKind::Z3) {
        return;
    }
    if let Some(outcome) = run(BackendKind::Z3, SignConvention::Canonical, "horner_sound.json") {
        assert!(!matches!(outcome, Outcome::Sat(_)), "got {:?}", outcome);
    }
}
