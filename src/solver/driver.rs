//! Single-shot solving pipeline
//!
//! [`solve`] runs one backend query over a finished [`ConstraintSystem`],
//! measures it, and turns the raw answer into a reportable [`Outcome`].

use indexmap::IndexMap;
use std::time::{Duration, Instant};

use crate::circuit::VarId;
use crate::constraint::{horner, ConstraintSystem};
use crate::error::{Result, SolverBackendError};
use crate::field::{FieldElement, PrimeField};

use super::{Backend, BackendAnswer, Budget, Model};

/// Counterexample restricted to the variables of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// name → canonical value, in ascending variable index order
    pub values: IndexMap<String, FieldElement>,

    /// Horner evaluation of the coefficients at the point, which differs from `result`
    pub ev: FieldElement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The circuit enforces the evaluation relation
    Unsat,
    /// A witness violating the relation
    Sat(Witness),
    /// No verdict within the budget
    Unknown { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Unsat => "UNSAT",
            Outcome::Sat(_) => "SAT",
            Outcome::Unknown { .. } => "UNKNOWN",
        }
    }
}

/// Result of one check; timing and gate count accompany every outcome
#[derive(Debug, Clone)]
pub struct Report {
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub gate_count: usize,
    pub backend: String,
}

/// Decide the constraint system with the given backend
///
/// The system is consumed: re-checking requires re-encoding. On SAT the
/// returned model is normalized into `[0, p-1]` and checked against every
/// constraint whose variables it assigns; a violation means the backend is
/// broken and is reported as [`SolverBackendError::InconsistentModel`].
#[tracing::instrument(skip_all, name = "solve", fields(backend = backend.name()))]
pub fn solve(system: ConstraintSystem, field: &PrimeField, backend: &dyn Backend, budget: Budget) -> Result<Report> {
    let start = Instant::now();
    let answer = backend.check(&system, field, budget)?;
    let elapsed = start.elapsed();

    let outcome = match answer {
        BackendAnswer::Unsat => {
            tracing::info!(?elapsed, gates = system.gate_count, "UNSAT: relation holds");
            Outcome::Unsat
        }
        BackendAnswer::Unknown(reason) => {
            tracing::warn!(?elapsed, gates = system.gate_count, %reason, "UNKNOWN");
            Outcome::Unknown { reason }
        }
        BackendAnswer::Sat(model) => {
            let witness = extract_witness(&system, field, &model)?;
            tracing::info!(?elapsed, gates = system.gate_count, "SAT: counterexample found");
            Outcome::Sat(witness)
        }
    };

    Ok(Report {
        outcome,
        elapsed,
        gate_count: system.gate_count,
        backend: backend.name().to_string(),
    })
}

fn extract_witness(system: &ConstraintSystem, field: &PrimeField, model: &Model) -> Result<Witness> {
    let non_canonical = model.values().filter(|v| !field.is_canonical(v)).count();
    if non_canonical > 0 {
        tracing::debug!(non_canonical, "normalizing model values into [0, p-1]");
    }

    let value = |id: VarId| model.get(&id).map(|v| field.normalize(v));

    for constraint in &system.constraints {
        if constraint.relation.holds(field, &value) == Some(false) {
            return Err(SolverBackendError::InconsistentModel(constraint.origin.to_string()).into());
        }
    }

    let mut values = IndexMap::new();
    for (id, name) in system.interest.entries() {
        let v = value(*id).ok_or(SolverBackendError::MissingModelValue(id.0))?;
        values.insert(name.clone(), v);
    }

    let coeffs: Vec<FieldElement> = system
        .interest
        .coefficients()
        .iter()
        .map(|(_, name)| values[name].clone())
        .collect();
    let point = &values[&system.interest.point().1];
    let ev = horner(field, &coeffs, point);

    Ok(Witness { values, ev })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, InterestVars};
    use crate::constraint::EncodeOptions;
    use crate::error::Error;
    use crate::solver::NativeBackend;
    use num_bigint::BigInt;

    /// Replays a canned answer
    struct Canned(BackendAnswer);

    impl Backend for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn native_field(&self) -> bool {
            true
        }

        fn check(
            &self,
            _system: &ConstraintSystem,
            _field: &PrimeField,
            _budget: Budget,
        ) -> std::result::Result<BackendAnswer, SolverBackendError> {
            Ok(self.0.clone())
        }
    }

    fn system(field: &PrimeField, public: &[u32], result: i64) -> ConstraintSystem {
        let values = [0, 1, 5, 7, 2, result].iter().map(|v| field.from_i64(*v)).collect();
        let interest = InterestVars::new(vec![
            (VarId(2), "c0".into()),
            (VarId(3), "c1".into()),
            (VarId(4), "point".into()),
            (VarId(5), "result".into()),
        ])
        .unwrap();
        let circuit = Circuit::new(values, public.iter().map(|i| VarId(*i)).collect(), vec![], interest).unwrap();
        ConstraintSystem::build(&circuit, field, &EncodeOptions::default()).unwrap()
    }

    #[test]
    fn test_sat_witness_is_named_and_ordered() {
        let field = PrimeField::bn254();
        let report = solve(system(&field, &[2, 3, 4, 5], 19), &field, &NativeBackend::new(), Budget::default()).unwrap();

        assert_eq!(report.backend, "native");
        assert_eq!(report.gate_count, 0);
        match report.outcome {
            Outcome::Sat(witness) => {
                let names: Vec<_> = witness.values.keys().cloned().collect();
                assert_eq!(names, vec!["c0", "c1", "point", "result"]);
                assert_eq!(witness.values["result"], field.from_i64(19));
                assert_eq!(witness.ev, field.from_i64(17));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn test_unsat_has_no_witness() {
        let field = PrimeField::bn254();
        let report = solve(system(&field, &[2, 3, 4, 5], 17), &field, &NativeBackend::new(), Budget::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Unsat);
        assert_eq!(report.outcome.label(), "UNSAT");
    }

    #[test]
    fn test_negative_model_values_are_normalized() {
        let field = PrimeField::bn254();
        let mut model = Model::new();
        for (i, v) in [0i64, 1, 5, 7, 2, -3].iter().enumerate() {
            model.insert(VarId(i as u32), BigInt::from(*v));
        }

        let report = solve(system(&field, &[], 0), &field, &Canned(BackendAnswer::Sat(model)), Budget::default()).unwrap();
        match report.outcome {
            Outcome::Sat(witness) => assert_eq!(witness.values["result"], field.from_i64(-3)),
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn test_model_violating_property_is_rejected() {
        let field = PrimeField::bn254();
        let mut model = Model::new();
        for (i, v) in [0i64, 1, 5, 7, 2, 17].iter().enumerate() {
            model.insert(VarId(i as u32), BigInt::from(*v));
        }

        let err = solve(system(&field, &[], 0), &field, &Canned(BackendAnswer::Sat(model)), Budget::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::SolverBackend(SolverBackendError::InconsistentModel(ref origin)) if origin == "property"
        ));
    }

    #[test]
    fn test_missing_interest_value() {
        let field = PrimeField::bn254();
        let mut model = Model::new();
        model.insert(VarId(2), BigInt::from(1));

        let err = solve(system(&field, &[], 0), &field, &Canned(BackendAnswer::Sat(model)), Budget::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::SolverBackend(SolverBackendError::MissingModelValue(3))
        ));
    }

    #[test]
    fn test_unknown_keeps_timing_and_gate_count() {
        let field = PrimeField::bn254();
        let answer = BackendAnswer::Unknown("budget".to_string());
        let report = solve(system(&field, &[], 0), &field, &Canned(answer), Budget::default()).unwrap();
        assert_eq!(report.outcome, Outcome::Unknown { reason: "budget".to_string() });
        assert_eq!(report.gate_count, 0);
        assert_eq!(report.backend, "canned");
    }
}
