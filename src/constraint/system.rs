//! Assembled constraint system

use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, InterestVars};
use crate::error::Result;
use crate::field::PrimeField;

use super::gates::{encode_domain, encode_fixed, encode_gates, encode_public_inputs};
use super::property::encode_property;
use super::term::{Constraint, Relation, Symbolic};

/// Knobs for [`ConstraintSystem::build`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Emit `0 <= v < p` per variable (integer-sorted backends only)
    pub domain_constraints: bool,

    /// Leave zero-selector terms out of gate equations
    pub skip_zero_selectors: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            domain_constraints: false,
            skip_zero_selectors: true,
        }
    }
}

/// Everything a backend needs to decide one query
///
/// Built once per check and consumed by the driver.
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    pub variable_count: usize,
    pub constraints: Vec<Constraint>,
    pub interest: InterestVars,
    pub gate_count: usize,
}

impl ConstraintSystem {
    /// Encode domain, constants, public inputs, gates and the negated property
    #[tracing::instrument(skip_all, name = "ConstraintSystem::build")]
    pub fn build(circuit: &Circuit, field: &PrimeField, options: &EncodeOptions) -> Result<Self> {
        let sym = Symbolic::new(field);
        let mut constraints = Vec::new();

        if options.domain_constraints {
            constraints.extend(encode_domain(circuit.variable_count()));
        }
        constraints.extend(encode_fixed(&sym));
        constraints.extend(encode_public_inputs(circuit, &sym));
        constraints.extend(encode_gates(circuit.gates(), &sym, options));
        constraints.push(encode_property(circuit.interest(), &sym)?);

        let private_interest = circuit
            .interest()
            .ids()
            .filter(|id| !circuit.is_public(*id))
            .count();
        tracing::debug!(
            variables = circuit.variable_count(),
            gates = circuit.gate_count(),
            public_inputs = circuit.public_inputs().len(),
            private_interest,
            constraints = constraints.len(),
            "constraint system built"
        );

        Ok(Self {
            variable_count: circuit.variable_count(),
            constraints,
            interest: circuit.interest().clone(),
            gate_count: circuit.gate_count(),
        })
    }

    /// Constraints that actually restrict something
    pub fn active(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.iter().filter(|c| c.relation != Relation::True)
    }
}
