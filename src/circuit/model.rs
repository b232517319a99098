//! Typed in-memory circuit
//!
//! A circuit is a list of variables (one witness value each), the subset of
//! them bound as public inputs, PLONK gates over those variables, and the
//! named "variables of interest" the property talks about.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::MalformedCircuitError;
use crate::field::FieldElement;

/// Index of a circuit variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VarId(pub u32);

impl VarId {
    /// Fixed to the additive identity by convention
    pub const ZERO: VarId = VarId(0);

    /// Fixed to the multiplicative identity by convention
    pub const ONE: VarId = VarId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var_{}", self.0)
    }
}

/// One PLONK arithmetic gate
///
/// Enforces `q_m·a·b + q_1·a + q_2·b + q_3·c + q_c = 0` with
/// `a = v[w_l]`, `b = v[w_r]`, `c = v[w_o]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub q_m: FieldElement,
    pub q_1: FieldElement,
    pub q_2: FieldElement,
    pub q_3: FieldElement,
    pub q_c: FieldElement,
    pub w_l: VarId,
    pub w_r: VarId,
    pub w_o: VarId,
}

impl Gate {
    /// Wires in (w_l, w_r, w_o) order
    pub fn wires(&self) -> [VarId; 3] {
        [self.w_l, self.w_r, self.w_o]
    }

    /// True when every selector is zero, i.e. the gate constrains nothing
    pub fn is_trivial(&self) -> bool {
        self.q_m.is_zero()
            && self.q_1.is_zero()
            && self.q_2.is_zero()
            && self.q_3.is_zero()
            && self.q_c.is_zero()
    }
}

/// Named variables the property is stated over
///
/// Entries are kept in ascending index order. Positional roles: all but the
/// last two are polynomial coefficients (highest degree first), the
/// second-to-last is the evaluation point, the last is the claimed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestVars {
    entries: Vec<(VarId, String)>,
}

impl InterestVars {
    /// Validate and order the entries
    pub fn new(mut entries: Vec<(VarId, String)>) -> Result<Self, MalformedCircuitError> {
        if entries.len() < 2 {
            return Err(MalformedCircuitError::TooFewInterestVars(entries.len()));
        }

        entries.sort_by_key(|(id, _)| *id);

        let mut names = HashSet::new();
        for (id, name) in &entries {
            if name.is_empty() {
                return Err(MalformedCircuitError::EmptyInterestName(id.0));
            }
            if !names.insert(name.as_str()) {
                return Err(MalformedCircuitError::DuplicateInterestName(name.clone()));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(VarId, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn coefficients(&self) -> &[(VarId, String)] {
        &self.entries[..self.entries.len() - 2]
    }

    pub fn point(&self) -> &(VarId, String) {
        &self.entries[self.entries.len() - 2]
    }

    pub fn result(&self) -> &(VarId, String) {
        &self.entries[self.entries.len() - 1]
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

/// A loaded circuit. Immutable once built.
#[derive(Debug, Clone)]
pub struct Circuit {
    variables: Vec<FieldElement>,
    public_inputs: Vec<VarId>,
    gates: Vec<Gate>,
    interest: InterestVars,
}

impl Circuit {
    /// Assemble a circuit, checking every index against the variable count
    pub fn new(
        variables: Vec<FieldElement>,
        public_inputs: Vec<VarId>,
        gates: Vec<Gate>,
        interest: InterestVars,
    ) -> Result<Self, MalformedCircuitError> {
        let count = variables.len();
        if count < 2 {
            return Err(MalformedCircuitError::TooFewVariables(count));
        }

        let mut seen = HashSet::new();
        for (position, id) in public_inputs.iter().enumerate() {
            if id.index() >= count {
                return Err(MalformedCircuitError::PublicInputOutOfRange {
                    position,
                    index: u64::from(id.0),
                    count,
                });
            }
            if !seen.insert(*id) {
                return Err(MalformedCircuitError::DuplicatePublicInput {
                    position,
                    index: id.0,
                });
            }
        }

        for (gate_index, gate) in gates.iter().enumerate() {
            for (wire, id) in ["w_l", "w_r", "w_o"].into_iter().zip(gate.wires()) {
                if id.index() >= count {
                    return Err(MalformedCircuitError::WireOutOfRange {
                        gate: gate_index,
                        wire,
                        index: u64::from(id.0),
                        count,
                    });
                }
            }
        }

        for id in interest.ids() {
            if id.index() >= count {
                return Err(MalformedCircuitError::InterestOutOfRange {
                    index: u64::from(id.0),
                    count,
                });
            }
        }

        Ok(Self {
            variables,
            public_inputs,
            gates,
            interest,
        })
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn value(&self, id: VarId) -> &FieldElement {
        &self.variables[id.index()]
    }

    pub fn public_inputs(&self) -> &[VarId] {
        &self.public_inputs
    }

    pub fn is_public(&self, id: VarId) -> bool {
        self.public_inputs.contains(&id)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn interest(&self) -> &InterestVars {
        &self.interest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PrimeField;

    fn interest(ids: &[(u32, &str)]) -> InterestVars {
        InterestVars::new(ids.iter().map(|(i, n)| (VarId(*i), n.to_string())).collect()).unwrap()
    }

    fn gate(field: &PrimeField, q: [i64; 5], w: [u32; 3]) -> Gate {
        Gate {
            q_m: field.from_i64(q[0]),
            q_1: field.from_i64(q[1]),
            q_2: field.from_i64(q[2]),
            q_3: field.from_i64(q[3]),
            q_c: field.from_i64(q[4]),
            w_l: VarId(w[0]),
            w_r: VarId(w[1]),
            w_o: VarId(w[2]),
        }
    }

    #[test]
    fn test_interest_roles_follow_index_order() {
        let vars = interest(&[(5, "result"), (2, "c0"), (4, "point"), (3, "c1")]);
        let coeffs: Vec<_> = vars.coefficients().iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(coeffs, vec!["c0", "c1"]);
        assert_eq!(vars.point().1, "point");
        assert_eq!(vars.result().1, "result");
    }

    #[test]
    fn test_interest_needs_point_and_result() {
        let err = InterestVars::new(vec![(VarId(2), "x".to_string())]).unwrap_err();
        assert_eq!(err, MalformedCircuitError::TooFewInterestVars(1));
    }

    #[test]
    fn test_interest_rejects_duplicate_names() {
        let err = InterestVars::new(vec![
            (VarId(2), "x".to_string()),
            (VarId(3), "x".to_string()),
        ])
        .unwrap_err();
        assert_eq!(err, MalformedCircuitError::DuplicateInterestName("x".to_string()));
    }

    #[test]
    fn test_wire_out_of_range() {
        let field = PrimeField::bn254();
        let values = vec![field.zero(), field.one(), field.from_i64(3)];
        let err = Circuit::new(
            values,
            vec![],
            vec![gate(&field, [1, 0, 0, -1, 0], [2, 2, 3])],
            interest(&[(1, "point"), (2, "result")]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            MalformedCircuitError::WireOutOfRange {
                gate: 0,
                wire: "w_o",
                index: 3,
                count: 3
            }
        );
    }

    #[test]
    fn test_public_input_checks() {
        let field = PrimeField::bn254();
        let values = vec![field.zero(), field.one(), field.from_i64(3)];

        let err = Circuit::new(
            values.clone(),
            vec![VarId(7)],
            vec![],
            interest(&[(1, "point"), (2, "result")]),
        )
        .unwrap_err();
        assert!(matches!(err, MalformedCircuitError::PublicInputOutOfRange { index: 7, .. }));

        let err = Circuit::new(
            values,
            vec![VarId(2), VarId(2)],
            vec![],
            interest(&[(1, "point"), (2, "result")]),
        )
        .unwrap_err();
        assert!(matches!(err, MalformedCircuitError::DuplicatePublicInput { position: 1, .. }));

        let circuit = Circuit::new(
            vec![field.zero(), field.one(), field.from_i64(3)],
            vec![VarId(2)],
            vec![],
            interest(&[(1, "point"), (2, "result")]),
        )
        .unwrap();
        assert!(circuit.is_public(VarId(2)));
        assert!(!circuit.is_public(VarId(1)));
    }

    #[test]
    fn test_trivial_gate() {
        let field = PrimeField::bn254();
        assert!(gate(&field, [0, 0, 0, 0, 0], [0, 0, 0]).is_trivial());
        assert!(!gate(&field, [0, 0, 0, 0, 1], [0, 0, 0]).is_trivial());
    }
}
