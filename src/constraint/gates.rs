//! Gate, constant, public-input and domain encoders

use crate::circuit::{Circuit, Gate, VarId};
use crate::field::FieldDomain;

use super::term::{Constraint, Origin, Relation, Symbolic};
use super::EncodeOptions;

/// Left-hand side of a gate equation: `q_m·a·b + q_1·a + q_2·b + q_3·c + q_c`
///
/// `values` supplies the domain value of (w_l, w_r, w_o). With `skip_zero`
/// set, terms whose selector is zero are left out instead of being
/// multiplied by zero. Returns `None` when every term was skipped.
pub fn gate_polynomial<D: FieldDomain>(
    domain: &D,
    gate: &Gate,
    values: &[D::Value; 3],
    skip_zero: bool,
) -> Option<D::Value> {
    let [a, b, c] = values;
    let terms = [
        (&gate.q_m, Some(domain.mul(a, b))),
        (&gate.q_1, Some(a.clone())),
        (&gate.q_2, Some(b.clone())),
        (&gate.q_3, Some(c.clone())),
        (&gate.q_c, None),
    ];

    let mut acc: Option<D::Value> = None;
    for (selector, wire_term) in terms {
        if skip_zero && selector.is_zero() {
            continue;
        }
        let q = domain.constant(selector);
        let term = match wire_term {
            Some(t) => domain.mul(&q, &t),
            None => q,
        };
        acc = Some(match acc {
            Some(sum) => domain.add(&sum, &term),
            None => term,
        });
    }
    acc
}

/// One `poly == 0` constraint per gate; all-zero gates become [`Relation::True`]
pub fn encode_gates(gates: &[Gate], sym: &Symbolic<'_>, options: &EncodeOptions) -> Vec<Constraint> {
    gates
        .iter()
        .enumerate()
        .map(|(index, gate)| {
            let wires = gate.wires().map(|id| sym.var(id));
            let relation = match gate_polynomial(sym, gate, &wires, options.skip_zero_selectors) {
                Some(poly) if !gate.is_trivial() => sym.eq(&poly, &sym.zero()),
                _ => Relation::True,
            };
            Constraint::new(Origin::Gate(index), relation)
        })
        .collect()
}

/// `v0 == 0` and `v1 == 1`
pub fn encode_fixed(sym: &Symbolic<'_>) -> Vec<Constraint> {
    vec![
        Constraint::new(
            Origin::Constant(VarId::ZERO),
            sym.eq(&sym.var(VarId::ZERO), &sym.zero()),
        ),
        Constraint::new(
            Origin::Constant(VarId::ONE),
            sym.eq(&sym.var(VarId::ONE), &sym.one()),
        ),
    ]
}

/// Pin every public input to its declared value
pub fn encode_public_inputs(circuit: &Circuit, sym: &Symbolic<'_>) -> Vec<Constraint> {
    circuit
        .public_inputs()
        .iter()
        .map(|&id| {
            Constraint::new(
                Origin::PublicInput(id),
                sym.eq(&sym.var(id), &sym.constant(circuit.value(id))),
            )
        })
        .collect()
}

/// `0 <= v < p` for every variable
pub fn encode_domain(variable_count: usize) -> Vec<Constraint> {
    (0..variable_count as u32)
        .map(|i| Constraint::new(Origin::Domain(VarId(i)), Relation::InRange(VarId(i))))
        .collect()
}
