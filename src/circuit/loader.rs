//! Circuit description loader
//!
//! Strict parsing of the circuit dump, either as JSON or as the msgpack
//! file the circuit dumper writes. Unknown keys, wrong types, repeated
//! keys, out-of-range indices and literals that do not fit the field are
//! all rejected; nothing is truncated or silently reduced.
//!
//! # Format
//!
//! ```json
//! {
//!   "variables": ["0", "1", "3", "9"],
//!   "public_inps": [2, 3],
//!   "vars_of_interest": {"2": "point", "3": "result"},
//!   "gates": [["1", "0", "0", "-1", "0", 2, 2, 3]]
//! }
//! ```
//!
//! Gates may instead be given in split form, as the circuit dumper writes them:
//!
//! ```json
//! {
//!   "selectors": [["1", "0", "0", "-1", "0"]],
//!   "wits": [[2, 2, 3]]
//! }
//! ```
//!
//! Selector and variable literals are JSON strings (decimal or hex, see
//! [`ValueEncoding`]) or JSON integers; negatives map to `x + p`. In msgpack
//! dumps the `vars_of_interest` keys are integers rather than strings.

use num_bigint::BigInt;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::model::{Circuit, Gate, InterestVars, VarId};
use crate::encoding::ValueEncoding;
use crate::error::{EncodingError, Error, MalformedCircuitError, Result};
use crate::field::{FieldElement, PrimeField};

const SELECTOR_NAMES: [&str; 5] = ["q_m", "q_1", "q_2", "q_3", "q_c"];
const WIRE_NAMES: [&str; 3] = ["w_l", "w_r", "w_o"];

/// Serialization of a circuit file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitFormat {
    /// Pick by file extension, then by content
    Auto,
    Json,
    /// Binary dump as written by the circuit dumper
    MsgPack,
}

impl CircuitFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitFormat::Auto => "auto",
            CircuitFormat::Json => "json",
            CircuitFormat::MsgPack => "msgpack",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CircuitFormat::Auto => "JSON or msgpack, chosen by extension or content",
            CircuitFormat::Json => "JSON circuit description",
            CircuitFormat::MsgPack => "msgpack circuit dump",
        }
    }

    /// Concrete format for a file; never returns `Auto`
    pub fn resolve(&self, path: &Path, content: &[u8]) -> CircuitFormat {
        if *self != CircuitFormat::Auto {
            return *self;
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => CircuitFormat::Json,
            Some("msgpack" | "mp" | "pack") => CircuitFormat::MsgPack,
            // a msgpack map never starts with '{'
            _ => match content.iter().find(|b| !b.is_ascii_whitespace()) {
                Some(b'{') => CircuitFormat::Json,
                _ => CircuitFormat::MsgPack,
            },
        }
    }
}

impl Default for CircuitFormat {
    fn default() -> Self {
        CircuitFormat::Auto
    }
}

impl fmt::Display for CircuitFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CircuitFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(CircuitFormat::Auto),
            "json" => Ok(CircuitFormat::Json),
            "msgpack" => Ok(CircuitFormat::MsgPack),
            _ => Err(format!(
                "Invalid circuit format '{}'. Valid formats: auto, json, msgpack",
                s
            )),
        }
    }
}

/// Options controlling how a circuit file is read
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Encoding of string literals
    pub encoding: ValueEncoding,

    /// File serialization, for [`Circuit::load_path`]
    pub format: CircuitFormat,
}

/// On-disk layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CircuitSchema {
    #[serde(default)]
    variables: Option<Vec<Value>>,

    #[serde(default)]
    public_inps: Option<Vec<Value>>,

    #[serde(default)]
    vars_of_interest: Option<InterestEntries>,

    #[serde(default)]
    gates: Option<Vec<Vec<Value>>>,

    #[serde(default)]
    selectors: Option<Vec<Vec<Value>>>,

    #[serde(default)]
    wits: Option<Vec<Vec<Value>>>,
}

/// `vars_of_interest` key: a string in JSON, an integer in msgpack
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum InterestKey {
    Index(u64),
    Text(String),
}

/// `vars_of_interest` entries in document order, repeated keys included
///
/// A plain map type would keep only the last of two equal keys.
#[derive(Debug, Default)]
struct InterestEntries(Vec<(InterestKey, String)>);

impl<'de> Deserialize<'de> for InterestEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = InterestEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from variable index to name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<InterestKey, String>()? {
                    entries.push(entry);
                }
                Ok(InterestEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Circuit {
    /// Parse a circuit description from JSON text
    ///
    /// # Example
    ///
    /// ```ignore
    /// let field = PrimeField::bn254();
    /// let circuit = Circuit::load(&json, &field, LoadOptions::default())?;
    /// ```
    #[tracing::instrument(skip_all, name = "Circuit::load")]
    pub fn load(source: &str, field: &PrimeField, options: LoadOptions) -> Result<Circuit> {
        let schema: CircuitSchema = serde_json::from_str(source)
            .map_err(|e| MalformedCircuitError::InvalidJson(e.to_string()))?;
        Self::from_schema(schema, field, options)
    }

    /// Parse a msgpack circuit dump
    #[tracing::instrument(skip_all, name = "Circuit::load_msgpack")]
    pub fn load_msgpack(bytes: &[u8], field: &PrimeField, options: LoadOptions) -> Result<Circuit> {
        tracing::debug!(bytes = bytes.len(), "decoding msgpack circuit");
        let schema: CircuitSchema =
            rmp_serde::from_slice(bytes).map_err(|e| MalformedCircuitError::InvalidMsgPack(e.to_string()))?;
        Self::from_schema(schema, field, options)
    }

    fn from_schema(schema: CircuitSchema, field: &PrimeField, options: LoadOptions) -> Result<Circuit> {
        let raw_variables = schema
            .variables
            .ok_or(MalformedCircuitError::MissingKey("variables"))?;
        let raw_public = schema
            .public_inps
            .ok_or(MalformedCircuitError::MissingKey("public_inps"))?;
        let raw_interest = schema
            .vars_of_interest
            .ok_or(MalformedCircuitError::MissingKey("vars_of_interest"))?;

        let count = raw_variables.len();
        if count < 2 {
            return Err(MalformedCircuitError::TooFewVariables(count).into());
        }

        let variables = raw_variables
            .iter()
            .enumerate()
            .map(|(index, value)| {
                parse_literal(value, field, options.encoding, format!("variables[{}]", index))?
                    .ok_or_else(|| Error::from(MalformedCircuitError::InvalidVariable { index }))
            })
            .collect::<Result<Vec<_>>>()?;

        let public_inputs = raw_public
            .iter()
            .enumerate()
            .map(|(position, value)| -> std::result::Result<VarId, MalformedCircuitError> {
                let index = value
                    .as_u64()
                    .ok_or(MalformedCircuitError::InvalidPublicInput { position })?;
                to_var_id(index, count).ok_or(MalformedCircuitError::PublicInputOutOfRange {
                    position,
                    index,
                    count,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let interest = parse_interest(&raw_interest, count)?;

        let rows = gate_rows(schema.gates, schema.selectors, schema.wits)?;
        let gates = rows
            .iter()
            .enumerate()
            .map(|(index, (selectors, wires))| {
                parse_gate(index, selectors, wires, field, options.encoding, count)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            variables = count,
            public_inputs = public_inputs.len(),
            gates = gates.len(),
            interest = interest.len(),
            "circuit loaded"
        );

        Ok(Circuit::new(variables, public_inputs, gates, interest)?)
    }

    /// Read and parse a circuit file, JSON or msgpack per `options.format`
    pub fn load_path(path: impl AsRef<Path>, field: &PrimeField, options: LoadOptions) -> Result<Circuit> {
        let path = path.as_ref();
        let io_error = |reason: String| Error::Io {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read(path).map_err(|e| io_error(e.to_string()))?;

        match options.format.resolve(path, &content) {
            CircuitFormat::MsgPack => Self::load_msgpack(&content, field, options),
            _ => {
                let source = String::from_utf8(content).map_err(|e| io_error(e.to_string()))?;
                Self::load(&source, field, options)
            }
        }
    }
}

fn to_var_id(index: u64, count: usize) -> Option<VarId> {
    if index >= count as u64 {
        return None;
    }
    u32::try_from(index).ok().map(VarId)
}

/// Parse a literal given as a JSON string or integer. `Ok(None)` for other JSON types.
fn parse_literal(
    value: &Value,
    field: &PrimeField,
    encoding: ValueEncoding,
    context: String,
) -> Result<Option<FieldElement>> {
    match value {
        Value::String(s) => field
            .parse(s, encoding)
            .map(Some)
            .map_err(|e| e.in_context(context).into()),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(Some(field.from_i64(v)))
            } else if let Some(v) = n.as_u64() {
                Ok(Some(field.normalize(&BigInt::from(v))))
            } else {
                // floats, and integers too large for serde_json's default number type
                Err(EncodingError::InvalidDecimal {
                    context,
                    literal: n.to_string(),
                }
                .into())
            }
        }
        _ => Ok(None),
    }
}

fn parse_interest(raw: &InterestEntries, count: usize) -> Result<InterestVars> {
    let mut entries = Vec::with_capacity(raw.0.len());
    for (key, name) in &raw.0 {
        let index = match key {
            InterestKey::Index(index) => *index,
            InterestKey::Text(text) => {
                // digits only: reject "+1", " 1", "-0"
                if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                    return Err(MalformedCircuitError::InvalidInterestKey(text.clone()).into());
                }
                text.parse()
                    .map_err(|_| MalformedCircuitError::InvalidInterestKey(text.clone()))?
            }
        };
        let id = to_var_id(index, count).ok_or(MalformedCircuitError::InterestOutOfRange { index, count })?;
        if entries.iter().any(|(existing, _)| *existing == id) {
            return Err(MalformedCircuitError::DuplicateInterestKey(index).into());
        }
        entries.push((id, name.clone()));
    }
    Ok(InterestVars::new(entries)?)
}

type GateRow = (Vec<Value>, Vec<Value>);

/// Normalise both gate layouts into (selectors, wires) rows
fn gate_rows(
    gates: Option<Vec<Vec<Value>>>,
    selectors: Option<Vec<Vec<Value>>>,
    wits: Option<Vec<Vec<Value>>>,
) -> std::result::Result<Vec<GateRow>, MalformedCircuitError> {
    match (gates, selectors, wits) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(MalformedCircuitError::ConflictingGateForms),
        (Some(gates), None, None) => {
            let mut rows = Vec::with_capacity(gates.len());
            for (gate, mut row) in gates.into_iter().enumerate() {
                if row.len() != 8 {
                    return Err(MalformedCircuitError::GateArity {
                        gate,
                        field: "gates",
                        expected: 8,
                        found: row.len(),
                    });
                }
                let wires = row.split_off(5);
                rows.push((row, wires));
            }
            Ok(rows)
        }
        (None, Some(selectors), Some(wits)) => {
            if selectors.len() != wits.len() {
                return Err(MalformedCircuitError::GateCountMismatch {
                    selectors: selectors.len(),
                    wits: wits.len(),
                });
            }
            let mut rows = Vec::with_capacity(selectors.len());
            for (gate, (sel, wit)) in selectors.into_iter().zip(wits).enumerate() {
                if sel.len() != 5 {
                    return Err(MalformedCircuitError::GateArity {
                        gate,
                        field: "selectors",
                        expected: 5,
                        found: sel.len(),
                    });
                }
                if wit.len() != 3 {
                    return Err(MalformedCircuitError::GateArity {
                        gate,
                        field: "wits",
                        expected: 3,
                        found: wit.len(),
                    });
                }
                rows.push((sel, wit));
            }
            Ok(rows)
        }
        (None, Some(_), None) => Err(MalformedCircuitError::MissingKey("wits")),
        (None, None, Some(_)) => Err(MalformedCircuitError::MissingKey("selectors")),
        (None, None, None) => Err(MalformedCircuitError::MissingKey("gates")),
    }
}

fn parse_gate(
    index: usize,
    selectors: &[Value],
    wires: &[Value],
    field: &PrimeField,
    encoding: ValueEncoding,
    count: usize,
) -> Result<Gate> {
    let mut q = Vec::with_capacity(5);
    for (name, value) in SELECTOR_NAMES.into_iter().zip(selectors) {
        let parsed = parse_literal(value, field, encoding, format!("gate {} {}", index, name))?
            .ok_or(MalformedCircuitError::InvalidSelector {
                gate: index,
                selector: name,
            })?;
        q.push(parsed);
    }

    let mut w = Vec::with_capacity(3);
    for (name, value) in WIRE_NAMES.into_iter().zip(wires) {
        let raw = value.as_u64().ok_or(MalformedCircuitError::InvalidWire {
            gate: index,
            wire: name,
        })?;
        let id = to_var_id(raw, count).ok_or(MalformedCircuitError::WireOutOfRange {
            gate: index,
            wire: name,
            index: raw,
            count,
        })?;
        w.push(id);
    }

    let [q_m, q_1, q_2, q_3, q_c] = <[FieldElement; 5]>::try_from(q).map_err(|_| {
        MalformedCircuitError::GateArity {
            gate: index,
            field: "selectors",
            expected: 5,
            found: selectors.len(),
        }
    })?;
    let [w_l, w_r, w_o] = <[VarId; 3]>::try_from(w).map_err(|_| MalformedCircuitError::GateArity {
        gate: index,
        field: "wits",
        expected: 3,
        found: wires.len(),
    })?;

    Ok(Gate {
        q_m,
        q_1,
        q_2,
        q_3,
        q_c,
        w_l,
        w_r,
        w_o,
    })
}
