//! Error taxonomy
//!
//! Three fatal error families, each naming the offending field, gate or
//! variable index:
//!
//! - [`MalformedCircuitError`]: structural problems in the circuit description
//! - [`EncodingError`]: a value cannot be represented in the field domain
//! - [`SolverBackendError`]: the solving backend failed internally
//!
//! An `UNKNOWN` verdict is not an error; it is reported through
//! [`crate::solver::Outcome::Unknown`].

use thiserror::Error;

/// Structural problems in the input circuit. Raised before any solving starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCircuitError {
    #[error("Invalid circuit JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid circuit msgpack: {0}")]
    InvalidMsgPack(String),

    #[error("Missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("Keys 'gates' and 'selectors'/'wits' are mutually exclusive")]
    ConflictingGateForms,

    #[error("Circuit declares {0} variables; at least 2 are required (constants 0 and 1)")]
    TooFewVariables(usize),

    #[error("Gate {gate}: expected {expected} entries in '{field}', got {found}")]
    GateArity {
        gate: usize,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("'selectors' has {selectors} rows but 'wits' has {wits}")]
    GateCountMismatch { selectors: usize, wits: usize },

    #[error("Gate {gate}: wire '{wire}' must be a non-negative integer index")]
    InvalidWire { gate: usize, wire: &'static str },

    #[error("Gate {gate}: selector '{selector}' must be a string or integer literal")]
    InvalidSelector { gate: usize, selector: &'static str },

    #[error("Gate {gate}: wire '{wire}' references variable {index}, but only {count} variables exist")]
    WireOutOfRange {
        gate: usize,
        wire: &'static str,
        index: u64,
        count: usize,
    },

    #[error("public_inps[{position}] must be a non-negative integer index")]
    InvalidPublicInput { position: usize },

    #[error("public_inps[{position}] = {index} is out of range ({count} variables)")]
    PublicInputOutOfRange {
        position: usize,
        index: u64,
        count: usize,
    },

    #[error("public_inps[{position}]: variable {index} is listed more than once")]
    DuplicatePublicInput { position: usize, index: u32 },

    #[error("variables[{index}] must be a string or integer literal")]
    InvalidVariable { index: usize },

    #[error("vars_of_interest key '{0}' is not a non-negative integer index")]
    InvalidInterestKey(String),

    #[error("vars_of_interest key for variable {0} appears more than once")]
    DuplicateInterestKey(u64),

    #[error("vars_of_interest index {index} is out of range ({count} variables)")]
    InterestOutOfRange { index: u64, count: usize },

    #[error("vars_of_interest index {0} has an empty name")]
    EmptyInterestName(u32),

    #[error("vars_of_interest name '{0}' is used more than once")]
    DuplicateInterestName(String),

    #[error("vars_of_interest needs at least 2 entries (point, result), got {0}")]
    TooFewInterestVars(usize),
}

/// A value that cannot be represented in the field domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{context}: invalid decimal literal '{literal}'")]
    InvalidDecimal { context: String, literal: String },

    #[error("{context}: invalid hexadecimal literal '{literal}'")]
    InvalidHex { context: String, literal: String },

    #[error("{context}: literal '{literal}' does not fit the field (|value| must be below the modulus)")]
    OutOfField { context: String, literal: String },

    #[error("Property encoding needs at least point and result, got {0} variables of interest")]
    PropertyArity(usize),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

impl EncodingError {
    /// Re-label the error with the location it came from (e.g. `gate 3 q_m`).
    pub fn in_context(self, location: impl Into<String>) -> Self {
        let location = location.into();
        match self {
            EncodingError::InvalidDecimal { literal, .. } => EncodingError::InvalidDecimal {
                context: location,
                literal,
            },
            EncodingError::InvalidHex { literal, .. } => EncodingError::InvalidHex {
                context: location,
                literal,
            },
            EncodingError::OutOfField { literal, .. } => EncodingError::OutOfField {
                context: location,
                literal,
            },
            other => other,
        }
    }
}

/// The solving backend failed. Distinct from an `UNKNOWN` verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverBackendError {
    #[error("Failed to start solver '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("Solver I/O failure: {0}")]
    Io(String),

    #[error("Solver reported an error: {0}")]
    Reported(String),

    #[error("Unexpected solver output: {0}")]
    UnexpectedOutput(String),

    #[error("Solver model has no value for variable {0}")]
    MissingModelValue(u32),

    #[error("Solver model violates {0}")]
    InconsistentModel(String),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    MalformedCircuit(#[from] MalformedCircuitError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    SolverBackend(#[from] SolverBackendError),

    #[error("Failed to read '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
