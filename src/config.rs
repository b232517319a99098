//! Run configuration
//!
//! Every knob of a check lives in [`CheckConfig`]. Missing keys fall back
//! to their defaults, so a config file only needs the settings it changes:
//!
//! ```json
//! { "backend": "cvc5", "sign_convention": "signed", "time_budget_ms": 60000 }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::circuit::{CircuitFormat, LoadOptions};
use crate::constraint::EncodeOptions;
use crate::encoding::ValueEncoding;
use crate::error::{Error, Result};
use crate::field::SignConvention;
use crate::solver::{Backend, BackendKind, Budget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Solving backend (default: native)
    pub backend: BackendKind,

    /// How constants are written into solver scripts (default: canonical)
    pub sign_convention: SignConvention,

    /// How circuit literals are read (default: auto)
    pub literal_encoding: ValueEncoding,

    /// Circuit file serialization (default: auto)
    pub circuit_format: CircuitFormat,

    /// Wall-clock budget for the solver call
    pub time_budget_ms: u64,

    /// Node limit for the native search
    pub max_search_nodes: u64,

    /// Solver executable; defaults to `cvc5` / `z3` on the PATH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_path: Option<PathBuf>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            sign_convention: SignConvention::default(),
            literal_encoding: ValueEncoding::default(),
            circuit_format: CircuitFormat::default(),
            time_budget_ms: Budget::DEFAULT_TIMEOUT_MS,
            max_search_nodes: Budget::DEFAULT_SEARCH_NODES,
            solver_path: None,
        }
    }
}

impl CheckConfig {
    /// Parse a JSON config
    pub fn from_json(source: &str) -> Result<Self> {
        let config: CheckConfig = serde_json::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&source)
    }

    /// Reject budgets that would make every run end in UNKNOWN
    pub fn validate(&self) -> Result<()> {
        if self.time_budget_ms == 0 {
            return Err(Error::Config("time_budget_ms must be positive".to_string()));
        }
        if self.max_search_nodes == 0 {
            return Err(Error::Config("max_search_nodes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn budget(&self) -> Budget {
        Budget {
            timeout: Duration::from_millis(self.time_budget_ms),
            max_search_nodes: self.max_search_nodes,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            encoding: self.literal_encoding,
            format: self.circuit_format,
        }
    }

    /// Encoding options matching the backend's capabilities
    pub fn encode_options(&self, backend: &dyn Backend) -> EncodeOptions {
        EncodeOptions {
            domain_constraints: !backend.native_field(),
            ..EncodeOptions::default()
        }
    }

    pub fn create_backend(&self) -> Box<dyn Backend> {
        self.backend.create(self.solver_path.clone(), self.sign_convention)
    }
}
