//! External SMT solver backend
//!
//! Renders the constraint system as an SMT-LIB2 script, pipes it to a
//! solver process and reads back the verdict plus the values of the
//! variables of interest.
//!
//! Two dialects are supported:
//! - cvc5: `QF_FF`, variables of sort `(_ FiniteField p)`
//! - z3: `QF_NIA`, integer variables with explicit `mod p` and range constraints

use num_bigint::BigInt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::circuit::VarId;
use crate::constraint::{ConstraintSystem, Relation, Term};
use crate::encoding::{parse_integer, ValueEncoding};
use crate::error::SolverBackendError;
use crate::field::{FieldElement, PrimeField, SignConvention};

use super::sexpr::{parse_response, SExpr};
use super::{Backend, BackendAnswer, Budget, Model};

/// Extra time granted to the process beyond the solver's own limit
const KILL_GRACE: Duration = Duration::from_millis(500);

/// SMT-LIB flavour spoken by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// cvc5 finite-field theory
    FiniteField,
    /// Non-linear integer arithmetic with explicit reduction
    Integer,
}

/// Backend driving cvc5 or z3 as a child process
#[derive(Debug, Clone)]
pub struct SmtLibBackend {
    name: &'static str,
    program: PathBuf,
    dialect: Dialect,
    convention: SignConvention,
}

impl SmtLibBackend {
    pub fn cvc5(program: Option<PathBuf>, convention: SignConvention) -> Self {
        Self {
            name: "cvc5",
            program: program.unwrap_or_else(|| PathBuf::from("cvc5")),
            dialect: Dialect::FiniteField,
            convention,
        }
    }

    pub fn z3(program: Option<PathBuf>, convention: SignConvention) -> Self {
        Self {
            name: "z3",
            program: program.unwrap_or_else(|| PathBuf::from("z3")),
            dialect: Dialect::Integer,
            convention,
        }
    }

    /// Whether the solver executable can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn args(&self, budget: Budget) -> Vec<String> {
        let ms = budget.timeout.as_millis();
        match self.dialect {
            Dialect::FiniteField => vec!["--lang=smt2".to_string(), format!("--tlimit={}", ms)],
            Dialect::Integer => vec!["-in".to_string(), "-smt2".to_string(), format!("-t:{}", ms)],
        }
    }

    /// Full SMT-LIB2 script for one query
    pub fn render(&self, system: &ConstraintSystem, field: &PrimeField) -> String {
        let writer = TermWriter {
            field,
            dialect: self.dialect,
            convention: self.convention,
        };
        let mut script = String::new();

        script.push_str("(set-option :produce-models true)\n");
        match self.dialect {
            Dialect::FiniteField => {
                script.push_str("(set-logic QF_FF)\n");
                script.push_str(&format!("(define-sort F () (_ FiniteField {}))\n", field.modulus()));
            }
            Dialect::Integer => script.push_str("(set-logic QF_NIA)\n"),
        }

        let sort = match self.dialect {
            Dialect::FiniteField => "F",
            Dialect::Integer => "Int",
        };
        for i in 0..system.variable_count {
            script.push_str(&format!("(declare-const {} {})\n", VarId(i as u32), sort));
        }

        for constraint in &system.constraints {
            if let Some(assertion) = writer.relation(&constraint.relation) {
                script.push_str(&format!("; {}\n(assert {})\n", constraint.origin, assertion));
            }
        }

        script.push_str("(check-sat)\n");
        let names: Vec<String> = system.interest.ids().map(|id| id.to_string()).collect();
        script.push_str(&format!("(get-value ({}))\n", names.join(" ")));
        script.push_str("(exit)\n");
        script
    }

    fn run(&self, script: &str, budget: Budget) -> Result<Option<(String, String)>, SolverBackendError> {
        let mut child = Command::new(&self.program)
            .args(self.args(budget))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverBackendError::Spawn {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        // Pipes are serviced on their own threads so neither side can stall
        // on a full buffer while the deadline runs.
        let writer = child.stdin.take().map(|mut stdin| {
            let script = script.to_owned();
            thread::spawn(move || stdin.write_all(script.as_bytes()))
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(budget.timeout + KILL_GRACE) {
            Ok(Some(_status)) => {}
            Ok(None) => {
                // Deadline passed: kill the process. The helper threads are
                // left to finish on their own once the pipes close.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SolverBackendError::Io(format!("waiting for {}: {}", self.name, e)));
            }
        }

        if let Some(handle) = writer {
            let written = handle
                .join()
                .map_err(|_| SolverBackendError::Io(format!("{} stdin writer panicked", self.name)))?;
            match written {
                // the solver may exit before reading everything, e.g. after an error
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(SolverBackendError::Io(format!("writing to {}: {}", self.name, e)));
                }
                _ => {}
            }
        }

        Ok(Some((collect(stdout)?, collect(stderr)?)))
    }
}

/// Read a pipe to the end on a helper thread
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut out = String::new();
        pipe.read_to_string(&mut out).map(|_| out)
    })
}

fn collect(handle: Option<JoinHandle<io::Result<String>>>) -> Result<String, SolverBackendError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    handle
        .join()
        .map_err(|_| SolverBackendError::Io("solver output reader panicked".to_string()))?
        .map_err(|e| SolverBackendError::Io(e.to_string()))
}

impl Backend for SmtLibBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn native_field(&self) -> bool {
        self.dialect == Dialect::FiniteField
    }

    #[tracing::instrument(skip_all, name = "SmtLibBackend::check")]
    fn check(
        &self,
        system: &ConstraintSystem,
        field: &PrimeField,
        budget: Budget,
    ) -> Result<BackendAnswer, SolverBackendError> {
        let script = self.render(system, field);
        tracing::debug!(
            solver = self.name,
            bytes = script.len(),
            "running {}",
            self.program.display()
        );

        let Some((stdout, stderr)) = self.run(&script, budget)? else {
            return Ok(BackendAnswer::Unknown(format!(
                "{} killed after the {} ms time budget",
                self.name,
                budget.timeout.as_millis()
            )));
        };

        interpret(&stdout, &stderr, field)
    }
}

/// Turn raw solver output into a verdict
pub fn interpret(stdout: &str, stderr: &str, field: &PrimeField) -> Result<BackendAnswer, SolverBackendError> {
    let exprs = parse_response(stdout)?;

    let Some(position) = exprs
        .iter()
        .position(|e| matches!(e.as_atom(), Some("sat" | "unsat" | "unknown")))
    else {
        if let Some(message) = exprs.iter().find_map(SExpr::error_message) {
            return Err(SolverBackendError::Reported(message));
        }
        let stderr = stderr.trim();
        if stderr.contains("timeout") || stderr.contains("interrupted") {
            return Ok(BackendAnswer::Unknown(stderr.to_string()));
        }
        return Err(SolverBackendError::UnexpectedOutput(if stderr.is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.to_string()
        }));
    };

    if let Some(message) = exprs[..position].iter().find_map(SExpr::error_message) {
        return Err(SolverBackendError::Reported(message));
    }

    match exprs[position].as_atom() {
        Some("unsat") => Ok(BackendAnswer::Unsat),
        Some("unknown") => Ok(BackendAnswer::Unknown("solver returned unknown".to_string())),
        _ => {
            let values = exprs
                .get(position + 1)
                .ok_or_else(|| SolverBackendError::UnexpectedOutput("sat without a model".to_string()))?;
            if let Some(message) = values.error_message() {
                return Err(SolverBackendError::Reported(message));
            }
            read_model(values, field).map(BackendAnswer::Sat)
        }
    }
}

/// `((var_2 v) (var_3 v) ...)`
fn read_model(values: &SExpr, field: &PrimeField) -> Result<Model, SolverBackendError> {
    let unexpected = |e: &SExpr| SolverBackendError::UnexpectedOutput(format!("model entry {}", e));
    let mut model = Model::new();

    for entry in values.as_list().ok_or_else(|| unexpected(values))? {
        let [name, value] = entry.as_list().ok_or_else(|| unexpected(entry))? else {
            return Err(unexpected(entry));
        };
        let id = name
            .as_atom()
            .and_then(|n| n.strip_prefix("var_"))
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| unexpected(entry))?;
        let value = read_value(value, field).ok_or_else(|| unexpected(entry))?;
        model.insert(VarId(id), value);
    }
    Ok(model)
}

/// Field literal `#f<n>m<p>` (n possibly negative), integer, or `(- n)`
fn read_value(value: &SExpr, field: &PrimeField) -> Option<BigInt> {
    match value {
        SExpr::Atom(atom) => {
            if let Some(rest) = atom.strip_prefix("#f") {
                let (n, modulus) = rest.split_once('m')?;
                if modulus != field.modulus().to_string() {
                    return None;
                }
                parse_integer(n, ValueEncoding::Decimal).ok()
            } else {
                parse_integer(atom, ValueEncoding::Decimal).ok()
            }
        }
        SExpr::List(items) => match items.as_slice() {
            [SExpr::Atom(minus), inner] if minus == "-" => read_value(inner, field).map(|v| -v),
            [SExpr::Atom(neg), inner] if neg == "ff.neg" => read_value(inner, field).map(|v| -v),
            _ => None,
        },
    }
}

/// Writes terms in the backend's dialect
struct TermWriter<'f> {
    field: &'f PrimeField,
    dialect: Dialect,
    convention: SignConvention,
}

impl TermWriter<'_> {
    fn constant(&self, c: &FieldElement) -> String {
        let k = self.field.represent(c, self.convention);
        let magnitude = k.magnitude();
        let negative = k.sign() == num_bigint::Sign::Minus;
        match self.dialect {
            Dialect::FiniteField => {
                let lit = format!("#f{}m{}", magnitude, self.field.modulus());
                if negative {
                    format!("(ff.neg {})", lit)
                } else {
                    lit
                }
            }
            Dialect::Integer => {
                if negative {
                    format!("(- {})", magnitude)
                } else {
                    magnitude.to_string()
                }
            }
        }
    }

    fn term(&self, t: &Term) -> String {
        let (add, mul, neg) = match self.dialect {
            Dialect::FiniteField => ("ff.add", "ff.mul", "ff.neg"),
            Dialect::Integer => ("+", "*", "-"),
        };
        match t {
            Term::Const(c) => self.constant(c),
            Term::Var(id) => id.to_string(),
            Term::Add(parts) => self.nary(add, parts, &self.field.zero()),
            Term::Mul(parts) => self.nary(mul, parts, &self.field.one()),
            Term::Neg(inner) => format!("({} {})", neg, self.term(inner)),
        }
    }

    fn nary(&self, op: &str, parts: &[Term], empty: &FieldElement) -> String {
        match parts {
            [] => self.constant(empty),
            [single] => self.term(single),
            _ => {
                let args: Vec<String> = parts.iter().map(|p| self.term(p)).collect();
                format!("({} {})", op, args.join(" "))
            }
        }
    }

    fn reduced(&self, t: &Term) -> String {
        match self.dialect {
            Dialect::FiniteField => self.term(t),
            Dialect::Integer => format!("(mod {} {})", self.term(t), self.field.modulus()),
        }
    }

    fn relation(&self, r: &Relation) -> Option<String> {
        match r {
            Relation::True => None,
            Relation::Equal(l, r) => Some(format!("(= {} {})", self.reduced(l), self.reduced(r))),
            Relation::NotEqual(l, r) => Some(format!("(not (= {} {}))", self.reduced(l), self.reduced(r))),
            Relation::InRange(id) => match self.dialect {
                Dialect::FiniteField => None,
                Dialect::Integer => Some(format!("(and (<= 0 {}) (< {} {}))", id, id, self.field.modulus())),
            },
        }
    }
}

/// Bounded wait on a child process
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            match self.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None => {
                    if start.elapsed() >= timeout {
                        return Ok(None);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }
}
