//! CLI tool for checking PLONK circuits against the evaluation property
//!
//! # Examples
//!
//! Check a circuit with the built-in backend:
//! ```bash
//! plonk-smt-cli check circuit.json
//! ```
//!
//! Use cvc5 with a 60 second budget and print a JSON report:
//! ```bash
//! plonk-smt-cli check circuit.json --backend cvc5 --timeout-ms 60000 --json
//! ```
//!
//! See which external solvers are installed:
//! ```bash
//! plonk-smt-cli backends
//! ```
//!
//! Exit status: 0 UNSAT, 1 SAT, 2 UNKNOWN, 3 error.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plonk_smt_core::api::{check_path, CheckResponse, ErrorResponse};
use plonk_smt_core::encoding::to_hex;
use plonk_smt_core::solver::SmtLibBackend;
use plonk_smt_core::{
    BackendKind, CheckConfig, CircuitFormat, Error, FieldElement, Outcome, Report, SignConvention, ValueEncoding,
};

const EXIT_UNSAT: i32 = 0;
const EXIT_SAT: i32 = 1;
const EXIT_UNKNOWN: i32 = 2;
const EXIT_ERROR: i32 = 3;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a circuit enforces Horner evaluation of its variables of interest
    Check(CheckArgs),

    /// List solving backends and whether their executables can be started
    Backends,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Circuit description (JSON or msgpack)
    #[arg(value_name = "FILE")]
    circuit: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Solving backend: native, cvc5 or z3
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Constant rendering for solver scripts: canonical or signed
    #[arg(long = "sign")]
    sign_convention: Option<SignConvention>,

    /// Literal encoding in the circuit file: auto, decimal or hex
    #[arg(long)]
    encoding: Option<ValueEncoding>,

    /// Circuit file format: auto, json or msgpack
    #[arg(long)]
    format: Option<CircuitFormat>,

    /// Wall-clock budget for the solver
    #[arg(long = "timeout-ms", value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Node limit for the native search
    #[arg(long = "max-nodes")]
    max_nodes: Option<u64>,

    /// Solver executable (defaults to cvc5 / z3 on the PATH)
    #[arg(long = "solver", value_name = "PATH")]
    solver_path: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print counterexample values in hex instead of decimal
    #[arg(long)]
    hex: bool,
}

impl CheckArgs {
    fn config(&self) -> Result<CheckConfig, Error> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::load(path)?,
            None => CheckConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(sign) = self.sign_convention {
            config.sign_convention = sign;
        }
        if let Some(encoding) = self.encoding {
            config.literal_encoding = encoding;
        }
        if let Some(format) = self.format {
            config.circuit_format = format;
        }
        if let Some(ms) = self.timeout_ms {
            config.time_budget_ms = ms;
        }
        if let Some(nodes) = self.max_nodes {
            config.max_search_nodes = nodes;
        }
        if let Some(path) = &self.solver_path {
            config.solver_path = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Command::Check(args) => run_check(&args),
        Command::Backends => list_backends(),
    };
    process::exit(code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_backends() -> i32 {
    for kind in [BackendKind::Native, BackendKind::Cvc5, BackendKind::Z3] {
        let available = match kind {
            BackendKind::Native => true,
            BackendKind::Cvc5 => SmtLibBackend::cvc5(None, SignConvention::Canonical).is_available(),
            BackendKind::Z3 => SmtLibBackend::z3(None, SignConvention::Canonical).is_available(),
        };
        let status = if available { "available" } else { "not found" };
        println!("{:<7} {:<10} {}", kind.as_str(), status, kind.description());
    }
    0
}

fn run_check(args: &CheckArgs) -> i32 {
    let result = args.config().and_then(|config| {
        tracing::info!("Backend: {} - {}", config.backend, config.backend.description());
        tracing::info!(
            "Circuit format: {} - {}",
            config.circuit_format,
            config.circuit_format.description()
        );
        tracing::info!(
            "Literals: {} - {}",
            config.literal_encoding,
            config.literal_encoding.description()
        );
        tracing::info!(
            "Solver constants: {} - {}",
            config.sign_convention,
            config.sign_convention.description()
        );
        check_path(&args.circuit, &config)
    });

    match result {
        Ok(report) => {
            if args.json {
                print_json(&CheckResponse::from(&report));
            } else {
                print_report(&report, args.hex);
            }
            match report.outcome {
                Outcome::Unsat => EXIT_UNSAT,
                Outcome::Sat(_) => EXIT_SAT,
                Outcome::Unknown { .. } => EXIT_UNKNOWN,
            }
        }
        Err(err) => {
            if args.json {
                print_json(&ErrorResponse::from(&err));
            } else {
                eprintln!("Error: {}", err);
            }
            EXIT_ERROR
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize report: {}", e),
    }
}

fn print_report(report: &Report, hex: bool) {
    let render = |value: &FieldElement| {
        if hex {
            to_hex(value.value())
        } else {
            value.to_string()
        }
    };

    println!("Backend: {}", report.backend);
    println!("Gates: {}", report.gate_count);
    println!("Time elapsed: {:.4} s", report.elapsed.as_secs_f64());
    println!("Result: {}", report.outcome.label());

    match &report.outcome {
        Outcome::Unsat => println!("The circuit enforces the evaluation relation."),
        Outcome::Unknown { reason } => println!("Reason: {}", reason),
        Outcome::Sat(witness) => {
            println!("Counterexample:");
            for (name, value) in &witness.values {
                println!("  {} = {}", name, render(value));
            }
            println!("  ev = {}", render(&witness.ev));
        }
    }
}
