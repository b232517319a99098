//! End-to-end checks over the JSON fixtures with the native backend

use std::path::PathBuf;
use std::process::Command;

use plonk_smt_core::{
    check_path, CheckConfig, CircuitFormat, Error, MalformedCircuitError, Outcome, PrimeField, ValueEncoding,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_sound_horner_circuit_is_unsat() {
    let report = check_path(fixture("horner_sound.json"), &CheckConfig::default()).unwrap();
    assert_eq!(report.outcome, Outcome::Unsat);
    assert_eq!(report.gate_count, 4);
}

#[test]
fn test_split_form_matches_combined_form() {
    let report = check_path(fixture("horner_split_form.json"), &CheckConfig::default()).unwrap();
    assert_eq!(report.outcome, Outcome::Unsat);
    assert_eq!(report.gate_count, 4);
}

#[test]
fn test_wrong_wire_gives_checked_counterexample() {
    let field = PrimeField::bn254();
    let report = check_path(fixture("horner_wrong_wire.json"), &CheckConfig::default()).unwrap();

    let witness = match report.outcome {
        Outcome::Sat(witness) => witness,
        other => panic!("expected SAT, got {:?}", other),
    };

    let names: Vec<&str> = witness.values.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["c0", "c1", "c2", "point", "result"]);
    assert_eq!(witness.values["point"], field.from_i64(4));
    assert_ne!(witness.values["result"], witness.ev);

    // the faulty circuit computes c0·x² + c1·x + c1 instead of ... + c2
    let v = |name: &str| witness.values[name].clone();
    let x = v("point");
    let x2 = field.mul(&x, &x);
    let computed = field.add(
        &field.add(&field.mul(&v("c0"), &x2), &field.mul(&v("c1"), &x)),
        &v("c1"),
    );
    assert_eq!(v("result"), computed);
}

#[test]
fn test_hard_constraint_is_unknown_not_unsat() {
    let report = check_path(fixture("square_unsolved.json"), &CheckConfig::default()).unwrap();
    assert!(matches!(report.outcome, Outcome::Unknown { .. }));
    assert_eq!(report.gate_count, 1);
}

#[test]
fn test_wire_out_of_range_names_gate() {
    let err = check_path(fixture("wire_out_of_range.json"), &CheckConfig::default()).unwrap_err();
    match err {
        Error::MalformedCircuit(MalformedCircuitError::WireOutOfRange { gate, wire, index, count }) => {
            assert_eq!((gate, wire, index, count), (0, "w_o", 4, 4));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_decimal_encoding_rejects_hex_fixture() {
    let config = CheckConfig {
        literal_encoding: ValueEncoding::Decimal,
        ..CheckConfig::default()
    };
    let err = check_path(fixture("horner_split_form.json"), &config).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn test_forced_msgpack_format_rejects_json_file() {
    let config = CheckConfig {
        circuit_format: CircuitFormat::MsgPack,
        ..CheckConfig::default()
    };
    let err = check_path(fixture("horner_sound.json"), &config).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedCircuit(MalformedCircuitError::InvalidMsgPack(_))
    ));
}

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_plonk-smt-cli"))
}

#[test]
fn test_cli_exit_codes() {
    let unsat = cli().arg("check").arg(fixture("horner_sound.json")).output().unwrap();
    assert_eq!(unsat.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&unsat.stdout);
    assert!(stdout.contains("Result: UNSAT"));
    assert!(stdout.contains("Gates: 4"));
    assert!(stdout.contains("Time elapsed:"));

    let sat = cli().arg("check").arg(fixture("horner_wrong_wire.json")).output().unwrap();
    assert_eq!(sat.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&sat.stdout);
    assert!(stdout.contains("Result: SAT"));
    assert!(stdout.contains("  ev = "));

    let unknown = cli().arg("check").arg(fixture("square_unsolved.json")).output().unwrap();
    assert_eq!(unknown.status.code(), Some(2));

    let error = cli().arg("check").arg(fixture("wire_out_of_range.json")).output().unwrap();
    assert_eq!(error.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&error.stderr).contains("w_o"));
}

#[test]
fn test_cli_json_report() {
    let out = cli()
        .args(["check", "--json", "--backend", "native"])
        .arg(fixture("horner_wrong_wire.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["result"], "SAT");
    assert_eq!(json["gates"], 4);
    assert_eq!(json["backend"], "native");
    assert_eq!(json["witness"]["point"], "4");
    assert!(json["elapsed_seconds"].is_number());
}

#[test]
fn test_cli_hex_witness() {
    let out = cli()
        .args(["check", "--hex"])
        .arg(fixture("horner_wrong_wire.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("  point = 0x4"));
}

#[test]
fn test_cli_lists_backends() {
    let out = cli().arg("backends").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.lines().any(|l| l.starts_with("native") && l.contains("available")));
    assert!(stdout.contains("cvc5"));
    assert!(stdout.contains("z3"));
}

#[test]
fn test_cli_rejects_unknown_backend() {
    let out = cli()
        .args(["check", "--backend", "yices"])
        .arg(fixture("horner_sound.json"))
        .output()
        .unwrap();
    assert!(!out.status.success());
}
