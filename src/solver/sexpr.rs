//! S-expression reader for SMT-LIB2 solver output
//!
//! This module uses Pest to split the raw response into s-expressions.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::fmt;

use crate::error::SolverBackendError;

#[derive(Parser)]
#[grammar = "solver/smt_response.pest"]
struct ResponseParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(s) => Some(s),
            SExpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            SExpr::Atom(_) => None,
        }
    }

    /// `(error "msg")` → `msg`
    pub fn error_message(&self) -> Option<String> {
        match self.as_list()? {
            [SExpr::Atom(head), rest @ ..] if head == "error" => Some(
                rest.iter()
                    .map(|e| e.to_string().trim_matches('"').to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Atom(s) => write!(f, "{}", s),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Parse the whole solver output into top-level s-expressions
pub fn parse_response(input: &str) -> Result<Vec<SExpr>, SolverBackendError> {
    let mut pairs = ResponseParser::parse(Rule::response, input)
        .map_err(|e| SolverBackendError::UnexpectedOutput(e.to_string()))?;

    let response = pairs
        .next()
        .ok_or_else(|| SolverBackendError::UnexpectedOutput("empty response".to_string()))?;

    Ok(response
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build)
        .collect())
}

fn build(pair: Pair<Rule>) -> SExpr {
    match pair.as_rule() {
        Rule::list => SExpr::List(pair.into_inner().map(build).collect()),
        _ => SExpr::Atom(pair.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_and_values() {
        let out = "sat\n((var_2 #f5m11) (var_3 #f-1m11))\n";
        let exprs = parse_response(out).unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].as_atom(), Some("sat"));

        let values = exprs[1].as_list().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].to_string(), "(var_3 #f-1m11)");
    }

    #[test]
    fn test_parse_negative_integer() {
        let exprs = parse_response("sat ((var_4 (- 12)))").unwrap();
        let pair = exprs[1].as_list().unwrap()[0].as_list().unwrap();
        assert_eq!(pair[0].as_atom(), Some("var_4"));
        assert_eq!(pair[1].to_string(), "(- 12)");
    }

    #[test]
    fn test_error_message() {
        let exprs = parse_response("(error \"line 3: unknown logic\")\nunsat").unwrap();
        assert_eq!(exprs[0].error_message().as_deref(), Some("line 3: unknown logic"));
        assert_eq!(exprs[1].error_message(), None);
    }

    #[test]
    fn test_comments_and_empty_output() {
        assert!(parse_response("; solver banner\n").unwrap().is_empty());
        assert!(parse_response("").unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_output_is_rejected() {
        assert!(matches!(
            parse_response("sat ((var_2 3)"),
            Err(SolverBackendError::UnexpectedOutput(_))
        ));
    }
}
