//! Arithmetic expression sandbox
//!
//! Expressions are parsed with a small PEG grammar and evaluated against an
//! explicit [`Scope`]. The only callable functions are the fixed table in
//! [`Function`]; there is no other capability to reach.

mod ast;
mod eval;
mod parse;

pub use ast::{BinaryOp, Expr, Function, UnaryOp, constant};
pub use eval::Scope;

use crate::errors::EvalError;

/// Parse `source` into an evaluable tree.
pub fn compile(source: &str) -> Result<Expr, EvalError> {
    parse::parse_expression(source)
}

/// Evaluate `source` against `scope`.
///
/// Bare numeric literals are read directly without going through the parser.
pub fn evaluate(source: &str, scope: &Scope<'_>) -> Result<f64, EvalError> {
    if let Some(value) = literal(source) {
        return Ok(value);
    }
    compile(source)?.eval(scope)
}

/// Evaluate `source`, logging a warning and returning `fallback` on failure.
pub fn evaluate_or(source: &str, scope: &Scope<'_>, fallback: f64) -> f64 {
    match evaluate(source, scope) {
        Ok(value) => value,
        Err(err) => {
            crate::log::warn!("evaluation of {:?} failed: {}", source, err);
            fallback
        }
    }
}

fn literal(source: &str) -> Option<f64> {
    source
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn literal_bypass() {
        assert_eq!(evaluate(" -3.75 ", &Scope::default()), Ok(-3.75));
        assert_eq!(evaluate("1e2", &Scope::default()), Ok(100.0));
    }

    #[test]
    fn non_finite_literals_are_not_numbers() {
        assert!(evaluate("inf", &Scope::default()).is_err());
        assert!(evaluate("NaN", &Scope::default()).is_err());
    }

    #[test]
    fn evaluate_with_bindings() {
        let mut vars = BTreeMap::new();
        vars.insert("a".to_string(), 5.0);
        let locals = [("x", 2.0)];
        let scope = Scope::new(&vars).with_locals(&locals);
        assert_eq!(evaluate("a*x", &scope), Ok(10.0));
        assert_eq!(evaluate("Math.pow(x, 3) - a", &scope), Ok(3.0));
    }

    #[test]
    fn evaluate_or_falls_back() {
        let scope = Scope::default();
        for input in [
            "",
            "a*x",
            "1/0",
            "this.constructor",
            "process.exit(1)",
            "(function(){})()",
            "x => x",
            "require('fs')",
            "2 +* 3",
        ] {
            assert_eq!(evaluate_or(input, &scope, 0.0), 0.0, "input {input:?}");
        }
    }
}
