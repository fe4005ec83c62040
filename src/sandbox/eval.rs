//! Tree-walking evaluation of sandbox expressions

use std::collections::BTreeMap;

use super::ast::*;
use crate::errors::EvalError;
use crate::types::finite;

/// Names visible to an expression.
///
/// Lookup order is locals (the plot variable `x`, pointer `x`/`y`), then the
/// figure's variables, then the built-in constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    pub locals: &'a [(&'a str, f64)],
    pub variables: Option<&'a BTreeMap<String, f64>>,
}

impl<'a> Scope<'a> {
    pub fn new(variables: &'a BTreeMap<String, f64>) -> Self {
        Self {
            locals: &[],
            variables: Some(variables),
        }
    }

    pub fn with_locals(mut self, locals: &'a [(&'a str, f64)]) -> Self {
        self.locals = locals;
        self
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| *local == name)
            .map(|(_, value)| *value)
            .or_else(|| self.variables.and_then(|vars| vars.get(name).copied()))
            .or_else(|| constant(name))
    }
}

impl Expr {
    /// Evaluate against `scope`, rejecting NaN and infinite results.
    pub fn eval(&self, scope: &Scope<'_>) -> Result<f64, EvalError> {
        let value = eval_expr(self, scope)?;
        finite(value).map_err(|_| EvalError::NonFinite)
    }
}

/// Evaluate a tree. Intermediate results may be non-finite; [`Expr::eval`]
/// checks the final value.
pub fn eval_expr(expr: &Expr, scope: &Scope<'_>) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => scope
            .lookup(name)
            .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() }),
        Expr::UnaryOp(op, operand) => {
            let value = eval_expr(operand, scope)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Pos => value,
            })
        }
        Expr::BinaryOp(lhs, op, rhs) => {
            let l = eval_expr(lhs, scope)?;
            let r = eval_expr(rhs, scope)?;
            Ok(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Rem => l % r,
                BinaryOp::Pow => l.powf(r),
            })
        }
        Expr::FuncCall(func, args) => {
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            apply(*func, &values)
        }
    }
}

fn apply(func: Function, args: &[f64]) -> Result<f64, EvalError> {
    let (min, max) = func.arity();
    if args.len() < min || args.len() > max {
        return Err(EvalError::Arity {
            name: func.name(),
            expected: min,
            got: args.len(),
        });
    }

    let a = args[0];
    let value = match func {
        Function::Sin => a.sin(),
        Function::Cos => a.cos(),
        Function::Tan => a.tan(),
        Function::Asin => a.asin(),
        Function::Acos => a.acos(),
        Function::Atan => a.atan(),
        Function::Atan2 => a.atan2(args[1]),
        Function::Sinh => a.sinh(),
        Function::Cosh => a.cosh(),
        Function::Tanh => a.tanh(),
        Function::Exp => a.exp(),
        Function::Log => a.ln(),
        Function::Log10 => a.log10(),
        Function::Log2 => a.log2(),
        Function::Sqrt => a.sqrt(),
        Function::Cbrt => a.cbrt(),
        Function::Abs => a.abs(),
        Function::Floor => a.floor(),
        Function::Ceil => a.ceil(),
        Function::Round => (a + 0.5).floor(),
        Function::Trunc => a.trunc(),
        Function::Sign => {
            if a == 0.0 || a.is_nan() {
                a
            } else {
                a.signum()
            }
        }
        Function::Pow => a.powf(args[1]),
        Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Function::Hypot => a.hypot(args[1]),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::parse::parse_expression;

    fn eval_with(src: &str, scope: &Scope<'_>) -> Result<f64, EvalError> {
        eval_expr(&parse_expression(src)?, scope)
    }

    #[test]
    fn eval_arithmetic() {
        let scope = Scope::default();
        assert_eq!(eval_with("1 + 2 * 3", &scope), Ok(7.0));
        assert_eq!(eval_with("(1 + 2) * 3", &scope), Ok(9.0));
        assert_eq!(eval_with("7 % 4", &scope), Ok(3.0));
        assert_eq!(eval_with("-2^2", &scope), Ok(-4.0));
        assert_eq!(eval_with("2^-1", &scope), Ok(0.5));
    }

    #[test]
    fn eval_locals_shadow_variables() {
        let mut vars = BTreeMap::new();
        vars.insert("x".to_string(), 10.0);
        vars.insert("a".to_string(), 2.0);
        let locals = [("x", 3.0)];
        let scope = Scope::new(&vars).with_locals(&locals);
        assert_eq!(eval_with("a * x", &scope), Ok(6.0));
    }

    #[test]
    fn eval_constants() {
        let scope = Scope::default();
        assert_eq!(eval_with("cos(PI)", &scope), Ok(-1.0));
        assert_eq!(eval_with("log(E)", &scope), Ok(1.0));
        assert_eq!(eval_with("Math.max(1, 5, 3)", &scope), Ok(5.0));
    }

    #[test]
    fn eval_round_matches_half_up() {
        let scope = Scope::default();
        assert_eq!(eval_with("round(2.5)", &scope), Ok(3.0));
        assert_eq!(eval_with("round(-2.5)", &scope), Ok(-2.0));
    }

    #[test]
    fn eval_rejects_non_finite() {
        let expr = parse_expression("1 / 0").unwrap();
        assert_eq!(expr.eval(&Scope::default()), Err(EvalError::NonFinite));
        let expr = parse_expression("sqrt(-1)").unwrap();
        assert_eq!(expr.eval(&Scope::default()), Err(EvalError::NonFinite));
    }

    #[test]
    fn eval_undefined_variable() {
        assert_eq!(
            eval_with("b + 1", &Scope::default()),
            Err(EvalError::UndefinedVariable { name: "b".into() })
        );
    }
}
