//! Parse pest pairs into expression trees

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::ast::*;
use crate::errors::EvalError;

#[derive(Parser)]
#[grammar = "sandbox/expr.pest"]
pub struct ExprParser;

/// Parse an expression string into a tree
pub fn parse_expression(source: &str) -> Result<Expr, EvalError> {
    let mut pairs = ExprParser::parse(Rule::expression, source).map_err(|e| EvalError::Syntax {
        expr: source.to_string(),
        message: e.variant.message().into_owned(),
    })?;

    let expression = pairs.next().ok_or_else(|| syntax(source, "empty input"))?;
    let sum = expression
        .into_inner()
        .find(|p| p.as_rule() == Rule::sum)
        .ok_or_else(|| syntax(source, "empty input"))?;
    parse_sum(sum)
}

fn syntax(source: &str, message: &str) -> EvalError {
    EvalError::Syntax {
        expr: source.to_string(),
        message: message.to_string(),
    }
}

fn parse_sum(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    // sum = product ~ (add_op ~ product)*
    let source = pair.as_str();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| syntax(source, "missing operand"))?;
    let mut result = parse_product(first)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            other => return Err(syntax(source, &format!("unexpected operator {other}"))),
        };
        let rhs = inner.next().ok_or_else(|| syntax(source, "missing operand"))?;
        result = Expr::BinaryOp(Box::new(result), op, Box::new(parse_product(rhs)?));
    }

    Ok(result)
}

fn parse_product(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    // product = unary ~ (mul_op ~ unary)*
    let source = pair.as_str();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| syntax(source, "missing operand"))?;
    let mut result = parse_unary(first)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            other => return Err(syntax(source, &format!("unexpected operator {other}"))),
        };
        let rhs = inner.next().ok_or_else(|| syntax(source, "missing operand"))?;
        result = Expr::BinaryOp(Box::new(result), op, Box::new(parse_unary(rhs)?));
    }

    Ok(result)
}

fn parse_unary(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    // unary = prefix* ~ power
    let source = pair.as_str();
    let mut prefixes = Vec::new();
    let mut operand = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::prefix => prefixes.push(if inner.as_str() == "-" {
                UnaryOp::Neg
            } else {
                UnaryOp::Pos
            }),
            Rule::power => operand = Some(parse_power(inner)?),
            _ => {}
        }
    }

    let mut result = operand.ok_or_else(|| syntax(source, "missing operand"))?;
    // Innermost prefix binds first
    for op in prefixes.into_iter().rev() {
        result = Expr::UnaryOp(op, Box::new(result));
    }
    Ok(result)
}

fn parse_power(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    // power = primary ~ (pow_op ~ unary)?
    let source = pair.as_str();
    let mut inner = pair.into_inner();
    let base = inner.next().ok_or_else(|| syntax(source, "missing operand"))?;
    let base = parse_primary(base)?;

    match (inner.next(), inner.next()) {
        (Some(_), Some(exponent)) => Ok(Expr::BinaryOp(
            Box::new(base),
            BinaryOp::Pow,
            Box::new(parse_unary(exponent)?),
        )),
        _ => Ok(base),
    }
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|e| syntax(pair.as_str(), &e.to_string())),
        Rule::ident => Ok(Expr::Variable(strip_math(pair.as_str()).to_string())),
        Rule::call => parse_call(pair),
        Rule::sum => parse_sum(pair),
        rule => Err(syntax(pair.as_str(), &format!("unexpected {rule:?}"))),
    }
}

fn parse_call(pair: Pair<Rule>) -> Result<Expr, EvalError> {
    let source = pair.as_str();
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| strip_math(p.as_str()).to_string())
        .ok_or_else(|| syntax(source, "missing function name"))?;
    let func = Function::lookup(&name).ok_or(EvalError::UnknownFunction { name })?;

    let args = inner.map(parse_sum).collect::<Result<Vec<_>, _>>()?;
    let (min, max) = func.arity();
    if args.len() < min || args.len() > max {
        return Err(EvalError::Arity {
            name: func.name(),
            expected: min,
            got: args.len(),
        });
    }
    Ok(Expr::FuncCall(func, args))
}

/// `Math.cos` and `cos` name the same thing
fn strip_math(name: &str) -> &str {
    name.strip_prefix("Math.").unwrap_or(name)
}
