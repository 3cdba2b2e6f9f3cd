//! Turns formula text into an [`Expr`] using a pest-generated grammar
//! (`grammar.pest`), collecting the syntactically referenced cells in
//! source order as it goes.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::ast::{BinOp, Expr};
use crate::position::Position;

#[derive(Parser)]
#[grammar = "formula/grammar.pest"]
struct FormulaGrammar;

pub struct ParseResult {
    pub expr: Expr,
    pub referenced_cells: Vec<Position>,
}

/// Parse formula text (without the leading `=`) into an AST plus the
/// deduplicated, order-preserved list of cells it references.
pub fn parse(text: &str) -> Result<ParseResult, String> {
    let mut pairs = FormulaGrammar::parse(Rule::formula, text).map_err(|e| e.to_string())?;
    let formula_pair = pairs.next().ok_or_else(|| "empty formula".to_string())?;
    let mut inner = formula_pair.into_inner();
    let expr_pair = inner
        .next()
        .ok_or_else(|| "malformed formula".to_string())?;

    let mut refs = Vec::new();
    let expr = build_expr(expr_pair, &mut refs)?;
    Ok(ParseResult {
        expr,
        referenced_cells: refs,
    })
}

fn build_expr(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    match pair.as_rule() {
        Rule::expr => build_expr(first_inner(pair)?, refs),
        Rule::add_expr => build_left_assoc(pair, refs),
        Rule::mul_expr => build_left_assoc(pair, refs),
        Rule::pow_expr => build_left_assoc(pair, refs),
        Rule::unary => build_unary(pair, refs),
        Rule::postfix => build_postfix(pair, refs),
        Rule::primary => build_primary(pair, refs),
        Rule::number => {
            let n: f64 = pair
                .as_str()
                .parse()
                .map_err(|_| format!("invalid number literal: {}", pair.as_str()))?;
            Ok(Expr::Number(n))
        }
        Rule::reference => {
            let pos = parse_reference(pair.as_str())?;
            if !refs.contains(&pos) {
                refs.push(pos);
            }
            Ok(Expr::Reference(pos))
        }
        Rule::function_call => build_function_call(pair, refs),
        other => Err(format!("unexpected grammar rule: {:?}", other)),
    }
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, String> {
    pair.into_inner()
        .next()
        .ok_or_else(|| "empty expression".to_string())
}

fn build_left_assoc(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| "missing left operand".to_string())?;
    let mut expr = build_expr(first, refs)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "^" => BinOp::Pow,
            other => return Err(format!("unknown operator: {}", other)),
        };
        let rhs_pair = inner
            .next()
            .ok_or_else(|| "missing right operand".to_string())?;
        let rhs = build_expr(rhs_pair, refs)?;
        expr = Expr::BinaryOp {
            op,
            left: Box::new(expr),
            right: Box::new(rhs),
        };
    }
    Ok(expr)
}

fn build_unary(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    let mut negate = false;
    let mut postfix_pair = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::sign => {
                if p.as_str() == "-" {
                    negate = !negate;
                }
            }
            Rule::postfix => postfix_pair = Some(p),
            other => return Err(format!("unexpected rule in unary: {:?}", other)),
        }
    }
    let postfix_pair = postfix_pair.ok_or_else(|| "missing operand".to_string())?;
    let expr = build_postfix(postfix_pair, refs)?;
    Ok(if negate { Expr::Negate(Box::new(expr)) } else { expr })
}

fn build_postfix(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let primary = inner
        .next()
        .ok_or_else(|| "missing operand".to_string())?;
    let expr = build_expr(primary, refs)?;
    if inner.next().is_some() {
        Ok(Expr::Percent(Box::new(expr)))
    } else {
        Ok(expr)
    }
}

fn build_primary(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::expr => build_expr(inner, refs),
        _ => build_expr(inner, refs),
    }
}

fn build_function_call(pair: Pair<Rule>, refs: &mut Vec<Position>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| "missing function name".to_string())?
        .as_str()
        .to_ascii_uppercase();
    let mut args = Vec::new();
    if let Some(arg_list) = inner.next() {
        for arg in arg_list.into_inner() {
            args.push(build_expr(arg, refs)?);
        }
    }
    Ok(Expr::Call { name, args })
}

fn parse_reference(text: &str) -> Result<Position, String> {
    Position::from_a1(text).ok_or_else(|| format!("invalid cell reference: {}", text))
}
