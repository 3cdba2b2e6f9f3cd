//! Evaluates a parsed [`Expr`] against a [`CellLookup`], producing a
//! number or a [`CellError`] — never panicking, per §4.2/§7.

use super::ast::{BinOp, Expr};
use super::{CellLookup, LookupValue};
use crate::error::CellError;

pub fn evaluate(expr: &Expr, lookup: &dyn CellLookup) -> Result<f64, CellError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Reference(pos) => {
            if !pos.is_valid() {
                return Err(CellError::Ref);
            }
            match lookup.lookup(*pos) {
                LookupValue::Empty => Ok(0.0),
                LookupValue::Number(n) => Ok(n),
                LookupValue::Text(s) if s.is_empty() => Ok(0.0),
                LookupValue::Text(_) => Err(CellError::Value),
                LookupValue::Error(e) => Err(e),
            }
        }
        Expr::Negate(inner) => Ok(-evaluate(inner, lookup)?),
        Expr::Percent(inner) => Ok(evaluate(inner, lookup)? / 100.0),
        Expr::BinaryOp { op, left, right } => {
            let l = evaluate(left, lookup)?;
            let r = evaluate(right, lookup)?;
            apply_binop(*op, l, r)
        }
        Expr::Call { name, args } => evaluate_call(name, args, lookup),
    }
}

fn apply_binop(op: BinOp, l: f64, r: f64) -> Result<f64, CellError> {
    match op {
        BinOp::Add => Ok(l + r),
        BinOp::Sub => Ok(l - r),
        BinOp::Mul => Ok(l * r),
        BinOp::Div => {
            if r == 0.0 {
                Err(CellError::Div0)
            } else {
                Ok(l / r)
            }
        }
        BinOp::Pow => {
            let result = l.powf(r);
            if result.is_nan() || result.is_infinite() {
                Err(CellError::Value)
            } else {
                Ok(result)
            }
        }
    }
}

fn evaluate_call(name: &str, args: &[Expr], lookup: &dyn CellLookup) -> Result<f64, CellError> {
    // IF is special: only the taken branch is evaluated.
    if name == "IF" {
        if args.len() != 3 {
            return Err(CellError::Value);
        }
        let condition = evaluate(&args[0], lookup)?;
        return if condition != 0.0 {
            evaluate(&args[1], lookup)
        } else {
            evaluate(&args[2], lookup)
        };
    }

    let values = args
        .iter()
        .map(|a| evaluate(a, lookup))
        .collect::<Result<Vec<f64>, CellError>>()?;

    match name {
        "SUM" => Ok(values.iter().sum()),
        "AVERAGE" => {
            if values.is_empty() {
                Err(CellError::Div0)
            } else {
                Ok(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        "MIN" => values
            .into_iter()
            .reduce(f64::min)
            .ok_or(CellError::Value),
        "MAX" => values
            .into_iter()
            .reduce(f64::max)
            .ok_or(CellError::Value),
        "ABS" => one_arg(&values).map(|n| n.abs()),
        "SQRT" => one_arg(&values).and_then(|n| {
            if n < 0.0 {
                Err(CellError::Value)
            } else {
                Ok(n.sqrt())
            }
        }),
        "ROUND" => match values.as_slice() {
            [n] => Ok(round_to(*n, 0)),
            [n, d] => Ok(round_to(*n, *d as i32)),
            _ => Err(CellError::Value),
        },
        "POWER" => match values.as_slice() {
            [base, exp] => apply_binop(BinOp::Pow, *base, *exp),
            _ => Err(CellError::Value),
        },
        _ => Err(CellError::Value),
    }
}

fn one_arg(values: &[f64]) -> Result<f64, CellError> {
    match values {
        [n] => Ok(*n),
        _ => Err(CellError::Value),
    }
}

fn round_to(n: f64, decimals: i32) -> f64 {
    let multiplier = 10f64.powi(decimals);
    (n * multiplier).round() / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use std::collections::HashMap;

    struct MapLookup(HashMap<Position, LookupValue>);
    impl CellLookup for MapLookup {
        fn lookup(&self, pos: Position) -> LookupValue {
            self.0.get(&pos).cloned().unwrap_or(LookupValue::Empty)
        }
    }

    fn lookup_of(pairs: &[(Position, LookupValue)]) -> MapLookup {
        MapLookup(pairs.iter().cloned().collect())
    }

    #[test]
    fn arithmetic() {
        let lk = lookup_of(&[]);
        let expr = crate::formula::parser::parse("1+2*3").unwrap().expr;
        assert_eq!(evaluate(&expr, &lk), Ok(7.0));
    }

    #[test]
    fn division_by_zero() {
        let lk = lookup_of(&[]);
        let expr = crate::formula::parser::parse("1/0").unwrap().expr;
        assert_eq!(evaluate(&expr, &lk), Err(CellError::Div0));
    }

    #[test]
    fn reference_resolution_and_blank_as_zero() {
        let a1 = Position::new(0, 0);
        let lk = lookup_of(&[(a1, LookupValue::Number(4.0))]);
        let expr = crate::formula::parser::parse("A1+B9").unwrap().expr;
        assert_eq!(evaluate(&expr, &lk), Ok(4.0));
    }

    #[test]
    fn propagates_referenced_error() {
        let a1 = Position::new(0, 0);
        let lk = lookup_of(&[(a1, LookupValue::Error(CellError::Div0))]);
        let expr = crate::formula::parser::parse("A1+1").unwrap().expr;
        assert_eq!(evaluate(&expr, &lk), Err(CellError::Div0));
    }

    #[test]
    fn functions() {
        let lk = lookup_of(&[]);
        let expr = crate::formula::parser::parse("SUM(1,2,IF(1,3,4))")
            .unwrap()
            .expr;
        assert_eq!(evaluate(&expr, &lk), Ok(6.0));
    }
}
