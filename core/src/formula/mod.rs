//! The formula façade (§4.2 component C): everything `Cell`/`Sheet` need
//! from a parsed formula, behind the [`Formula`] trait, so the graph and
//! cache-invalidation logic in `sheet.rs`/`cell.rs` never touches the AST
//! directly.

mod ast;
mod evaluator;
mod parser;

use std::fmt;

use crate::error::CellError;
use crate::position::Position;

/// What a formula sees when it resolves a cell reference — a snapshot of
/// a cell's current value, not the `Cell` itself (§4.2: "a function from
/// Position -> Cell-or-null").
#[derive(Debug, Clone, PartialEq)]
pub enum LookupValue {
    Empty,
    Number(f64),
    Text(String),
    Error(CellError),
}

/// Supplied by the caller evaluating a formula (`Sheet::get_value`, in
/// practice) — the engine never constructs one itself.
pub trait CellLookup {
    fn lookup(&self, pos: Position) -> LookupValue;
}

/// An opaque handle over a parsed expression: its AST, the cells it
/// references, and the ability to evaluate and print itself. The core
/// depends only on this trait (§2).
pub trait Formula: fmt::Debug {
    fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, CellError>;
    fn expression(&self) -> &str;
    fn referenced_cells(&self) -> &[Position];
}

#[derive(Debug)]
struct ParsedFormula {
    ast: ast::Expr,
    canonical: String,
    refs: Vec<Position>,
}

impl Formula for ParsedFormula {
    fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, CellError> {
        evaluator::evaluate(&self.ast, lookup)
    }

    fn expression(&self) -> &str {
        &self.canonical
    }

    fn referenced_cells(&self) -> &[Position] {
        &self.refs
    }
}

/// Parse formula text (without the leading `=`) into a [`Formula`]
/// capability. Fails with a human-readable message on malformed input
/// (surfaced by `Sheet::set_cell` as `SheetError::FormulaParse`).
pub fn parse_formula(text: &str) -> Result<Box<dyn Formula>, String> {
    let result = parser::parse(text)?;
    let canonical = ast::print_expr(&result.expr);
    Ok(Box::new(ParsedFormula {
        ast: result.expr,
        canonical,
        refs: result.referenced_cells,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyLookup;
    impl CellLookup for EmptyLookup {
        fn lookup(&self, _pos: Position) -> LookupValue {
            LookupValue::Empty
        }
    }

    #[test]
    fn round_trips_expression_text() {
        let f = parse_formula("A1+B2").unwrap();
        assert_eq!(f.expression(), "A1 + B2");
        assert_eq!(f.referenced_cells(), &[Position::new(0, 0), Position::new(1, 1)]);
    }

    #[test]
    fn evaluates_through_the_trait_object() {
        let f = parse_formula("2+2").unwrap();
        assert_eq!(f.evaluate(&EmptyLookup), Ok(4.0));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(parse_formula("1+*2").is_err());
    }
}
