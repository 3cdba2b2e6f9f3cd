//! A single table slot (§3, §4.3): one of {empty, text, formula}, its
//! in/out edge sets, and — for formulas — a single-slot cached result.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{CellError, SheetError};
use crate::formula::{self, CellLookup, Formula};
use crate::position::Position;
use crate::value::CellValue;

#[derive(Debug)]
enum CellKind {
    Empty,
    Text(String),
    Formula(Box<dyn Formula>),
}

/// A single cell. Always constructed `Empty` (§4.3).
#[derive(Debug)]
pub struct Cell {
    kind: CellKind,
    /// Single-slot memo: `None` means "not yet evaluated or invalidated".
    cache: RefCell<Option<Result<f64, CellError>>>,
    out: HashSet<Position>,
    r#in: HashSet<Position>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            kind: CellKind::Empty,
            cache: RefCell::new(None),
            out: HashSet::new(),
            r#in: HashSet::new(),
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Cell::default()
    }

    /// Transition to Empty/Text/Formula per the rules in §4.3. On parse
    /// failure the cell's kind is left exactly as it was.
    pub fn set(&mut self, text: &str) -> Result<(), SheetError> {
        let new_kind = if text.is_empty() {
            CellKind::Empty
        } else if text.starts_with('=') && text.len() > 1 {
            let handle =
                formula::parse_formula(&text[1..]).map_err(SheetError::FormulaParse)?;
            CellKind::Formula(handle)
        } else {
            CellKind::Text(text.to_string())
        };
        self.kind = new_kind;
        *self.cache.borrow_mut() = None;
        Ok(())
    }

    /// The text that would reproduce this cell's current kind (§3/§4.3).
    pub fn text(&self) -> String {
        match &self.kind {
            CellKind::Empty => String::new(),
            CellKind::Text(s) => s.clone(),
            CellKind::Formula(f) => format!("={}", f.expression()),
        }
    }

    /// Evaluate (and memoize) this cell's value. Formula cells consult
    /// `lookup` on a cache miss; text/empty cells are pure functions of
    /// their stored text (§3).
    pub fn value(&self, lookup: &dyn CellLookup) -> CellValue {
        match &self.kind {
            CellKind::Empty => CellValue::Empty,
            CellKind::Text(s) => text_value(s),
            CellKind::Formula(f) => {
                let mut cache = self.cache.borrow_mut();
                if cache.is_none() {
                    *cache = Some(f.evaluate(lookup));
                }
                match cache.as_ref().unwrap() {
                    Ok(n) => CellValue::Number(*n),
                    Err(e) => CellValue::Error(*e),
                }
            }
        }
    }

    /// Direct outgoing references of the last successful `set` (§6).
    pub fn referenced_cells(&self) -> &[Position] {
        match &self.kind {
            CellKind::Formula(f) => f.referenced_cells(),
            _ => &[],
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.kind, CellKind::Formula(_))
    }

    pub fn out_edges(&self) -> &HashSet<Position> {
        &self.out
    }

    pub fn in_edges(&self) -> &HashSet<Position> {
        &self.r#in
    }

    pub fn add_out(&mut self, pos: Position) {
        self.out.insert(pos);
    }

    pub fn del_out(&mut self, pos: Position) {
        self.out.remove(&pos);
    }

    pub fn add_in(&mut self, pos: Position) {
        self.r#in.insert(pos);
    }

    pub fn del_in(&mut self, pos: Position) {
        self.r#in.remove(&pos);
    }

    /// Replace the full out-edge set in one shot, used by `Sheet::set_cell`
    /// once a proposed edit has passed the cycle check (§4.4).
    pub fn replace_out_edges(&mut self, edges: impl IntoIterator<Item = Position>) {
        self.out = edges.into_iter().collect();
    }

    /// Clear the memo. No-op for non-formula cells (§4.3).
    pub fn invalidate_cache(&self) {
        if matches!(self.kind, CellKind::Formula(_)) {
            *self.cache.borrow_mut() = None;
        }
    }
}

fn text_value(s: &str) -> CellValue {
    if let Some(rest) = s.strip_prefix('\'') {
        CellValue::Text(rest.to_string())
    } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        match s.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(s.to_string()),
        }
    } else {
        CellValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyLookup;
    impl CellLookup for EmptyLookup {
        fn lookup(&self, _pos: Position) -> formula::LookupValue {
            formula::LookupValue::Empty
        }
    }

    #[test]
    fn starts_empty() {
        let cell = Cell::new();
        assert_eq!(cell.text(), "");
        assert_eq!(cell.value(&EmptyLookup), CellValue::Empty);
    }

    #[test]
    fn integer_text_becomes_number_value() {
        let mut cell = Cell::new();
        cell.set("42").unwrap();
        assert_eq!(cell.text(), "42");
        assert_eq!(cell.value(&EmptyLookup), CellValue::Number(42.0));
    }

    #[test]
    fn oversized_digit_text_still_becomes_a_number() {
        let mut cell = Cell::new();
        let digits = "99999999999999999999";
        cell.set(digits).unwrap();
        assert_eq!(cell.text(), digits);
        assert_eq!(
            cell.value(&EmptyLookup),
            CellValue::Number(digits.parse::<f64>().unwrap())
        );
    }

    #[test]
    fn escape_sign_suppresses_numeric_interpretation() {
        let mut cell = Cell::new();
        cell.set("'123").unwrap();
        assert_eq!(cell.text(), "'123");
        assert_eq!(cell.value(&EmptyLookup), CellValue::Text("123".to_string()));
    }

    #[test]
    fn plain_text_is_verbatim() {
        let mut cell = Cell::new();
        cell.set("hello").unwrap();
        assert_eq!(cell.value(&EmptyLookup), CellValue::Text("hello".to_string()));
    }

    #[test]
    fn formula_round_trips_canonical_text() {
        let mut cell = Cell::new();
        cell.set("=1+2").unwrap();
        assert_eq!(cell.text(), "=1 + 2");
        assert_eq!(cell.value(&EmptyLookup), CellValue::Number(3.0));
    }

    #[test]
    fn failed_parse_leaves_kind_untouched() {
        let mut cell = Cell::new();
        cell.set("7").unwrap();
        assert!(cell.set("=1+*2").is_err());
        assert_eq!(cell.text(), "7");
    }

    #[test]
    fn invalidate_cache_is_noop_for_non_formula() {
        let mut cell = Cell::new();
        cell.set("5").unwrap();
        cell.invalidate_cache();
        assert_eq!(cell.value(&EmptyLookup), CellValue::Number(5.0));
    }

    #[test]
    fn single_equals_sign_is_text() {
        let mut cell = Cell::new();
        cell.set("=").unwrap();
        assert_eq!(cell.value(&EmptyLookup), CellValue::Text("=".to_string()));
    }
}
