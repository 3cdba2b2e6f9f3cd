//! The table itself (§4.2 component E): a sparse `Position -> Cell` map
//! plus its tight bounding `Size`, and the edit protocol (`set_cell`,
//! `clear_cell`) that keeps the five invariants in §4.4 holding after
//! every mutation.

use std::collections::HashMap;

use log::{debug, warn};

use crate::cell::Cell;
use crate::error::SheetError;
use crate::formula::{CellLookup, LookupValue};
use crate::graph;
use crate::position::{Position, Size};
use crate::value::CellValue;

/// A spreadsheet: a sparse grid of cells wired into a dependency graph.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    size: Size,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet::default()
    }

    /// The tight bounding rectangle over every materialized cell (§4.1).
    pub fn printable_size(&self) -> Size {
        self.size
    }

    /// The text that would reproduce `pos`'s current content. Empty
    /// string for cells that are absent or unset.
    pub fn get_text(&self, pos: Position) -> Result<String, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self.cells.get(&pos).map(Cell::text).unwrap_or_default())
    }

    /// The cell materialized at `pos`, or `None` if it is absent (§6:
    /// `GetCell(pos) -> Cell | null`). The returned handle exposes
    /// `value`/`text`/`referenced_cells` directly; pass the owning `Sheet`
    /// itself as the `CellLookup` to resolve a formula's value.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self.cells.get(&pos))
    }

    /// `pos`'s current value, resolving any formula against the rest of
    /// the sheet (§6).
    pub fn get_value(&self, pos: Position) -> Result<CellValue, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(match self.cells.get(&pos) {
            Some(cell) => cell.value(self),
            None => CellValue::Empty,
        })
    }

    /// Apply `text` to `pos` (§4.4). On success the dependency graph is
    /// rewired, `Size` is expanded to cover any newly materialized
    /// reference, and every transitive dependent's cache is cleared. On
    /// failure — a malformed formula, or one that would close a cycle —
    /// `pos` is left exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            warn!("rejected edit at out-of-bounds position {pos}");
            return Err(SheetError::InvalidPosition);
        }

        let existed_before = self.cells.contains_key(&pos);
        let prev_text = self.get_text(pos).unwrap_or_default();
        let old_out: Vec<Position> = self
            .cells
            .get(&pos)
            .map(|c| c.out_edges().iter().copied().collect())
            .unwrap_or_default();

        let cell = self.cells.entry(pos).or_insert_with(Cell::new);
        if let Err(err) = cell.set(text) {
            if !existed_before {
                self.cells.remove(&pos);
            }
            warn!("rejected edit at {pos}: {err}");
            return Err(err);
        }

        let new_refs: Vec<Position> = self.cells[&pos].referenced_cells().to_vec();

        if graph::would_cycle(pos, &new_refs, |p| self.out_edges_of(p)) {
            let cell = self.cells.get_mut(&pos).expect("just inserted above");
            cell.set(&prev_text)
                .expect("previously accepted text must re-parse");
            if !existed_before {
                self.cells.remove(&pos);
            }
            warn!("rejected edit at {pos}: would introduce a circular dependency");
            return Err(SheetError::CircularDependency { at: pos });
        }

        for old in &old_out {
            if !new_refs.contains(old) {
                if let Some(target) = self.cells.get_mut(old) {
                    target.del_in(pos);
                }
            }
        }
        for new in &new_refs {
            if !old_out.contains(new) {
                let target = self.cells.entry(*new).or_insert_with(Cell::new);
                target.add_in(pos);
            }
        }
        self.cells
            .get_mut(&pos)
            .expect("just inserted above")
            .replace_out_edges(new_refs.iter().copied());

        self.size.expand_to_include(pos);
        for new in &new_refs {
            self.size.expand_to_include(*new);
        }

        self.invalidate_dependents(pos);
        debug!("set {pos} = {text:?}");
        Ok(())
    }

    /// Reset `pos` to empty (§4.7). If other cells still reference it,
    /// it is retained as an `Empty` cell so invariant 2 (referenced
    /// positions are materialized) keeps holding; otherwise it is
    /// dropped from the map entirely and `Size` is recomputed.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        let Some(cell) = self.cells.get_mut(&pos) else {
            return Ok(());
        };

        let old_out: Vec<Position> = cell.out_edges().iter().copied().collect();
        cell.set("").expect("empty text never fails to parse");
        cell.replace_out_edges(std::iter::empty());

        for old in &old_out {
            if let Some(target) = self.cells.get_mut(old) {
                target.del_in(pos);
            }
        }

        let still_depended_on = self
            .cells
            .get(&pos)
            .map(|c| !c.in_edges().is_empty())
            .unwrap_or(false);

        if still_depended_on {
            debug!("cleared {pos}, retained as empty (still referenced)");
        } else {
            self.cells.remove(&pos);
            self.rescan_size();
            debug!("cleared {pos}, removed (no longer referenced)");
        }

        self.invalidate_dependents(pos);
        Ok(())
    }

    fn invalidate_dependents(&mut self, pos: Position) {
        let dependents = graph::dependents_of(pos, |p| self.in_edges_of(p));
        for dep in dependents {
            if let Some(cell) = self.cells.get(&dep) {
                cell.invalidate_cache();
            }
        }
    }

    fn out_edges_of(&self, pos: Position) -> Vec<Position> {
        self.cells
            .get(&pos)
            .map(|c| c.out_edges().iter().copied().collect())
            .unwrap_or_default()
    }

    fn in_edges_of(&self, pos: Position) -> Vec<Position> {
        self.cells
            .get(&pos)
            .map(|c| c.in_edges().iter().copied().collect())
            .unwrap_or_default()
    }

    fn rescan_size(&mut self) {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.expand_to_include(*pos);
        }
        self.size = size;
    }

    /// Tab-separated values, one row per line, row-major over
    /// `printable_size` (§4.9). Empty string if the sheet is empty.
    pub fn print_values(&self) -> String {
        self.render(|cell| cell.value(self).to_string())
    }

    /// Tab-separated raw cell text, same layout as `print_values`.
    pub fn print_texts(&self) -> String {
        self.render(Cell::text)
    }

    fn render(&self, render_cell: impl Fn(&Cell) -> String) -> String {
        if self.size.rows == 0 || self.size.cols == 0 {
            return String::new();
        }
        let mut out = String::new();
        for row in 0..self.size.rows {
            for col in 0..self.size.cols {
                if col > 0 {
                    out.push('\t');
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    out.push_str(&render_cell(cell));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl CellLookup for Sheet {
    fn lookup(&self, pos: Position) -> LookupValue {
        match self.cells.get(&pos) {
            None => LookupValue::Empty,
            Some(cell) => match cell.value(self) {
                CellValue::Empty => LookupValue::Empty,
                CellValue::Text(s) => LookupValue::Text(s),
                CellValue::Number(n) => LookupValue::Number(n),
                CellValue::Error(e) => LookupValue::Error(e),
            },
        }
    }
}

/// Construct a fresh, empty sheet (§6).
pub fn new_sheet() -> Sheet {
    Sheet::new()
}
