//! Error taxonomy (§7): engine-level failures surfaced to the caller of a
//! `Sheet` operation, and cell-level `FormulaError`s stored as a formula's
//! value and never propagated past `Cell::get_value`.

use thiserror::Error;

use crate::position::Position;

/// Failures an engine-level operation (`SetCell`, `GetCell`, `ClearCell`)
/// can report to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("position out of bounds")]
    InvalidPosition,

    #[error("could not parse formula: {0}")]
    FormulaParse(String),

    #[error("circular dependency introduced at {at}")]
    CircularDependency { at: Position },
}

/// A failure produced *inside* formula evaluation. Never raised to the
/// caller — it is captured by the formula's cache and returned from
/// `GetValue`, and printed via its `Display` impl (§6).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    #[error("#REF!")]
    Ref,
    #[error("#VALUE!")]
    Value,
    #[error("#DIV/0!")]
    Div0,
}
