//! Spreadsheet-facing error representation.
//!
//! - **`ExcelErrorKind`** : the error codes a database function can surface
//! - **`ExcelError`**     : a kind plus an optional message and cell location
//!
//! The evaluation core reports typed failures of its own; this is the shape
//! those failures take once they are handed back to a formula evaluator and
//! have to be shown in a cell (`#VALUE!`, `#DIV/0!`, …).

use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::LiteralValue;

/// Recognised spreadsheet error codes.
///
/// **Note:** names are CamelCase while `Display` renders them exactly as a
/// spreadsheet shows them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
        })
    }
}

/// Zero-based row/column of the cell an error was raised for.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorLocation {
    pub row: u32,
    pub col: u32,
}

/// The error value passed around between the core and its caller.
///
/// It combines:
/// * **kind**     – the mandatory spreadsheet error code
/// * **message**  – optional human explanation
/// * **location** – optional cell the error is about
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcelError {
    pub kind: ExcelErrorKind,
    pub message: Option<String>,
    pub location: Option<ErrorLocation>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<ExcelErrorKind> for ExcelError {
    fn from(kind: ExcelErrorKind) -> Self {
        Self {
            kind,
            message: None,
            location: None,
        }
    }
}

impl ExcelError {
    /// Basic constructor (no message, no location).
    pub fn new(kind: ExcelErrorKind) -> Self {
        kind.into()
    }

    pub fn new_value() -> Self {
        Self::new(ExcelErrorKind::Value)
    }

    pub fn new_div() -> Self {
        Self::new(ExcelErrorKind::Div)
    }

    pub fn new_num() -> Self {
        Self::new(ExcelErrorKind::Num)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach row/column coordinates.
    pub fn with_location(mut self, row: u32, col: u32) -> Self {
        self.location = Some(ErrorLocation { row, col });
        self
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for ExcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }

        if let Some(loc) = self.location {
            write!(f, " (row {}, col {})", loc.row, loc.col)?;
        }

        Ok(())
    }
}

impl Error for ExcelError {}

impl From<ExcelError> for LiteralValue {
    fn from(error: ExcelError) -> Self {
        LiteralValue::Error(error)
    }
}

impl PartialEq<str> for ExcelErrorKind {
    fn eq(&self, other: &str) -> bool {
        format!("{self}") == other
    }
}

impl PartialEq<&str> for ExcelError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.to_string() == *other
    }
}
