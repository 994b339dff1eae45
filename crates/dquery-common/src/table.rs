use std::{error::Error, fmt};

use crate::LiteralValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised when a block of values cannot be used as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// No rows at all; a table needs at least its header row.
    MissingHeader,
    /// A row's length differs from the header's.
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The value handed in was a scalar rather than an array.
    NotAnArray,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::MissingHeader => write!(f, "table must contain a header row"),
            TableError::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} cells but the header has {expected}"
            ),
            TableError::NotAnArray => write!(f, "expected a range or array"),
        }
    }
}

impl Error for TableError {}

/// A rectangular block of values whose first row is a header.
///
/// Used both as a database range and as a criteria range. Tables are
/// read-only once built. Serialized as its rows; deserializing goes through
/// [`Table::new`], so the shape checks still apply.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Vec<LiteralValue>>", into = "Vec<Vec<LiteralValue>>")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    rows: Vec<Vec<LiteralValue>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<LiteralValue>>) -> Result<Self, TableError> {
        let width = rows.first().ok_or(TableError::MissingHeader)?.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TableError::Ragged {
                row,
                expected: width,
                found: r.len(),
            });
        }
        Ok(Self { rows })
    }

    /// Build a table from anything convertible to cell values.
    ///
    /// ```
    /// use dquery_common::Table;
    /// let t = Table::from_rows(vec![vec!["Tree", "Height"], vec!["Apple", "18"]]).unwrap();
    /// assert_eq!(t.dims(), (2, 2));
    /// ```
    pub fn from_rows<R, V>(rows: R) -> Result<Self, TableError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<LiteralValue>,
    {
        Self::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// (rows, cols), header included.
    pub fn dims(&self) -> (usize, usize) {
        (self.rows.len(), self.header().len())
    }

    pub fn header(&self) -> &[LiteralValue] {
        &self.rows[0]
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<LiteralValue>] {
        &self.rows[1..]
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len() - 1
    }

    /// Zero-based position of the header matching `name`, case-insensitively.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.header()
            .iter()
            .position(|h| h.header_key().as_deref() == Some(needle.as_str()))
    }

    /// First header name that appears more than once (case-insensitive).
    pub fn duplicate_header(&self) -> Option<&LiteralValue> {
        let mut seen = std::collections::HashSet::new();
        self.header().iter().find(|h| match h.header_key() {
            Some(k) => !seen.insert(k),
            None => false,
        })
    }

    pub fn into_rows(self) -> Vec<Vec<LiteralValue>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<LiteralValue>>> for Table {
    type Error = TableError;

    fn try_from(rows: Vec<Vec<LiteralValue>>) -> Result<Self, Self::Error> {
        Table::new(rows)
    }
}

impl From<Table> for Vec<Vec<LiteralValue>> {
    fn from(table: Table) -> Self {
        table.rows
    }
}

impl TryFrom<LiteralValue> for Table {
    type Error = TableError;

    fn try_from(value: LiteralValue) -> Result<Self, Self::Error> {
        match value {
            LiteralValue::Array(rows) => Table::new(rows),
            _ => Err(TableError::NotAnArray),
        }
    }
}

impl TryFrom<&LiteralValue> for Table {
    type Error = TableError;

    fn try_from(value: &LiteralValue) -> Result<Self, Self::Error> {
        match value {
            LiteralValue::Array(rows) => Table::new(rows.clone()),
            _ => Err(TableError::NotAnArray),
        }
    }
}
