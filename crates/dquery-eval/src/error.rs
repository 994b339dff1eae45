use dquery_common::{ExcelError, ExcelErrorKind, TableError};
use thiserror::Error;

/// Failures a database-function evaluation can produce.
///
/// Every failure is local to one evaluation and returned to the caller;
/// nothing here is retried or recovered internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatabaseError {
    /// A field selector or criteria header names no database column.
    #[error("field '{field}' not found in database header")]
    FieldNotFound { field: String },

    /// A numeric field selector is outside `[1, columns]`.
    #[error("field index {index} out of range (1-{columns})")]
    IndexOutOfRange { index: i64, columns: usize },

    /// Fewer numeric values than the aggregator needs.
    #[error("aggregate needs at least {required} numeric value(s), got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// A criteria cell could not be turned into a condition.
    /// `row`/`col` are zero-based within the criteria range.
    #[error("malformed criteria at row {row}, col {col}: {reason}")]
    MalformedCriteria {
        row: usize,
        col: usize,
        reason: String,
    },

    /// The database header names the same field twice.
    #[error("field '{field}' appears more than once in database header")]
    DuplicateField { field: String },

    /// DGET found no matching record.
    #[error("no record matches criteria")]
    NoMatch,

    /// DGET found more than one matching record.
    #[error("{count} records match criteria, expected exactly one")]
    MultipleMatches { count: usize },

    /// The aggregate overflowed to infinity or produced NaN.
    #[error("aggregate result is not a finite number")]
    NonFinite,

    #[error(transparent)]
    Shape(#[from] TableError),
}

impl DatabaseError {
    /// The spreadsheet error code this failure renders as.
    pub fn kind(&self) -> ExcelErrorKind {
        match self {
            DatabaseError::InsufficientSamples { .. } => ExcelErrorKind::Div,
            DatabaseError::MultipleMatches { .. } | DatabaseError::NonFinite => {
                ExcelErrorKind::Num
            }
            DatabaseError::FieldNotFound { .. }
            | DatabaseError::IndexOutOfRange { .. }
            | DatabaseError::MalformedCriteria { .. }
            | DatabaseError::DuplicateField { .. }
            | DatabaseError::NoMatch
            | DatabaseError::Shape(_) => ExcelErrorKind::Value,
        }
    }
}

impl From<DatabaseError> for ExcelError {
    fn from(err: DatabaseError) -> Self {
        let e = ExcelError::new(err.kind()).with_message(err.to_string());
        match err {
            DatabaseError::MalformedCriteria { row, col, .. } => {
                e.with_location(row as u32, col as u32)
            }
            _ => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_to_spreadsheet_codes() {
        let e: ExcelError = DatabaseError::FieldNotFound {
            field: "Yield".into(),
        }
        .into();
        assert_eq!(e, "#VALUE!");
        assert_eq!(
            e.message.as_deref(),
            Some("field 'Yield' not found in database header")
        );

        let e: ExcelError = DatabaseError::InsufficientSamples {
            required: 2,
            actual: 1,
        }
        .into();
        assert_eq!(e, "#DIV/0!");

        let e: ExcelError = DatabaseError::MultipleMatches { count: 3 }.into();
        assert_eq!(e, "#NUM!");

        let e: ExcelError = DatabaseError::NonFinite.into();
        assert_eq!(e, "#NUM!");
    }

    #[test]
    fn malformed_criteria_carries_location() {
        let e: ExcelError = DatabaseError::MalformedCriteria {
            row: 1,
            col: 0,
            reason: "dangling escape".into(),
        }
        .into();
        let loc = e.location.unwrap();
        assert_eq!((loc.row, loc.col), (1, 0));
    }
}
