use crate::error::DatabaseError;
use dquery_common::{LiteralValue, Table};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which database column a D-function aggregates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSelector {
    /// Header text, matched case-insensitively.
    Name(String),
    /// 1-based column position. Signed so out-of-range input survives
    /// until resolution reports it.
    Offset(i64),
}

impl FieldSelector {
    /// Build a selector from the field argument of a D-function call.
    /// Text names a column; a number is a 1-based offset (fraction dropped).
    pub fn from_value(value: &LiteralValue) -> Result<Self, DatabaseError> {
        match value {
            LiteralValue::Text(s) => Ok(FieldSelector::Name(s.clone())),
            LiteralValue::Number(n) => Ok(FieldSelector::Offset(n.trunc() as i64)),
            other => Err(DatabaseError::FieldNotFound {
                field: other.to_string(),
            }),
        }
    }

    /// Zero-based column index within `database`.
    pub fn resolve(&self, database: &Table) -> Result<usize, DatabaseError> {
        match self {
            FieldSelector::Name(name) => {
                database
                    .find_column(name)
                    .ok_or_else(|| DatabaseError::FieldNotFound {
                        field: name.clone(),
                    })
            }
            FieldSelector::Offset(idx) => {
                let columns = database.dims().1;
                if *idx < 1 || *idx as u64 > columns as u64 {
                    return Err(DatabaseError::IndexOutOfRange {
                        index: *idx,
                        columns,
                    });
                }
                Ok((*idx - 1) as usize)
            }
        }
    }
}

impl From<&str> for FieldSelector {
    fn from(name: &str) -> Self {
        FieldSelector::Name(name.to_string())
    }
}

impl From<String> for FieldSelector {
    fn from(name: String) -> Self {
        FieldSelector::Name(name)
    }
}

impl From<i64> for FieldSelector {
    fn from(offset: i64) -> Self {
        FieldSelector::Offset(offset)
    }
}
