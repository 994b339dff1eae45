//! Row selection: which database records satisfy a criteria range.
//!
//! Criteria structure:
//! - First row names database fields (case-insensitive, any subset, any order)
//! - Each following row is one AND-group of conditions
//! - A record is selected when it satisfies at least one group (OR)
//! - A blank criteria cell places no constraint on its field

use crate::config::DatabaseConfig;
use crate::criteria::{CriteriaPredicate, criteria_match, parse_criteria};
use crate::error::DatabaseError;
use dquery_common::{LiteralValue, Table};
use smallvec::SmallVec;

/// Conditions of one criteria row, keyed by database column.
pub type CriteriaRow = SmallVec<[(usize, CriteriaPredicate); 4]>;

/// Map each criteria header cell to a database column.
/// Blank header cells map to `None` and their column is ignored.
fn map_criteria_header(
    database: &Table,
    criteria: &Table,
) -> Result<Vec<Option<usize>>, DatabaseError> {
    criteria
        .header()
        .iter()
        .map(|h| {
            if h.is_blank() {
                return Ok(None);
            }
            let found = h.header_key().and_then(|key| {
                database
                    .header()
                    .iter()
                    .position(|d| d.header_key().as_deref() == Some(key.as_str()))
            });
            match found {
                Some(col) => Ok(Some(col)),
                None => Err(DatabaseError::FieldNotFound {
                    field: h.to_string(),
                }),
            }
        })
        .collect()
}

/// Parse every criteria row into its conditions.
///
/// The returned list has one entry per non-header criteria row; an entry
/// with no conditions matches every record.
pub fn parse_criteria_rows(
    database: &Table,
    criteria: &Table,
    config: &DatabaseConfig,
) -> Result<Vec<CriteriaRow>, DatabaseError> {
    let col_map = map_criteria_header(database, criteria)?;

    let mut rows = Vec::with_capacity(criteria.data_row_count());
    for (r, crit_row) in criteria.data_rows().iter().enumerate() {
        let mut conditions = CriteriaRow::new();
        for (c, (cell, db_col)) in crit_row.iter().zip(&col_map).enumerate() {
            let Some(db_col) = db_col else { continue };
            if cell.is_blank() {
                continue;
            }
            let pred =
                parse_criteria(cell, config).map_err(|e| DatabaseError::MalformedCriteria {
                    row: r + 1,
                    col: c,
                    reason: e.to_string(),
                })?;
            conditions.push((*db_col, pred));
        }
        rows.push(conditions);
    }
    Ok(rows)
}

/// Whether a record satisfies any criteria row (OR of ANDs).
pub fn row_matches_criteria(record: &[LiteralValue], criteria_rows: &[CriteriaRow]) -> bool {
    criteria_rows.iter().any(|conditions| {
        conditions
            .iter()
            .all(|(col, pred)| criteria_match(pred, &record[*col]))
    })
}

/// Indices (into `database.data_rows()`) of the records selected by
/// `criteria`, ascending and without duplicates.
///
/// A criteria range with only a header row selects nothing.
pub fn select(database: &Table, criteria: &Table) -> Result<Vec<usize>, DatabaseError> {
    select_with(database, criteria, &DatabaseConfig::default())
}

pub fn select_with(
    database: &Table,
    criteria: &Table,
    config: &DatabaseConfig,
) -> Result<Vec<usize>, DatabaseError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "select",
        records = database.data_row_count(),
        criteria_rows = criteria.data_row_count()
    )
    .entered();

    let criteria_rows = parse_criteria_rows(database, criteria, config)?;

    let selected: Vec<usize> = database
        .data_rows()
        .iter()
        .enumerate()
        .filter(|(_, record)| row_matches_criteria(record, &criteria_rows))
        .map(|(i, _)| i)
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(selected = selected.len(), "criteria applied");

    Ok(selected)
}
