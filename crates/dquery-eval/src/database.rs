//! Database functions (D-functions)
//!
//! D-functions aggregate one field of a database (range with header row)
//! over the records that match a criteria range.
//!
//! Implementations:
//! - DSUM / DAVERAGE / DCOUNT / DMAX / DMIN / DPRODUCT
//! - DSTDEV / DSTDEVP / DVAR / DVARP
//! - DCOUNTA (non-blank values) and DGET (the single matching value)
//!
//! Every one of them is a [`DatabaseFunction`] parameterized by a
//! [`DAggregate`]; there is no per-function code path.
//!
//! Field argument:
//! - String matching a column header (case-insensitive)
//! - Number representing 1-based column index

use crate::aggregate::Aggregator;
use crate::coercion::projected_number;
use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::field::FieldSelector;
use crate::function::{FnCaps, Function};
use crate::matcher;
use dquery_common::{ExcelError, LiteralValue, Table};
use rayon::prelude::*;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a database function does with the projected field values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DAggregate {
    /// Reduce the numeric values with an aggregator.
    Numeric(Aggregator),
    /// Count the non-blank values.
    CountA,
    /// Return the value of the one matching record.
    Get,
}

/// The spreadsheet D-function family, by name.
pub const BUILTINS: &[(&str, DAggregate)] = &[
    ("DSUM", DAggregate::Numeric(Aggregator::Sum)),
    ("DAVERAGE", DAggregate::Numeric(Aggregator::Average)),
    ("DCOUNT", DAggregate::Numeric(Aggregator::Count)),
    ("DMAX", DAggregate::Numeric(Aggregator::Max)),
    ("DMIN", DAggregate::Numeric(Aggregator::Min)),
    ("DPRODUCT", DAggregate::Numeric(Aggregator::Product)),
    ("DSTDEV", DAggregate::Numeric(Aggregator::StdDev)),
    ("DSTDEVP", DAggregate::Numeric(Aggregator::StdDevP)),
    ("DVAR", DAggregate::Numeric(Aggregator::Var)),
    ("DVARP", DAggregate::Numeric(Aggregator::VarP)),
    ("DCOUNTA", DAggregate::CountA),
    ("DGET", DAggregate::Get),
];

/// One independent evaluation for [`DatabaseFunction::evaluate_batch`].
#[derive(Debug, Clone)]
pub struct DatabaseQuery<'a> {
    pub database: &'a Table,
    pub field: FieldSelector,
    pub criteria: &'a Table,
}

/// The cells of column `col` for the given data rows, in row order.
pub fn project<'t>(
    database: &'t Table,
    rows: &'t [usize],
    col: usize,
) -> impl Iterator<Item = &'t LiteralValue> + 't {
    let data = database.data_rows();
    rows.iter().map(move |&r| &data[r][col])
}

/// A generic D-function: select records, project a field, aggregate.
///
/// ```
/// use dquery_common::{LiteralValue, Table};
/// use dquery_eval::{DatabaseFunction, FieldSelector};
///
/// let db = Table::new(vec![
///     vec!["Tree".into(), "Height".into()],
///     vec!["Apple".into(), 18.into()],
///     vec!["Pear".into(), 12.into()],
///     vec!["Apple".into(), 14.into()],
/// ]).unwrap();
/// let criteria = Table::from_rows([["Tree"], ["Apple"]]).unwrap();
///
/// let dsum = DatabaseFunction::builtin("DSUM").unwrap();
/// let total = dsum.evaluate(&db, &FieldSelector::from("Height"), &criteria).unwrap();
/// assert_eq!(total, LiteralValue::Number(32.0));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseFunction {
    name: &'static str,
    aggregate: DAggregate,
    config: DatabaseConfig,
}

impl DatabaseFunction {
    pub fn new(name: &'static str, aggregate: DAggregate) -> Self {
        Self {
            name,
            aggregate,
            config: DatabaseConfig::default(),
        }
    }

    /// One of the [`BUILTINS`], looked up case-insensitively.
    pub fn builtin(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, agg)| Self::new(n, *agg))
    }

    pub fn with_config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn aggregate(&self) -> DAggregate {
        self.aggregate
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Evaluate against already-resolved arguments.
    ///
    /// The field is resolved before the criteria are looked at, so an
    /// unknown field fails the same way whatever the criteria hold.
    pub fn evaluate(
        &self,
        database: &Table,
        field: &FieldSelector,
        criteria: &Table,
    ) -> Result<LiteralValue, DatabaseError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("dfunction", name = self.name).entered();

        if let Some(dup) = database.duplicate_header() {
            return Err(DatabaseError::DuplicateField {
                field: dup.to_string(),
            });
        }
        let col = field.resolve(database)?;
        let rows = matcher::select_with(database, criteria, &self.config)?;
        let cells = project(database, &rows, col);

        match self.aggregate {
            DAggregate::Numeric(agg) => {
                let mut values = Vec::with_capacity(rows.len());
                for cell in cells {
                    if let LiteralValue::Error(e) = cell
                        && self.config.propagate_cell_errors
                    {
                        return Ok(LiteralValue::Error(e.clone()));
                    }
                    if let Some(n) = projected_number(cell, &self.config) {
                        values.push(n);
                    }
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(matched = rows.len(), numeric = values.len(), "projected");
                agg.apply(&values).map(LiteralValue::Number)
            }
            DAggregate::CountA => {
                let mut count = 0usize;
                for cell in cells {
                    if let LiteralValue::Error(e) = cell
                        && self.config.propagate_cell_errors
                    {
                        return Ok(LiteralValue::Error(e.clone()));
                    }
                    if !cell.is_blank() {
                        count += 1;
                    }
                }
                Ok(LiteralValue::Number(count as f64))
            }
            DAggregate::Get => {
                let mut cells = cells;
                match (cells.next(), rows.len()) {
                    (Some(only), 1) => Ok(only.clone()),
                    (None, _) => Err(DatabaseError::NoMatch),
                    (Some(_), count) => Err(DatabaseError::MultipleMatches { count }),
                }
            }
        }
    }

    /// Evaluate independent queries, results in input order. Runs on the
    /// rayon pool when `enable_parallel` is set.
    pub fn evaluate_batch(
        &self,
        queries: &[DatabaseQuery<'_>],
    ) -> Vec<Result<LiteralValue, DatabaseError>> {
        let run = |q: &DatabaseQuery<'_>| self.evaluate(q.database, &q.field, q.criteria);
        if self.config.enable_parallel {
            queries.par_iter().map(run).collect()
        } else {
            queries.iter().map(run).collect()
        }
    }
}

impl Function for DatabaseFunction {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    /// `args` = (database array, field, criteria array). An error-valued
    /// argument is returned unchanged.
    fn eval(&self, args: &[LiteralValue]) -> Result<LiteralValue, ExcelError> {
        if let Some(err) = args.iter().find(|a| a.is_error()) {
            return Ok(err.clone());
        }
        let [database, field, criteria] = args else {
            return Err(ExcelError::new_value().with_message(format!(
                "{} expects 3 arguments, got {}",
                self.name,
                args.len()
            )));
        };
        let database = Table::try_from(database).map_err(DatabaseError::from)?;
        let field = FieldSelector::from_value(field)?;
        let criteria = Table::try_from(criteria).map_err(DatabaseError::from)?;
        Ok(self.evaluate(&database, &field, &criteria)?)
    }
}

/// Register every D-function in the global function registry.
pub fn register_builtins() {
    for (name, agg) in BUILTINS {
        crate::function_registry::register(Arc::new(DatabaseFunction::new(name, *agg)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dquery_common::ExcelErrorKind;

    fn make_database() -> Table {
        // Simple database with headers: Name, Age, Salary
        Table::new(vec![
            vec!["Name".into(), "Age".into(), "Salary".into()],
            vec!["Alice".into(), 30.into(), 50000.into()],
            vec!["Bob".into(), 25.into(), 45000.into()],
            vec!["Carol".into(), 35.into(), 60000.into()],
            vec!["Dave".into(), 30.into(), 55000.into()],
        ])
        .unwrap()
    }

    fn make_criteria_all() -> Table {
        // one blank criteria row: no constraint
        Table::new(vec![vec!["Name".into()], vec![LiteralValue::Empty]]).unwrap()
    }

    fn make_criteria_age_30() -> Table {
        Table::new(vec![vec!["Age".into()], vec![30.into()]]).unwrap()
    }

    fn make_criteria_age_gt_25() -> Table {
        Table::from_rows([["Age"], [">25"]]).unwrap()
    }

    fn run(name: &str, field: impl Into<FieldSelector>, criteria: &Table) -> LiteralValue {
        DatabaseFunction::builtin(name)
            .unwrap()
            .evaluate(&make_database(), &field.into(), criteria)
            .unwrap()
    }

    #[test]
    fn dsum_all_salaries() {
        assert_eq!(
            run("DSUM", "Salary", &make_criteria_all()),
            LiteralValue::Number(210000.0)
        );
    }

    #[test]
    fn dsum_age_30() {
        assert_eq!(
            run("DSUM", "Salary", &make_criteria_age_30()),
            LiteralValue::Number(105000.0)
        );
    }

    #[test]
    fn daverage_age_gt_25() {
        assert_eq!(
            run("DAVERAGE", "Salary", &make_criteria_age_gt_25()),
            LiteralValue::Number(55000.0)
        );
    }

    #[test]
    fn dcount_age_30() {
        assert_eq!(
            run("DCOUNT", "Salary", &make_criteria_age_30()),
            LiteralValue::Number(2.0)
        );
    }

    #[test]
    fn dmax_and_dmin_all() {
        assert_eq!(
            run("DMAX", "Salary", &make_criteria_all()),
            LiteralValue::Number(60000.0)
        );
        assert_eq!(
            run("DMIN", "Salary", &make_criteria_all()),
            LiteralValue::Number(45000.0)
        );
    }

    #[test]
    fn dsum_field_by_index() {
        assert_eq!(
            run("DSUM", 3i64, &make_criteria_all()),
            LiteralValue::Number(210000.0)
        );
    }

    #[test]
    fn dstdev_age_30_salaries() {
        // 50000 and 55000: sample stdev = 5000 / sqrt(2)
        let LiteralValue::Number(s) = run("DSTDEV", "Salary", &make_criteria_age_30()) else {
            panic!("expected number");
        };
        assert!((s - 5000.0 / 2f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn dstdev_single_match_is_insufficient() {
        let crit = Table::from_rows([["Name"], ["Bob"]]).unwrap();
        let err = DatabaseFunction::builtin("DSTDEV")
            .unwrap()
            .evaluate(&make_database(), &"Salary".into(), &crit)
            .unwrap_err();
        assert_eq!(
            err,
            DatabaseError::InsufficientSamples {
                required: 2,
                actual: 1
            }
        );
        // population variant accepts one value
        let out = DatabaseFunction::builtin("DSTDEVP")
            .unwrap()
            .evaluate(&make_database(), &"Salary".into(), &crit)
            .unwrap();
        assert_eq!(out, LiteralValue::Number(0.0));
    }

    #[test]
    fn dget_single_multiple_none() {
        let f = DatabaseFunction::builtin("DGET").unwrap();
        let db = make_database();
        let one = Table::from_rows([["Name"], ["Carol"]]).unwrap();
        assert_eq!(
            f.evaluate(&db, &"Age".into(), &one).unwrap(),
            LiteralValue::Number(35.0)
        );
        assert_eq!(
            f.evaluate(&db, &"Salary".into(), &make_criteria_age_30())
                .unwrap_err(),
            DatabaseError::MultipleMatches { count: 2 }
        );
        let none = Table::from_rows([["Name"], ["Zed"]]).unwrap();
        assert_eq!(
            f.evaluate(&db, &"Age".into(), &none).unwrap_err(),
            DatabaseError::NoMatch
        );
    }

    #[test]
    fn dcounta_counts_non_blank_values() {
        let db = Table::new(vec![
            vec!["Tree".into(), "Note".into()],
            vec!["Apple".into(), "ripe".into()],
            vec!["Apple".into(), LiteralValue::Empty],
            vec!["Apple".into(), 4.into()],
            vec!["Apple".into(), "".into()],
            vec!["Pear".into(), "x".into()],
        ])
        .unwrap();
        let crit = Table::from_rows([["Tree"], ["Apple"]]).unwrap();
        let out = DatabaseFunction::builtin("DCOUNTA")
            .unwrap()
            .evaluate(&db, &"Note".into(), &crit)
            .unwrap();
        assert_eq!(out, LiteralValue::Number(2.0));
    }

    #[test]
    fn duplicate_database_header_rejected() {
        let db = Table::from_rows([["Tree", "TREE"], ["a", "b"]]).unwrap();
        let crit = Table::from_rows([["Tree"], ["a"]]).unwrap();
        let err = DatabaseFunction::builtin("DCOUNTA")
            .unwrap()
            .evaluate(&db, &FieldSelector::Offset(1), &crit)
            .unwrap_err();
        assert_eq!(
            err,
            DatabaseError::DuplicateField {
                field: "TREE".into()
            }
        );
    }

    #[test]
    fn error_cells_skipped_or_propagated() {
        let db = Table::new(vec![
            vec!["K".into(), "V".into()],
            vec!["a".into(), 1.into()],
            vec!["a".into(), LiteralValue::Error(ExcelError::new_num())],
            vec!["a".into(), 3.into()],
        ])
        .unwrap();
        let crit = Table::from_rows([["K"], ["a"]]).unwrap();
        let dsum = DatabaseFunction::builtin("DSUM").unwrap();
        assert_eq!(
            dsum.evaluate(&db, &"V".into(), &crit).unwrap(),
            LiteralValue::Number(4.0)
        );
        let strict = dsum.with_config(DatabaseConfig::default().with_propagate_cell_errors(true));
        assert!(matches!(
            strict.evaluate(&db, &"V".into(), &crit).unwrap(),
            LiteralValue::Error(ref e) if *e == "#NUM!"
        ));
    }

    #[test]
    fn lenient_projection_config() {
        let db = Table::new(vec![
            vec!["K".into(), "V".into()],
            vec!["a".into(), 1.into()],
            vec!["a".into(), "2".into()],
            vec!["a".into(), true.into()],
        ])
        .unwrap();
        let crit = Table::from_rows([["K"], ["a"]]).unwrap();
        let dsum = DatabaseFunction::builtin("DSUM").unwrap();
        assert_eq!(
            dsum.evaluate(&db, &"V".into(), &crit).unwrap(),
            LiteralValue::Number(1.0)
        );
        let lenient = dsum.with_config(
            DatabaseConfig::default()
                .with_coerce_numeric_text(true)
                .with_booleans_as_numbers(true),
        );
        assert_eq!(
            lenient.evaluate(&db, &"V".into(), &crit).unwrap(),
            LiteralValue::Number(4.0)
        );
    }

    #[test]
    fn eval_from_array_arguments() {
        let f = DatabaseFunction::builtin("DSUM").unwrap();
        let db = LiteralValue::Array(make_database().into_rows());
        let crit = LiteralValue::Array(make_criteria_age_30().into_rows());
        assert_eq!(
            f.dispatch(&[db.clone(), "Salary".into(), crit.clone()]),
            LiteralValue::Number(105000.0)
        );

        let out = f.dispatch(&[db.clone(), "Bonus".into(), crit.clone()]);
        assert!(matches!(out, LiteralValue::Error(ref e) if *e == "#VALUE!"));

        let out = f.dispatch(&[5.into(), "Salary".into(), crit.clone()]);
        assert!(matches!(out, LiteralValue::Error(ref e) if *e == "#VALUE!"));

        let out = f.dispatch(&[db.clone(), "Salary".into()]);
        assert!(out.is_error());

        let passthrough = LiteralValue::Error(ExcelError::new_div());
        assert_eq!(f.dispatch(&[db, passthrough.clone(), crit]), passthrough);
    }

    #[test]
    fn eval_with_missing_arguments_is_value_error() {
        let f = DatabaseFunction::builtin("DSUM").unwrap();
        let db = LiteralValue::Array(make_database().into_rows());
        for args in [&[][..], &[db.clone()][..], &[db.clone(), "Salary".into()][..]] {
            let err = f.eval(args).unwrap_err();
            assert_eq!(err.kind, ExcelErrorKind::Value);
        }
    }

    #[test]
    fn overflowing_sum_is_num_error() {
        let db = Table::new(vec![
            vec!["K".into(), "V".into()],
            vec!["x".into(), f64::MAX.into()],
            vec!["x".into(), f64::MAX.into()],
        ])
        .unwrap();
        let crit = Table::from_rows([["K"], ["x"]]).unwrap();
        let f = DatabaseFunction::builtin("DSUM").unwrap();
        assert_eq!(
            f.evaluate(&db, &"V".into(), &crit).unwrap_err(),
            DatabaseError::NonFinite
        );
        let out = f.dispatch(&[
            LiteralValue::Array(db.into_rows()),
            "V".into(),
            LiteralValue::Array(crit.into_rows()),
        ]);
        assert!(matches!(out, LiteralValue::Error(ref e) if e.kind == ExcelErrorKind::Num));
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let f = DatabaseFunction::builtin("dstdev").unwrap();
        assert_eq!(f.name(), "DSTDEV");
        assert_eq!(f.aggregate(), DAggregate::Numeric(Aggregator::StdDev));
        assert!(DatabaseFunction::builtin("DMEDIAN").is_none());
    }
}
