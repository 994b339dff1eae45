//! Spreadsheet database functions.
//!
//! Filter the records of a database range with a criteria range, project
//! one field, and aggregate it. `DSTDEV`, `DSUM` and the rest of the family
//! are all the same [`DatabaseFunction`] with a different [`DAggregate`].

pub mod aggregate;
pub mod coercion;
pub mod config;
pub mod criteria;
pub mod database;
pub mod error;
pub mod field;
pub mod function;
pub mod function_registry;
pub mod matcher;

#[cfg(feature = "tracing")]
pub mod telemetry;

pub use aggregate::Aggregator;
pub use config::DatabaseConfig;
pub use database::{DAggregate, DatabaseFunction, DatabaseQuery, register_builtins};
pub use error::DatabaseError;
pub use field::FieldSelector;
pub use function::{FnCaps, Function};
pub use matcher::{select, select_with};
