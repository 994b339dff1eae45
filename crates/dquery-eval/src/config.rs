#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Knobs for how database functions treat cells that are not plain numbers,
/// and how batches are run.
///
/// The defaults follow desktop-spreadsheet aggregate behaviour: only Number
/// cells feed numeric aggregators and everything else is skipped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Text cells that parse as numbers (`"12"`) feed numeric aggregators.
    pub coerce_numeric_text: bool,
    /// TRUE/FALSE cells feed numeric aggregators as 1/0.
    pub booleans_as_numbers: bool,
    /// An error cell in the projected column becomes the result instead of
    /// being skipped.
    pub propagate_cell_errors: bool,
    /// A bare text criterion (no operator, no wildcard) matches cells that
    /// begin with the text instead of requiring equality.
    pub bare_text_prefix: bool,
    /// Run `evaluate_batch` on the rayon pool.
    pub enable_parallel: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            coerce_numeric_text: false,
            booleans_as_numbers: false,
            propagate_cell_errors: false,
            bare_text_prefix: false,
            enable_parallel: true,
        }
    }
}

impl DatabaseConfig {
    pub fn with_coerce_numeric_text(mut self, on: bool) -> Self {
        self.coerce_numeric_text = on;
        self
    }

    pub fn with_booleans_as_numbers(mut self, on: bool) -> Self {
        self.booleans_as_numbers = on;
        self
    }

    pub fn with_propagate_cell_errors(mut self, on: bool) -> Self {
        self.propagate_cell_errors = on;
        self
    }

    pub fn with_bare_text_prefix(mut self, on: bool) -> Self {
        self.bare_text_prefix = on;
        self
    }

    pub fn with_parallel(mut self, on: bool) -> Self {
        self.enable_parallel = on;
        self
    }
}
