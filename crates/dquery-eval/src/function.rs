//! dquery-eval/src/function.rs
// The `Function` trait a formula evaluator dispatches through, and its
// capability flags.

use dquery_common::{ExcelError, ExcelErrorKind, LiteralValue};

bitflags::bitflags! {
    /// Describes the capabilities and properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u8 {
        /// Same output for the same input, no side effects.
        const PURE      = 0b0000_0001;
        /// Output can change with unchanged inputs; re-evaluated on every change.
        const VOLATILE  = 0b0000_0010;
        /// Reduces a range of inputs to a single value.
        const REDUCTION = 0b0000_0100;
    }
}

/// Object-safe interface for spreadsheet functions exposed to an external
/// formula evaluator.
///
/// Arguments arrive already resolved: ranges as `LiteralValue::Array`,
/// everything else as scalars.
pub trait Function: Send + Sync + 'static {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` for variadic functions.
    fn max_args(&self) -> Option<usize> {
        None
    }

    fn volatile(&self) -> bool {
        self.caps().contains(FnCaps::VOLATILE)
    }

    fn eval(&self, args: &[LiteralValue]) -> Result<LiteralValue, ExcelError>;

    /// Check arity, evaluate, and fold any failure into an error value.
    fn dispatch(&self, args: &[LiteralValue]) -> LiteralValue {
        let too_many = self.max_args().is_some_and(|max| args.len() > max);
        if args.len() < self.min_args() || too_many {
            return LiteralValue::Error(ExcelError::new(ExcelErrorKind::Value).with_message(
                format!("{} got {} argument(s)", self.name(), args.len()),
            ));
        }
        match self.eval(args) {
            Ok(v) => v,
            Err(e) => LiteralValue::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Function for Echo {
        fn name(&self) -> &'static str {
            "ECHO"
        }
        fn min_args(&self) -> usize {
            1
        }
        fn max_args(&self) -> Option<usize> {
            Some(1)
        }
        fn eval(&self, args: &[LiteralValue]) -> Result<LiteralValue, ExcelError> {
            match &args[0] {
                LiteralValue::Error(e) => Err(e.clone()),
                v => Ok(v.clone()),
            }
        }
    }

    #[test]
    fn dispatch_checks_arity() {
        let out = Echo.dispatch(&[]);
        assert!(matches!(out, LiteralValue::Error(ref e) if e.kind == ExcelErrorKind::Value));
        let out = Echo.dispatch(&[1.into(), 2.into()]);
        assert!(out.is_error());
    }

    #[test]
    fn dispatch_folds_errors_into_values() {
        assert_eq!(Echo.dispatch(&["x".into()]), LiteralValue::from("x"));
        let out = Echo.dispatch(&[LiteralValue::Error(ExcelError::new_num())]);
        assert!(matches!(out, LiteralValue::Error(ref e) if e.kind == ExcelErrorKind::Num));
    }

    #[test]
    fn default_caps_are_pure() {
        assert_eq!(Echo.caps(), FnCaps::PURE);
        assert!(!Echo.volatile());
    }
}
