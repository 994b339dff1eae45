//! Criteria cell parsing and per-cell matching.
//!
//! A criteria cell is either a plain value (number, boolean) or text with an
//! optional leading operator: `=`, `<>`, `<`, `<=`, `>`, `>=`. Without an
//! operator the comparison is `=`. Text comparands may use `*` (any run of
//! characters) and `?` (any single character); `~` escapes the next
//! character so `~*` matches a literal star.

use crate::coercion::parse_number_text;
use crate::config::DatabaseConfig;
use dquery_common::{ExcelError, LiteralValue};
use smallvec::SmallVec;
use thiserror::Error;

/// Why a criteria cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaParseError {
    #[error("pattern '{0}' ends with a dangling '~' escape")]
    DanglingEscape(String),
    #[error("criteria cell holds an error value {0}")]
    ErrorValue(ExcelError),
    #[error("criteria cell must be a scalar")]
    NotScalar,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl OrderOp {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            OrderOp::Lt => lhs < rhs,
            OrderOp::Le => lhs <= rhs,
            OrderOp::Gt => lhs > rhs,
            OrderOp::Ge => lhs >= rhs,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token {
    AnySeq,
    AnyChar,
    Lit(char),
}

/// A lower-cased text comparand, compiled for wildcard matching.
#[derive(Clone, Debug, PartialEq)]
pub struct TextPattern {
    tokens: SmallVec<[Token; 16]>,
    wildcard: bool,
}

impl TextPattern {
    /// Compile `pattern`. With `wildcards` off every character is literal.
    pub fn compile(pattern: &str, wildcards: bool) -> Result<Self, CriteriaParseError> {
        let lowered = pattern.to_lowercase();
        let mut tokens = SmallVec::new();
        let mut wildcard = false;
        let mut chars = lowered.chars();
        while let Some(c) = chars.next() {
            match c {
                '~' if wildcards => match chars.next() {
                    Some(escaped) => tokens.push(Token::Lit(escaped)),
                    None => return Err(CriteriaParseError::DanglingEscape(pattern.to_string())),
                },
                '*' if wildcards => {
                    wildcard = true;
                    if tokens.last() != Some(&Token::AnySeq) {
                        tokens.push(Token::AnySeq);
                    }
                }
                '?' if wildcards => {
                    wildcard = true;
                    tokens.push(Token::AnyChar);
                }
                c => tokens.push(Token::Lit(c)),
            }
        }
        Ok(Self { tokens, wildcard })
    }

    /// Turn an exact pattern into a starts-with pattern.
    fn into_prefix(mut self) -> Self {
        if self.tokens.last() != Some(&Token::AnySeq) {
            self.tokens.push(Token::AnySeq);
        }
        self.wildcard = true;
        self
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Case-insensitive match of the whole of `text`.
    pub fn matches(&self, text: &str) -> bool {
        let text: SmallVec<[char; 32]> = text.to_lowercase().chars().collect();
        let tokens = &self.tokens[..];
        let (mut ti, mut si) = (0usize, 0usize);
        // (token index after the last '*', text index that '*' has consumed up to)
        let mut star: Option<(usize, usize)> = None;
        while si < text.len() {
            match tokens.get(ti) {
                Some(Token::AnyChar) => {
                    ti += 1;
                    si += 1;
                }
                Some(Token::Lit(c)) if *c == text[si] => {
                    ti += 1;
                    si += 1;
                }
                Some(Token::AnySeq) => {
                    ti += 1;
                    star = Some((ti, si));
                }
                _ => match star {
                    Some((after, consumed)) => {
                        ti = after;
                        si = consumed + 1;
                        star = Some((after, consumed + 1));
                    }
                    None => return false,
                },
            }
        }
        tokens[ti..].iter().all(|t| *t == Token::AnySeq)
    }
}

/// Right-hand side of a condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Comparand {
    Number(f64),
    Boolean(bool),
    Text(TextPattern),
}

impl Comparand {
    fn equals(&self, cell: &LiteralValue) -> bool {
        match (self, cell) {
            (Comparand::Number(n), LiteralValue::Number(c)) => approx_eq(*n, *c),
            (Comparand::Boolean(b), LiteralValue::Boolean(c)) => b == c,
            (Comparand::Text(p), LiteralValue::Text(s)) => p.matches(s),
            _ => false,
        }
    }
}

/// One condition derived from one criteria cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CriteriaPredicate {
    Eq(Comparand),
    Ne(Comparand),
    /// Holds only when both sides are numeric.
    Order(OrderOp, Comparand),
    /// `=` with nothing after it.
    IsBlank,
    /// `<>` with nothing after it.
    NotBlank,
}

fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

fn split_operator(s: &str) -> (Option<&'static str>, &str) {
    for op in [">=", "<=", "<>", "=", ">", "<"] {
        if let Some(rest) = s.strip_prefix(op) {
            return (Some(op), rest);
        }
    }
    (None, s)
}

fn parse_comparand(text: &str, prefix: bool) -> Result<Comparand, CriteriaParseError> {
    if let Some(n) = parse_number_text(text) {
        return Ok(Comparand::Number(n));
    }
    if text.eq_ignore_ascii_case("true") {
        return Ok(Comparand::Boolean(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(Comparand::Boolean(false));
    }
    let pattern = TextPattern::compile(text, true)?;
    Ok(Comparand::Text(if prefix && !pattern.has_wildcard() {
        pattern.into_prefix()
    } else {
        pattern
    }))
}

/// Parse one non-blank criteria cell into a condition.
pub fn parse_criteria(
    value: &LiteralValue,
    config: &DatabaseConfig,
) -> Result<CriteriaPredicate, CriteriaParseError> {
    match value {
        LiteralValue::Number(n) => Ok(CriteriaPredicate::Eq(Comparand::Number(*n))),
        LiteralValue::Boolean(b) => Ok(CriteriaPredicate::Eq(Comparand::Boolean(*b))),
        LiteralValue::Empty => Ok(CriteriaPredicate::IsBlank),
        LiteralValue::Error(e) => Err(CriteriaParseError::ErrorValue(e.clone())),
        LiteralValue::Array(_) => Err(CriteriaParseError::NotScalar),
        LiteralValue::Text(s) => {
            let (op, rest) = split_operator(s);
            match op {
                None => Ok(CriteriaPredicate::Eq(parse_comparand(
                    rest,
                    config.bare_text_prefix,
                )?)),
                Some("=") if rest.is_empty() => Ok(CriteriaPredicate::IsBlank),
                Some("<>") if rest.is_empty() => Ok(CriteriaPredicate::NotBlank),
                Some("=") => Ok(CriteriaPredicate::Eq(parse_comparand(rest, false)?)),
                Some("<>") => Ok(CriteriaPredicate::Ne(parse_comparand(rest, false)?)),
                Some(op) => {
                    let order = match op {
                        "<" => OrderOp::Lt,
                        "<=" => OrderOp::Le,
                        ">" => OrderOp::Gt,
                        _ => OrderOp::Ge,
                    };
                    Ok(CriteriaPredicate::Order(order, parse_comparand(rest, false)?))
                }
            }
        }
    }
}

/// Whether a database cell satisfies a condition. Error cells satisfy none.
pub fn criteria_match(pred: &CriteriaPredicate, cell: &LiteralValue) -> bool {
    if cell.is_error() {
        return false;
    }
    match pred {
        CriteriaPredicate::Eq(c) => c.equals(cell),
        CriteriaPredicate::Ne(c) => !c.equals(cell),
        CriteriaPredicate::Order(op, Comparand::Number(rhs)) => match cell {
            LiteralValue::Number(lhs) => op.holds(*lhs, *rhs),
            _ => false,
        },
        CriteriaPredicate::Order(..) => false,
        CriteriaPredicate::IsBlank => cell.is_blank(),
        CriteriaPredicate::NotBlank => !cell.is_blank(),
    }
}
