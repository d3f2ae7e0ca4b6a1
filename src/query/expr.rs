use super::{QueryOp, Value};
use crate::error::{AslError, Result};
use std::str::FromStr;

/// Operator spellings, longest first so `>=` wins over `>`
const OPERATORS: [(&str, u32); 10] = [
    ("!=", QueryOp::NOT_EQUAL.bits()),
    (">=", QueryOp::GREATER_EQUAL.bits()),
    ("<=", QueryOp::LESS_EQUAL.bits()),
    ("^=", QueryOp::EQUAL.bits() | QueryOp::PREFIX.bits()),
    ("$=", QueryOp::EQUAL.bits() | QueryOp::SUFFIX.bits()),
    ("*=", QueryOp::EQUAL.bits() | QueryOp::SUBSTRING.bits()),
    ("=", QueryOp::EQUAL.bits()),
    (">", QueryOp::GREATER.bits()),
    ("<", QueryOp::LESS.bits()),
    ("~", QueryOp::REGEX.bits()),
];

const OPERATOR_CHARS: &[char] = &['!', '=', '<', '>', '^', '$', '*', '~'];

/// A predicate written as text.
///
/// Forms:
/// - `KEY<op>VALUE` with `=`, `!=`, `>`, `>=`, `<`, `<=`, `~` (regex),
///   `^=` (prefix), `$=` (suffix) or `*=` (substring)
/// - `KEY?` matches records that have `KEY`
/// - `!KEY` matches records without `KEY`
///
/// Values of plain comparisons that parse as integers are compared
/// numerically.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateExpr {
    pub key: String,
    pub value: Value,
    pub op: QueryOp,
}

impl PredicateExpr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>, op: QueryOp) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            op,
        }
    }

    /// Same predicate, compared case-insensitively
    pub fn with_casefold(mut self) -> Self {
        self.op |= QueryOp::CASEFOLD;
        self
    }
}

fn check_key(key: &str, expr: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AslError::InvalidPredicate(format!("missing key in '{}'", expr)));
    }
    if key.contains(OPERATOR_CHARS) {
        return Err(AslError::InvalidPredicate(format!(
            "unexpected operator in key of '{}'",
            expr
        )));
    }
    Ok(())
}

impl FromStr for PredicateExpr {
    type Err = AslError;

    fn from_str(s: &str) -> Result<Self> {
        let expr = s.trim();

        if let Some(key) = expr.strip_prefix('!').filter(|rest| !rest.contains(OPERATOR_CHARS)) {
            check_key(key, expr)?;
            return Ok(Self::new(key, Value::Absent, QueryOp::NOT_EQUAL));
        }

        if let Some(key) = expr.strip_suffix('?') {
            if !key.contains(OPERATOR_CHARS) {
                check_key(key, expr)?;
                return Ok(Self::new(key, Value::Absent, QueryOp::TRUE));
            }
        }

        let split = expr.find(OPERATOR_CHARS).ok_or_else(|| {
            AslError::InvalidPredicate(format!("no operator in '{}'", expr))
        })?;
        let (key, rest) = expr.split_at(split);
        check_key(key, expr)?;

        let (spelling, bits) = OPERATORS
            .iter()
            .find(|(spelling, _)| rest.starts_with(spelling))
            .ok_or_else(|| AslError::InvalidPredicate(format!("unknown operator in '{}'", expr)))?;
        let raw = &rest[spelling.len()..];
        let op = QueryOp::from_bits_retain(*bits);

        let is_plain_comparison = !op.contains(QueryOp::REGEX)
            && (op & QueryOp::SUBSTRING) == QueryOp::empty();
        let value = match raw.parse::<i64>() {
            Ok(n) if is_plain_comparison => Value::Integer(n),
            _ => Value::Text(raw.to_string()),
        };

        Ok(Self::new(key, value, op))
    }
}
