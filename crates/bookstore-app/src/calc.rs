//! Tiny arithmetic evaluator for price adjustment expressions.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unsupported operator: {0}")]
pub struct UnsupportedOperator(pub char);

pub fn apply(first: i64, second: i64, operator: char) -> Result<i64, UnsupportedOperator> {
    match operator {
        '+' => Ok(first + second),
        '-' => Ok(first - second),
        '*' => Ok(first * second),
        other => Err(UnsupportedOperator(other)),
    }
}
