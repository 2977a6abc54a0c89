use thiserror::Error;

/// Errors reported while a query is being constructed.
///
/// Every invariant is checked when the offending node is built, as close to
/// the buggy call site as possible; rendering itself never fails.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// The operator string is neither whitelisted nor safely symbolic.
    #[error("invalid operator: {0:?}")]
    InvalidOperator(String),

    /// The UUID literal is not 8-4-4-4-12 hexadecimal digits.
    #[error("invalid uuid literal: {0:?}")]
    InvalidUuid(String),

    /// `DISTINCT` or `ORDER BY` was attached to an argumentless aggregate.
    #[error("aggregate {0:?} has no arguments and accepts neither DISTINCT nor ORDER BY")]
    InvalidAggregateConfiguration(String),

    /// `FETCH` was requested without an `OFFSET` clause.
    #[error("FETCH requires an explicit OFFSET clause")]
    MissingOffsetForFetch,

    /// A scalar subquery must select exactly one column.
    #[error("scalar subquery must select exactly one column, found {0}")]
    ScalarArity(usize),

    /// Two windows with the same name were declared in one query.
    #[error("duplicate window name: {0:?}")]
    DuplicateWindowName(String),
}
