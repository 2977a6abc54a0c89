//! Constructors for function, aggregate, ordered-set and window calls.
//!
//! The generic entry points (`func`, `aggregate`, `window_function`, ..)
//! accept any function name; the named helpers below cover the common
//! vocabulary with sharper types.

use pgqb_ast as ast;
use pgqb_core::{Error, Literal};

use crate::aggregate::{
    Aggregate, JsonArrayAggregate, JsonObjectAggregate, OrderedSet, StarAggregate,
};
use crate::expr::{AnyExpr, Expr, IntoExpr};
use crate::types::{
    Array, BaseType, Bool, BoolLike, Float8, Int4, Int8, Json, Nullable, Record, SqlNumber,
    SqlOrd, SqlText, SqlType, Text, TimestampTz, Uuid,
};
use crate::window::WindowFunction;

fn any_asts(args: Vec<AnyExpr>) -> Vec<ast::Expr> {
    args.into_iter().map(AnyExpr::into_ast).collect()
}

/// A generic scalar function call, `name(args..)`.
pub fn func<T: SqlType>(name: &str, args: Vec<AnyExpr>) -> Expr<T> {
    Expr::new(ast::Expr::function(name, any_asts(args)))
}

/// A generic aggregate call, `name(args..)`.
pub fn aggregate<T: SqlType>(name: &str, args: Vec<AnyExpr>) -> Aggregate<T> {
    Aggregate::new(name, any_asts(args))
}

/// A generic argumentless aggregate, `name(*)`.
pub fn aggregate_star<T: SqlType>(name: &str) -> StarAggregate<T> {
    StarAggregate::new(name)
}

/// A generic ordered-set aggregate awaiting `WITHIN GROUP`.
pub fn ordered_set_aggregate<T: SqlType>(name: &str, args: Vec<AnyExpr>) -> OrderedSet<T> {
    OrderedSet::new(name, any_asts(args))
}

/// A generic window function awaiting `OVER`.
pub fn window_function<T: SqlType>(name: &str, args: Vec<AnyExpr>) -> WindowFunction<T> {
    WindowFunction::new(name, ast::AggregateArgs::List(any_asts(args)))
}

/// `count(expr)`
pub fn count<T: SqlType>(expr: Expr<T>) -> Aggregate<Int8> {
    Aggregate::new("count", vec![expr.into_ast()])
}

/// `count(*)`
pub fn count_star() -> StarAggregate<Int8> {
    StarAggregate::new("count")
}

/// `sum(expr)`; null over an empty input.
pub fn sum<T: SqlNumber>(expr: Expr<T>) -> Aggregate<T::Nulled> {
    Aggregate::new("sum", vec![expr.into_ast()])
}

/// `avg(expr)`; null over an empty input.
pub fn avg<T: SqlNumber>(expr: Expr<T>) -> Aggregate<T::Nulled> {
    Aggregate::new("avg", vec![expr.into_ast()])
}

/// `min(expr)`; null over an empty input.
pub fn min<T: SqlOrd>(expr: Expr<T>) -> Aggregate<T::Nulled> {
    Aggregate::new("min", vec![expr.into_ast()])
}

/// `max(expr)`; null over an empty input.
pub fn max<T: SqlOrd>(expr: Expr<T>) -> Aggregate<T::Nulled> {
    Aggregate::new("max", vec![expr.into_ast()])
}

/// `bool_and(expr)`; null over an empty input.
pub fn bool_and<T: BoolLike>(expr: Expr<T>) -> Aggregate<Nullable<Bool>> {
    Aggregate::new("bool_and", vec![expr.into_ast()])
}

/// `bool_or(expr)`; null over an empty input.
pub fn bool_or<T: BoolLike>(expr: Expr<T>) -> Aggregate<Nullable<Bool>> {
    Aggregate::new("bool_or", vec![expr.into_ast()])
}

/// `string_agg(expr, delimiter)`; null over an empty input.
pub fn string_agg<T: SqlText, U: SqlText>(
    expr: Expr<T>,
    delimiter: Expr<U>,
) -> Aggregate<Nullable<Text>> {
    Aggregate::new("string_agg", vec![expr.into_ast(), delimiter.into_ast()])
}

/// `array_agg(expr)`; null over an empty input.
pub fn array_agg<T: SqlType>(expr: Expr<T>) -> Aggregate<Nullable<Array<T>>> {
    Aggregate::new("array_agg", vec![expr.into_ast()])
}

/// `json_object_agg(key : value ..)`
pub fn json_object_agg<K: SqlText, V: SqlType>(
    key: impl IntoExpr<K>,
    value: impl IntoExpr<V>,
) -> JsonObjectAggregate<Json> {
    JsonObjectAggregate::new(key.into_expr().into_ast(), value.into_expr().into_ast())
}

/// `json_array_agg(value ..)`
pub fn json_array_agg<V: SqlType>(value: impl IntoExpr<V>) -> JsonArrayAggregate<Json> {
    JsonArrayAggregate::new(value.into_expr().into_ast())
}

/// `percentile_cont(fraction) WITHIN GROUP (..)`
pub fn percentile_cont(fraction: impl IntoExpr<Float8>) -> OrderedSet<Float8> {
    OrderedSet::new("percentile_cont", vec![fraction.into_expr().into_ast()])
}

/// `percentile_disc(fraction) WITHIN GROUP (..)`
pub fn percentile_disc(fraction: impl IntoExpr<Float8>) -> OrderedSet<Float8> {
    OrderedSet::new("percentile_disc", vec![fraction.into_expr().into_ast()])
}

/// `mode() WITHIN GROUP (..)`; the result type follows the ordering
/// column and is supplied explicitly: `mode::<Int4>()`.
pub fn mode<T: BaseType>() -> OrderedSet<Nullable<T>> {
    OrderedSet::new("mode", Vec::new())
}

/// `row_number() OVER ..`
pub fn row_number() -> WindowFunction<Int8> {
    WindowFunction::new("row_number", ast::AggregateArgs::List(Vec::new()))
}

/// `rank() OVER ..`
pub fn rank() -> WindowFunction<Int8> {
    WindowFunction::new("rank", ast::AggregateArgs::List(Vec::new()))
}

/// `dense_rank() OVER ..`
pub fn dense_rank() -> WindowFunction<Int8> {
    WindowFunction::new("dense_rank", ast::AggregateArgs::List(Vec::new()))
}

/// `ntile(buckets) OVER ..`
pub fn ntile(buckets: impl IntoExpr<Int4>) -> WindowFunction<Int4> {
    WindowFunction::new(
        "ntile",
        ast::AggregateArgs::List(vec![buckets.into_expr().into_ast()]),
    )
}

/// `lag(expr) OVER ..`; nullable, the first row has no predecessor.
pub fn lag<T: SqlType>(expr: Expr<T>) -> WindowFunction<T::Nulled> {
    WindowFunction::new("lag", ast::AggregateArgs::List(vec![expr.into_ast()]))
}

/// `lead(expr) OVER ..`; nullable, the last row has no successor.
pub fn lead<T: SqlType>(expr: Expr<T>) -> WindowFunction<T::Nulled> {
    WindowFunction::new("lead", ast::AggregateArgs::List(vec![expr.into_ast()]))
}

/// `first_value(expr) OVER ..`
pub fn first_value<T: SqlType>(expr: Expr<T>) -> WindowFunction<T::Nulled> {
    WindowFunction::new(
        "first_value",
        ast::AggregateArgs::List(vec![expr.into_ast()]),
    )
}

/// `last_value(expr) OVER ..`
pub fn last_value<T: SqlType>(expr: Expr<T>) -> WindowFunction<T::Nulled> {
    WindowFunction::new(
        "last_value",
        ast::AggregateArgs::List(vec![expr.into_ast()]),
    )
}

/// `lower(expr)`
pub fn lower<T: SqlText>(expr: Expr<T>) -> Expr<Text> {
    Expr::new(ast::Expr::function("lower", vec![expr.into_ast()]))
}

/// `upper(expr)`
pub fn upper<T: SqlText>(expr: Expr<T>) -> Expr<Text> {
    Expr::new(ast::Expr::function("upper", vec![expr.into_ast()]))
}

/// `char_length(expr)`
pub fn char_length<T: SqlText>(expr: Expr<T>) -> Expr<Int4> {
    Expr::new(ast::Expr::function("char_length", vec![expr.into_ast()]))
}

/// `abs(expr)`
pub fn abs<T: SqlNumber>(expr: Expr<T>) -> Expr<T> {
    Expr::new(ast::Expr::function("abs", vec![expr.into_ast()]))
}

/// `coalesce(expr, fallback)`
pub fn coalesce<T: BaseType>(
    expr: Expr<Nullable<T>>,
    fallback: impl IntoExpr<T>,
) -> Expr<T> {
    Expr::new(ast::Expr::function(
        "coalesce",
        vec![expr.into_ast(), fallback.into_expr().into_ast()],
    ))
}

/// `now()`
pub fn now() -> Expr<TimestampTz> {
    Expr::new(ast::Expr::function("now", Vec::new()))
}

/// `ARRAY[..]` over same-typed elements.
pub fn array<T: SqlType>(elements: impl IntoIterator<Item = Expr<T>>) -> Expr<Array<T>> {
    Expr::new(ast::Expr::array(
        elements.into_iter().map(Expr::into_ast).collect(),
    ))
}

/// `ROW(..)` over mixed fields.
pub fn row(fields: Vec<AnyExpr>) -> Expr<Record> {
    Expr::new(ast::Expr::row(any_asts(fields)))
}

/// A `uuid` literal, validated as 8-4-4-4-12 hexadecimal digits.
pub fn uuid(value: &'static str) -> Result<Expr<Uuid>, Error> {
    let ok = {
        let parts: Vec<&str> = value.split('-').collect();
        parts.len() == 5
            && parts
                .iter()
                .zip([8usize, 4, 4, 4, 12])
                .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
    };
    if !ok {
        return Err(Error::InvalidUuid(value.to_owned()));
    }
    Ok(Expr::new(ast::Expr::Literal(Literal::String(
        value.to_owned(),
    ))))
}

/// A `CASE WHEN .. THEN ..` chain under construction.
pub struct CaseWhen<T: SqlType> {
    case: ast::CaseExpr,
    marker: core::marker::PhantomData<fn() -> T>,
}

/// Opens a searched `CASE` with its first arm:
/// `CASE WHEN condition THEN result`.
pub fn case_when<B: BoolLike, T: SqlType>(
    condition: Expr<B>,
    result: impl IntoExpr<T>,
) -> CaseWhen<T> {
    CaseWhen {
        case: ast::CaseExpr {
            operand: None,
            conditions: vec![condition.into_ast()],
            results: vec![result.into_expr().into_ast()],
            else_result: None,
        },
        marker: core::marker::PhantomData,
    }
}

impl<T: SqlType> CaseWhen<T> {
    /// Adds another `WHEN condition THEN result` arm.
    pub fn when<B: BoolLike>(mut self, condition: Expr<B>, result: impl IntoExpr<T>) -> Self {
        self.case.conditions.push(condition.into_ast());
        self.case.results.push(result.into_expr().into_ast());
        self
    }

    /// Closes the chain with `ELSE result END`.
    pub fn otherwise(mut self, result: impl IntoExpr<T>) -> Expr<T> {
        self.case.else_result = Some(Box::new(result.into_expr().into_ast()));
        Expr::new(ast::Expr::Case(self.case))
    }

    /// Closes the chain with `END`; without an `ELSE` the result is
    /// nullable.
    pub fn end(self) -> Expr<T::Nulled> {
        Expr::new(ast::Expr::Case(self.case))
    }
}

#[cfg(test)]
mod tests {
    use pgqb_core::Serializable;
    use pretty_assertions::assert_eq;

    use crate::expr::{constant, field};
    use crate::exprs;

    use super::*;

    #[test]
    fn count_and_filter() {
        let expr = count(field::<Int4>("users", "id"))
            .filter_where(field::<Bool>("users", "active").eq(constant(true)))
            .into_expr();
        assert_eq!(
            expr.serialize(),
            "count(users.id) FILTER (WHERE (users.active = true))"
        );
    }

    #[test]
    fn generic_aggregate_keeps_the_given_name() {
        let expr = aggregate::<Int8>("COUNT", exprs![field::<Int4>("users", "id")])
            .into_expr();
        assert_eq!(expr.serialize(), "COUNT(users.id)");
    }

    #[test]
    fn argumentless_generic_aggregate_rejects_distinct() {
        let result = aggregate::<Int8>("count", Vec::new()).distinct();
        assert!(matches!(
            result,
            Err(Error::InvalidAggregateConfiguration(_))
        ));
    }

    #[test]
    fn percentile_cont_within_group() {
        let expr = percentile_cont(constant(0.5))
            .within_group_order_by(vec![field::<Float8>("t", "x").asc()])
            .into_expr();
        assert_eq!(
            expr.serialize(),
            "percentile_cont(0.5) WITHIN GROUP (ORDER BY t.x ASC)"
        );
    }

    #[test]
    fn json_aggregates() {
        let expr = json_object_agg(field::<Text>("t", "k"), field::<Int4>("t", "v"))
            .absent_on_null()
            .with_unique_keys()
            .into_expr();
        assert_eq!(
            expr.serialize(),
            "json_object_agg(t.k : t.v ABSENT ON NULL WITH UNIQUE KEYS)"
        );

        let expr = json_array_agg(field::<Int4>("t", "v"))
            .order_by(vec![field::<Int4>("t", "v").desc()])
            .null_on_null()
            .into_expr();
        assert_eq!(
            expr.serialize(),
            "json_array_agg(t.v ORDER BY t.v DESC NULL ON NULL)"
        );
    }

    #[test]
    fn window_function_filter_narrows() {
        let expr = count_star()
            .over("w");
        assert_eq!(expr.serialize(), "count(*) OVER w");

        let expr = row_number().over("w");
        assert_eq!(expr.serialize(), "row_number() OVER w");

        let expr = window_function::<Int8>("rank", Vec::new())
            .filter_where(field::<Bool>("t", "active"))
            .over("w");
        assert_eq!(expr.serialize(), "rank() FILTER (WHERE t.active) OVER w");
    }

    #[test]
    fn uuid_literals_are_validated() {
        assert!(uuid("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").is_ok());
        assert_eq!(
            uuid("not-a-uuid").unwrap_err(),
            Error::InvalidUuid("not-a-uuid".into())
        );
        assert_eq!(
            uuid("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a1").unwrap_err(),
            Error::InvalidUuid("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a1".into())
        );
    }

    #[test]
    fn case_chain() {
        let expr = case_when(
            field::<Int4>("t", "x").lt(constant(0)),
            constant(-1),
        )
        .when(field::<Int4>("t", "x").eq(constant(0)), constant(0))
        .otherwise(constant(1));
        assert_eq!(
            expr.serialize(),
            "CASE WHEN (t.x < 0) THEN -1 WHEN (t.x = 0) THEN 0 ELSE 1 END"
        );
    }

    #[test]
    fn coalesce_strips_nullability() {
        let expr = coalesce(field::<Nullable<Int4>>("t", "x"), constant(0));
        assert_eq!(expr.serialize(), "coalesce(t.x, 0)");
    }
}
