//! # pgqb-builder
//!
//! The phantom-typed construction surface of the pgqb query builder:
//! marker types with nullability discipline, typed expressions, table
//! declarations, the join algebra, the staged `SELECT` builder and the
//! parameter binder.
//!
//! Everything here bottoms out in the `pgqb-ast` nodes; the types only
//! constrain which nodes can be put together. A query is rendered with
//! [`Serializable::serialize`] and executed by pairing the text with the
//! vector produced by the parameter packer.

#![deny(unused_imports)]

mod aggregate;
mod expr;
mod from;
mod funcs;
mod params;
mod query;
mod table;
mod types;
mod window;

pub use pgqb_ast::DataType;
pub use pgqb_core::{Error, Operator, Serializable, Value};

pub use self::{
    aggregate::{
        Aggregate, JsonArrayAggregate, JsonObjectAggregate, OrderedSet, OrderedSetAggregate,
        StarAggregate,
    },
    expr::{
        all_of, any_of, constant, field, not, null, AnyExpr, Expr, IntoConstant, IntoExpr,
        OrderSpec, QuantifiedOperand,
    },
    from::{
        from_function, AliasedTable, BaseTable, FromClause, IntoFrom, JoinExt,
        OrdinalTableFunction, TableFunction,
    },
    funcs::{
        abs, aggregate, aggregate_star, array, array_agg, avg, bool_and, bool_or, case_when,
        char_length, coalesce, count, count_star, dense_rank, first_value, func, json_array_agg,
        json_object_agg, lag, last_value, lead, lower, max, min, mode, now, ntile,
        ordered_set_aggregate, percentile_cont, percentile_disc, rank, row, row_number,
        string_agg, sum, upper, uuid, window_function, CaseWhen,
    },
    params::{ParameterMap, Params},
    query::{
        composite, exists, from_subquery, CanDistinct, CanFilter, CanGroupBy, CanHaving, CanLock,
        CanOrderBy, CanPaginate, CanSetOp, CanWindow, DistinctStage, GroupByStage, GroupElement,
        GroupSet, HavingStage, IntoSubquery, Labeled, LimitStage, Lock, LockAllowed,
        LockForbidden, LockPolicy, LockStage, OffsetStage, OrderByStage, PaginatedStage, Query,
        SelectExt, SelectStage, Selection, SetOpStage, WhereStage, WindowStage,
    },
    table::{Intact, Nullability, Nulled, Row, Table},
    types::{
        Array, BaseType, Bool, BoolLike, Bytea, CompatibleWith, Date, Float4, Float8, Int2, Int4,
        Int8, Interval, Json, Jsonb, MultiRange, Nullable, Numeric, Range, RangeElement, Record,
        SqlNumber, SqlOrd, SqlText, SqlType, Text, Time, Timestamp, TimestampTz, Uuid, VarChar,
    },
    window::{FilteredWindowFunction, WindowFunction, WindowSpec},
};

pub use pgqb_ast::{Frame, FrameEnd, FrameExclusion, FrameKind, FrameStart};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::exprs;

    use super::*;

    crate::table! {
        /// Blog posts.
        pub struct Posts as "posts" {
            id: Int4,
            name: Text,
            deleted: Bool,
            score: Float8,
        }

        /// The user/post join table.
        pub struct UserPost as "user_post" {
            user_id: Int4,
            post_id: Int4,
        }

        /// Users.
        pub struct Users as "users" {
            id: Int4,
            name: Text,
            org_id: Int4,
        }
    }

    crate::parameters! {
        /// Parameters of the feed queries.
        pub struct FeedParams: FeedValues {
            user_id: Int4,
        }
    }

    #[test]
    fn join_select_where_end_to_end() {
        let params = FeedParams::declare();
        let query = Posts::table()
            .alias("s")
            .inner_join(UserPost::table().alias("up"), |(s, up)| {
                s.id().eq(up.post_id())
            })
            .select(|(s, _)| (s.id().label("id"), s.name().label("name")))
            .filter(|(s, up)| not(s.deleted()).and(up.user_id().eq(params.user_id.clone())));

        assert_eq!(
            query.serialize(),
            "SELECT s.id AS id, s.name AS name \
             FROM (posts AS s INNER JOIN user_post AS up ON (s.id = up.post_id)) \
             WHERE ((not s.deleted) AND (up.user_id = $1))"
        );
        assert_eq!(FeedParams::pack(FeedValues { user_id: 9 }), vec![Value::Int4(9)]);
    }

    #[test]
    fn serialisation_is_pure_and_deterministic() {
        let query = Posts::table().select(|p| p.id().label("id"));
        assert_eq!(query.serialize(), query.serialize());
        assert_eq!(query.serialize(), "SELECT posts.id AS id FROM posts");
    }

    #[test]
    fn left_join_presents_nullable_columns() {
        let query = Posts::table()
            .alias("p")
            .left_join(UserPost::table().alias("up"), |(p, up)| {
                // up.post_id() is Expr<Nullable<Int4>> here; comparing it
                // against the plain Int4 column must unify.
                let nullable: Expr<Nullable<Int4>> = up.post_id();
                p.id().eq(nullable)
            })
            .select(|(p, up)| {
                let recovered: Expr<Int4> = up.user_id().not_null();
                (p.id().label("id"), recovered.label("user_id"))
            });
        assert_eq!(
            query.serialize(),
            "SELECT p.id AS id, up.user_id AS user_id \
             FROM (posts AS p LEFT JOIN user_post AS up ON (p.id = up.post_id))"
        );
    }

    #[test]
    fn full_join_nullifies_both_sides() {
        let query = Posts::table()
            .alias("p")
            .full_join(UserPost::table().alias("up"), |(p, up)| {
                let left: Expr<Nullable<Int4>> = p.id();
                let right: Expr<Nullable<Int4>> = up.post_id();
                left.eq(right)
            })
            .select(|(p, _)| p.id().label("id"));
        assert_eq!(
            query.serialize(),
            "SELECT p.id AS id \
             FROM (posts AS p FULL JOIN user_post AS up ON (p.id = up.post_id))"
        );
    }

    #[test]
    fn distinct_on_where_group_having_order_pagination() {
        let query = Users::table()
            .select(|u| (u.org_id().label("org_id"),))
            .distinct_on(|u| exprs![u.org_id()])
            .filter(|u| u.id().gt(constant(0)))
            .group_by(|u| exprs![u.org_id()])
            .having(|u| count(u.id()).into_expr().gt(constant(1i64)))
            .order_by(|u| vec![u.org_id().asc().nulls_last()])
            .limit(10)
            .offset(20);
        assert_eq!(
            query.serialize(),
            "SELECT DISTINCT ON (users.org_id) users.org_id AS org_id FROM users \
             WHERE (users.id > 0) GROUP BY users.org_id HAVING (count(users.id) > 1) \
             ORDER BY users.org_id ASC NULLS LAST LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn offset_then_fetch() {
        let query = Users::table()
            .select(|u| (u.id().label("id"),))
            .order_by(|u| vec![u.id().asc()])
            .offset(10)
            .fetch_next_with_ties(5);
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users ORDER BY users.id ASC \
             OFFSET 10 FETCH NEXT 5 ROWS WITH TIES"
        );
    }

    #[test]
    fn rollup_cube_and_grouping_sets() {
        let query = Users::table()
            .select(|u| (u.org_id().label("org_id"),))
            .rollup(|u| vec![u.org_id().into(), composite(exprs![u.id(), u.name()])]);
        assert_eq!(
            query.serialize(),
            "SELECT users.org_id AS org_id FROM users \
             GROUP BY ROLLUP(users.org_id, (users.id, users.name))"
        );

        let query = Users::table()
            .select(|u| (u.org_id().label("org_id"),))
            .grouping_sets(|u| vec![GroupSet::keys(exprs![u.org_id()]), GroupSet::keys(vec![])]);
        assert_eq!(
            query.serialize(),
            "SELECT users.org_id AS org_id FROM users \
             GROUP BY GROUPING SETS(users.org_id, ())"
        );
    }

    #[test]
    fn windows_and_window_calls() {
        let query = Users::table()
            .select(|u| {
                (
                    u.id().label("id"),
                    row_number().over("w").label("rn"),
                )
            })
            .window("w", |u| {
                WindowSpec::new()
                    .partition_by(exprs![u.org_id()])
                    .order_by(vec![u.id().desc()])
                    .frame(Frame::rows_between(
                        FrameStart::UnboundedPreceding,
                        FrameEnd::CurrentRow,
                    ))
            })
            .expect("window name is free");
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id, row_number() OVER w AS rn FROM users \
             WINDOW w AS (PARTITION BY users.org_id ORDER BY users.id DESC \
             ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
        );
    }

    #[test]
    fn duplicate_window_names_error() {
        let result = Users::table()
            .select(|u| (u.id().label("id"),))
            .window("w", |_| WindowSpec::new())
            .expect("first name is free")
            .window("w", |_| WindowSpec::new());
        assert!(matches!(result, Err(Error::DuplicateWindowName(_))));
    }

    #[test]
    fn set_ops_share_the_selection_tuple() {
        let one = Users::table().select(|u| (u.id().label("id"),));
        let two = Users::table().select(|u| (u.id().label("id"),));
        let three = Users::table().select(|u| (u.id().label("id"),));
        let query = one.union_all(two).intersect(three);
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users \
             UNION ALL SELECT users.id AS id FROM users \
             INTERSECT SELECT users.id AS id FROM users"
        );
    }

    #[test]
    fn locks_serialize_in_order() {
        let query = Users::table()
            .select(|u| (u.id().label("id"),))
            .for_lock(Lock::update().of("users").nowait())
            .for_lock(Lock::key_share().skip_locked());
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users \
             FOR UPDATE OF users NOWAIT FOR KEY SHARE SKIP LOCKED"
        );
    }

    #[test]
    fn scalar_subquery_and_exists() {
        let count_posts = UserPost::table()
            .alias("up")
            .select(|up| (count(up.post_id()).label("n"),))
            .scalar();
        let query = Users::table().select(|_| (count_posts.label("post_count"),));
        assert_eq!(
            query.serialize(),
            "SELECT (SELECT count(up.post_id) AS n FROM user_post AS up) AS post_count \
             FROM users"
        );

        let inner = UserPost::table().select(|up| (up.user_id().label("user_id"),));
        let query = Users::table()
            .select(|u| (u.id().label("id"),))
            .filter(|u| exists(inner).and(u.id().gt(constant(0))));
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users \
             WHERE (EXISTS (SELECT user_post.user_id AS user_id FROM user_post) \
             AND (users.id > 0))"
        );
    }

    #[test]
    fn in_subquery_and_any() {
        let inner = UserPost::table().select(|up| (up.user_id().label("user_id"),));
        let expr = field::<Int4>("users", "id").in_subquery(inner);
        assert_eq!(
            expr.serialize(),
            "(users.id IN (SELECT user_post.user_id AS user_id FROM user_post))"
        );

        let inner = UserPost::table().select(|up| (up.user_id().label("user_id"),));
        let expr = field::<Int4>("users", "id").any(Operator::Equal, inner);
        assert_eq!(
            expr.serialize(),
            "(users.id = ANY(SELECT user_post.user_id AS user_id FROM user_post))"
        );
    }

    #[test]
    fn subquery_as_from() {
        crate::table! {
            /// Projected shape of the inner query.
            pub struct Scored as "scored" {
                id: Int4,
                score: Float8,
            }
        }

        let inner = Posts::table()
            .select(|p| (p.id().label("id"), p.score().label("score")));
        let query = from_subquery::<Scored>(inner, "sc")
            .select(|sc| (sc.id().label("id"),))
            .filter(|sc| sc.score().gt(constant(0.5)));
        assert_eq!(
            query.serialize(),
            "SELECT sc.id AS id FROM \
             (SELECT posts.id AS id, posts.score AS score FROM posts) AS sc \
             WHERE (sc.score > 0.5)"
        );
    }

    #[test]
    fn table_function_with_ordinality_as_from() {
        crate::table! {
            /// generate_series output with its ordinality column.
            pub struct GenerateSeries as "generate_series" {
                value: Int8,
                ordinality: Int8,
            }
        }

        let query = from_function::<GenerateSeries>(exprs![constant(1), constant(3)])
            .with_ordinality()
            .alias("g")
            .select(|g| (g.value().label("value"), g.ordinality().label("ord")));
        assert_eq!(
            query.serialize(),
            "SELECT g.value AS value, g.ordinality AS ord \
             FROM generate_series(1, 3) WITH ORDINALITY AS g"
        );
    }

    #[test]
    fn cross_join_lateral_renders_without_on() {
        let query = Posts::table()
            .alias("p")
            .cross_join_lateral(UserPost::table().alias("up"))
            .select(|(p, _)| (p.id().label("id"),));
        assert_eq!(
            query.serialize(),
            "SELECT p.id AS id FROM (posts AS p CROSS JOIN LATERAL user_post AS up)"
        );
    }
}
